//! Unit configuration.

use std::path::{Path, PathBuf};

use quill_compiler::{JitOptions, OptLevel};

/// Default extension of Quill source files.
pub const DEFAULT_EXTENSION: &str = "ql";

/// Settings for building a [`Unit`](crate::Unit).
///
/// ```
/// use quill::{OptLevel, UnitConfig};
///
/// let config = UnitConfig::new()
///     .search_root("scripts")
///     .opt_level(OptLevel::None)
///     .verifier(false);
/// assert_eq!(config.file_extension(), "ql");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    extension: String,
    search_root: PathBuf,
    jit: JitOptions,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitConfig {
    pub fn new() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            search_root: PathBuf::from("."),
            jit: JitOptions::default(),
        }
    }

    /// Extension appended to import paths written without one.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Directory `import` paths are resolved against.
    #[must_use]
    pub fn search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_root = root.into();
        self
    }

    #[must_use]
    pub fn opt_level(mut self, opt_level: OptLevel) -> Self {
        self.jit.opt_level = opt_level;
        self
    }

    /// Run the Cranelift verifier on every generated function.
    #[must_use]
    pub fn verifier(mut self, enabled: bool) -> Self {
        self.jit.verifier = enabled;
        self
    }

    pub fn file_extension(&self) -> &str {
        &self.extension
    }

    pub fn root(&self) -> &Path {
        &self.search_root
    }

    pub fn jit(&self) -> JitOptions {
        self.jit
    }

    /// The file an `import "name"` refers to.
    pub fn import_path(&self, name: &str) -> PathBuf {
        let path = self.search_root.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension(&self.extension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = UnitConfig::default();
        assert_eq!(config.file_extension(), "ql");
        assert_eq!(config.root(), Path::new("."));
        assert_eq!(config.jit(), JitOptions::default());
    }

    #[test]
    fn import_paths_get_the_extension() {
        let config = UnitConfig::new().search_root("lib");
        assert_eq!(config.import_path("shapes"), Path::new("lib/shapes.ql"));
        assert_eq!(config.import_path("util/math"), Path::new("lib/util/math.ql"));
        assert_eq!(config.import_path("raw.txt"), Path::new("lib/raw.txt"));
    }

    #[test]
    fn builder_sets_jit_options() {
        let config = UnitConfig::new().opt_level(OptLevel::SpeedAndSize).verifier(false);
        assert_eq!(config.jit().opt_level, OptLevel::SpeedAndSize);
        assert!(!config.jit().verifier);
    }
}
