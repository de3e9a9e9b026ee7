//! Loading imported source files.

use std::io;
use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

/// Where `import` reads files from.
///
/// Two paths naming the same file must canonicalize to the same
/// [`PathBuf`]; import deduplication relies on it.
pub trait SourceLoader {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves files from memory. Paths are normalized lexically.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: FxHashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), source.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = normalize(path);
        if self.files.contains_key(&path) {
            Ok(path)
        } else {
            Err(not_found(&path))
        }
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        let path = normalize(path);
        self.files.get(&path).cloned().ok_or_else(|| not_found(&path))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such file '{}'", path.display()))
}

/// Resolve `.` and `..` without touching the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_lexically() {
        assert_eq!(normalize(Path::new("./lib/../shapes.ql")), Path::new("shapes.ql"));
        assert_eq!(normalize(Path::new("a/./b/c")), Path::new("a/b/c"));
        assert_eq!(normalize(Path::new("../x")), Path::new("../x"));
    }

    #[test]
    fn memory_loader_canonicalizes_equivalent_paths() {
        let loader = MemoryLoader::new().with_file("lib/shapes.ql", "class Square { }");
        let a = loader.canonicalize(Path::new("./lib/shapes.ql")).unwrap();
        let b = loader.canonicalize(Path::new("lib/x/../shapes.ql")).unwrap();
        assert_eq!(a, b);
        assert_eq!(loader.load(&a).unwrap(), "class Square { }");
    }

    #[test]
    fn missing_files_are_not_found() {
        let loader = MemoryLoader::new();
        let err = loader.load(Path::new("nope.ql")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(loader.canonicalize(Path::new("nope.ql")).is_err());
    }

    #[test]
    fn fs_loader_reads_files() {
        let path = std::env::temp_dir().join(format!("quill_loader_{}.ql", std::process::id()));
        std::fs::write(&path, "def one() -> Int { return 1 }").unwrap();
        let canonical = FsLoader.canonicalize(&path).unwrap();
        assert!(FsLoader.load(&canonical).unwrap().contains("one"));
        std::fs::remove_file(&path).unwrap();
    }
}
