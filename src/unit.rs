//! Compilation unit API.
//!
//! A [`Unit`] owns the sources of one program. Building it parses every
//! file, follows `import` statements, analyzes the result and compiles
//! everything reachable from the entry file to native code.
//!
//! # Example
//!
//! ```no_run
//! use quill::{Unit, Value};
//!
//! let mut unit = Unit::new();
//! unit.add_source("main.ql", "var x = 10\nx = x + 5\nx").unwrap();
//! unit.build().unwrap();
//! assert_eq!(unit.run().unwrap(), Value::Int(15));
//! ```

use std::path::Path;

use bumpalo::Bump;
use quill_compiler::{Analyzer, CompilationContext, CompiledModule, Generator, SourceFile, read_string};
use quill_core::{PrimitiveKind, QuillError, SemanticError};
use quill_parser::Parser;
use quill_parser::ast::{ImportDecl, Stmt};
use tracing::{debug, trace};

use crate::config::UnitConfig;
use crate::source::{FsLoader, SourceLoader, normalize};
use crate::value::{ResultKind, Value};

/// A compilation unit ready for execution.
///
/// 1. Create a unit with [`Unit::new`] or [`Unit::with_config`]
/// 2. Add source files with [`Unit::add_source`]; the last one added is the
///    entry file, the others may only hold declarations
/// 3. Build the unit with [`Unit::build`]
/// 4. Execute it with [`Unit::run`]
pub struct Unit {
    config: UnitConfig,
    loader: Box<dyn SourceLoader>,

    /// Source files in the order they were added (name, text).
    sources: Vec<(String, String)>,

    /// Host symbols linked into the module in addition to the process's own.
    symbols: Vec<(String, *const u8)>,

    compiled: Option<Built>,
}

struct Built {
    module: CompiledModule,
    result: ResultKind,
    imports: usize,
}

impl Default for Unit {
    fn default() -> Self {
        Self::new()
    }
}

impl Unit {
    pub fn new() -> Self {
        Self::with_config(UnitConfig::default())
    }

    pub fn with_config(config: UnitConfig) -> Self {
        Self {
            config,
            loader: Box::new(FsLoader),
            sources: Vec::new(),
            symbols: Vec::new(),
            compiled: None,
        }
    }

    /// Read imports through `loader` instead of the file system.
    #[must_use]
    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Add a source file to the unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit has already been built. Use `clear()`
    /// to start over.
    pub fn add_source(&mut self, filename: impl Into<String>, source: impl Into<String>) -> Result<(), UnitError> {
        if self.is_built() {
            return Err(UnitError::AlreadyBuilt);
        }
        self.sources.push((filename.into(), source.into()));
        Ok(())
    }

    /// Provide the address of an `extern def` implemented by the host.
    ///
    /// Externs without a registered symbol are looked up in the running
    /// process, so libc functions need no registration.
    pub fn register_symbol(&mut self, name: impl Into<String>, address: *const u8) -> Result<(), UnitError> {
        if self.is_built() {
            return Err(UnitError::AlreadyBuilt);
        }
        self.symbols.push((name.into(), address));
        Ok(())
    }

    /// Parse, analyze and compile every source.
    ///
    /// # Errors
    ///
    /// Returns the first lex, parse, semantic or codegen error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<(), BuildError> {
        if self.is_built() {
            return Err(BuildError::AlreadyBuilt);
        }
        let Some(((entry_name, entry_source), libraries)) = self.sources.split_last() else {
            return Err(BuildError::NoSources);
        };

        let arena = Bump::new();
        let mut ctx = CompilationContext::new();
        let mut resolver = ImportResolver {
            config: &self.config,
            loader: self.loader.as_ref(),
            arena: &arena,
            files: Vec::new(),
        };

        for (name, source) in libraries {
            let file = resolver.add_root(&mut ctx, name, source)?;
            resolver.files.push(file);
        }
        let entry = resolver.add_root(&mut ctx, entry_name, entry_source)?;
        let files = resolver.files;

        let main = Analyzer::new(&mut ctx).analyze(&files, entry)?;
        let module = Generator::new(&ctx, self.config.jit(), &self.symbols)
            .and_then(|generator| generator.generate(main))
            .map_err(QuillError::from)?;
        let result = ResultKind::of(ctx.registry(), module.result_type());
        debug!(
            files = files.len() + 1,
            functions = module.emitted().len(),
            "built unit"
        );

        self.compiled = Some(Built {
            module,
            result,
            imports: ctx.import_count(),
        });
        Ok(())
    }

    /// Execute the entry file and return the value of its last expression.
    ///
    /// Output of `print` goes to stdout unless redirected with
    /// [`set_stdout_capture`](crate::set_stdout_capture).
    pub fn run(&self) -> Result<Value, UnitError> {
        let built = self.compiled.as_ref().ok_or(UnitError::NotBuilt)?;
        // SAFETY: `main` takes no arguments and returns the type recorded at
        // build time; the module stays alive for the duration of the call.
        Ok(unsafe { call_entry(built.module.entry(), built.result) })
    }

    pub fn is_built(&self) -> bool {
        self.compiled.is_some()
    }

    /// Reset to an empty unit, keeping the configuration and loader.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.symbols.clear();
        self.compiled = None;
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of distinct files read, counting the added sources.
    pub fn import_count(&self) -> usize {
        self.compiled.as_ref().map_or(0, |built| built.imports)
    }

    /// Number of functions compiled to native code (available after build).
    pub fn function_count(&self) -> usize {
        self.compiled.as_ref().map_or(0, |built| built.module.emitted().len())
    }

    /// Whether the function with the given canonical name, for example
    /// `Dog.speak()`, was compiled.
    pub fn is_emitted(&self, canonical_name: &str) -> bool {
        self.compiled
            .as_ref()
            .is_some_and(|built| built.module.is_emitted(canonical_name))
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("config", &self.config)
            .field("sources", &self.sources.len())
            .field("symbols", &self.symbols.len())
            .field("built", &self.is_built())
            .finish()
    }
}

/// Parses files into the build arena and follows their imports depth first.
struct ImportResolver<'u, 'ast> {
    config: &'u UnitConfig,
    loader: &'u dyn SourceLoader,
    arena: &'ast Bump,
    /// Imported files, each after the files it imports.
    files: Vec<SourceFile<'ast>>,
}

impl<'u, 'ast> ImportResolver<'u, 'ast> {
    /// Parse a source added to the unit and resolve its imports.
    fn add_root(
        &mut self,
        ctx: &mut CompilationContext<'ast>,
        name: &str,
        source: &str,
    ) -> Result<SourceFile<'ast>, BuildError> {
        let path = self.config.root().join(name);
        let key = self.loader.canonicalize(&path).unwrap_or_else(|_| normalize(&path));
        ctx.mark_imported(&key);
        let file = self.parse(name, source)?;
        self.resolve_imports(ctx, file)?;
        Ok(file)
    }

    fn resolve_imports(&mut self, ctx: &mut CompilationContext<'ast>, file: SourceFile<'ast>) -> Result<(), BuildError> {
        for stmt in file.stmts {
            if let Stmt::Import(import) = stmt {
                self.import(ctx, import)?;
            }
        }
        Ok(())
    }

    fn import(&mut self, ctx: &mut CompilationContext<'ast>, import: &ImportDecl<'_>) -> Result<(), BuildError> {
        let path = self.config.import_path(import.path);
        let canonical = self
            .loader
            .canonicalize(&path)
            .map_err(|err| import_failed(import, &path, err))?;
        if !ctx.mark_imported(&canonical) {
            trace!(path = %canonical.display(), "import already resolved");
            return Ok(());
        }
        let source = self
            .loader
            .load(&canonical)
            .map_err(|err| import_failed(import, &path, err))?;
        let file = self.parse(&canonical.display().to_string(), &source)?;
        debug!(import = import.path, path = %canonical.display(), "resolved import");

        self.resolve_imports(ctx, file)?;
        self.files.push(file);
        Ok(())
    }

    fn parse(&self, name: &str, source: &str) -> Result<SourceFile<'ast>, BuildError> {
        let script = Parser::parse(source, self.arena).map_err(|error| BuildError::Parse {
            file: name.to_string(),
            error,
        })?;
        Ok(SourceFile {
            path: self.arena.alloc_str(name),
            stmts: script.stmts(),
        })
    }
}

fn import_failed(import: &ImportDecl<'_>, path: &Path, err: std::io::Error) -> BuildError {
    BuildError::Compile(QuillError::from(SemanticError::ImportFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
        span: import.span,
    }))
}

/// Call `main` through the native signature matching `result`.
unsafe fn call_entry(entry: *const u8, result: ResultKind) -> Value {
    unsafe {
        match result {
            ResultKind::Void => {
                let main: extern "C" fn() = std::mem::transmute(entry);
                main();
                Value::Void
            }
            ResultKind::Primitive(PrimitiveKind::Bool) => {
                let main: extern "C" fn() -> u8 = std::mem::transmute(entry);
                Value::Bool(main() != 0)
            }
            ResultKind::Primitive(PrimitiveKind::Char) => {
                let main: extern "C" fn() -> u8 = std::mem::transmute(entry);
                Value::Char(char::from(main()))
            }
            ResultKind::Primitive(PrimitiveKind::Short) => {
                let main: extern "C" fn() -> i16 = std::mem::transmute(entry);
                Value::Short(main())
            }
            ResultKind::Primitive(PrimitiveKind::Int) => {
                let main: extern "C" fn() -> i32 = std::mem::transmute(entry);
                Value::Int(main())
            }
            ResultKind::Primitive(PrimitiveKind::Long) => {
                let main: extern "C" fn() -> i64 = std::mem::transmute(entry);
                Value::Long(main())
            }
            ResultKind::Primitive(PrimitiveKind::Float) => {
                let main: extern "C" fn() -> f32 = std::mem::transmute(entry);
                Value::Float(main())
            }
            ResultKind::Primitive(PrimitiveKind::Double) => {
                let main: extern "C" fn() -> f64 = std::mem::transmute(entry);
                Value::Double(main())
            }
            ResultKind::String => {
                let main: extern "C" fn() -> *const u8 = std::mem::transmute(entry);
                Value::String(read_string(main()))
            }
            ResultKind::Primitive(PrimitiveKind::Null) | ResultKind::Reference => {
                let main: extern "C" fn() -> *const u8 = std::mem::transmute(entry);
                Value::Reference(main() as usize)
            }
        }
    }
}

/// Errors that can occur when adding sources or running the unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("unit has already been built; use clear() to start over")]
    AlreadyBuilt,

    #[error("unit has not been built")]
    NotBuilt,
}

/// Errors that can occur during unit building.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("no sources added to unit")]
    NoSources,

    #[error("unit has already been built")]
    AlreadyBuilt,

    #[error("{file}: {error}")]
    Parse {
        file: String,
        #[source]
        error: QuillError,
    },

    #[error(transparent)]
    Compile(#[from] QuillError),
}

impl BuildError {
    /// The underlying compiler error, if any.
    pub fn quill_error(&self) -> Option<&QuillError> {
        match self {
            BuildError::Parse { error, .. } | BuildError::Compile(error) => Some(error),
            BuildError::NoSources | BuildError::AlreadyBuilt => None,
        }
    }

    pub fn as_semantic(&self) -> Option<&SemanticError> {
        self.quill_error().and_then(QuillError::as_semantic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryLoader;

    #[test]
    fn build_requires_sources() {
        let mut unit = Unit::new();
        assert_eq!(unit.build(), Err(BuildError::NoSources));
        assert_eq!(unit.run(), Err(UnitError::NotBuilt));
    }

    #[test]
    fn sources_are_frozen_after_build() {
        let mut unit = Unit::new();
        unit.add_source("main.ql", "1").unwrap();
        unit.build().unwrap();
        assert!(unit.is_built());
        assert_eq!(unit.add_source("more.ql", "2"), Err(UnitError::AlreadyBuilt));
        assert_eq!(unit.build(), Err(BuildError::AlreadyBuilt));

        unit.clear();
        assert!(!unit.is_built());
        assert_eq!(unit.source_count(), 0);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut unit = Unit::new();
        unit.add_source("broken.ql", "def (").unwrap();
        let err = unit.build().unwrap_err();
        assert!(matches!(&err, BuildError::Parse { file, .. } if file == "broken.ql"));
        assert!(err.to_string().starts_with("broken.ql: "));
    }

    #[test]
    fn missing_import_fails() {
        let mut unit = Unit::new().with_loader(MemoryLoader::new());
        unit.add_source("main.ql", "import \"nowhere\"\n1").unwrap();
        let err = unit.build().unwrap_err();
        assert!(matches!(err.as_semantic(), Some(SemanticError::ImportFailed { .. })));
    }

    #[test]
    fn imports_are_read_once() {
        let loader = MemoryLoader::new()
            .with_file("shapes.ql", "import \"util\"\nclass Square { var side: Int }")
            .with_file("util.ql", "import \"shapes\"\ndef twice(n: Int) -> Int { return n * 2 }");
        let mut unit = Unit::new().with_loader(loader);
        unit.add_source(
            "main.ql",
            "import \"shapes\"\nimport \"util\"\nimport \"./shapes\"\nvar s = new Square\ns.side = 4\ntwice(s.side)",
        )
        .unwrap();
        unit.build().unwrap();
        assert_eq!(unit.import_count(), 3);
        assert_eq!(unit.run().unwrap(), Value::Int(8));
    }
}
