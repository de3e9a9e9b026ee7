//! CompilationContext - the state shared by analysis and code generation.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use quill_registry::{FuncId, Registry, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::sema::TypedBody;

/// Readiness of a function for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FunctionState {
    Declared,
    PrototypeResolved,
    BodyInProgress,
    BodyResolved,
}

/// Registry plus the analysis side tables of one compilation unit.
///
/// Created once per unit and passed explicitly to the analyzer and then to
/// the generator.
#[derive(Debug)]
pub struct CompilationContext<'ast> {
    registry: Registry<'ast>,
    body_states: FxHashMap<FuncId, FunctionState>,
    bodies: FxHashMap<FuncId, TypedBody>,

    /// Functions whose bodies are wanted but not yet analyzed.
    demanded: VecDeque<FuncId>,
    queued: FxHashSet<FuncId>,
    /// Classes with at least one `new` expression.
    constructed: FxHashSet<TypeId>,

    imports: FxHashSet<PathBuf>,
    entry: Option<FuncId>,
}

impl Default for CompilationContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'ast> CompilationContext<'ast> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            body_states: FxHashMap::default(),
            bodies: FxHashMap::default(),
            demanded: VecDeque::new(),
            queued: FxHashSet::default(),
            constructed: FxHashSet::default(),
            imports: FxHashSet::default(),
            entry: None,
        }
    }

    #[inline]
    pub fn registry(&self) -> &Registry<'ast> {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry<'ast> {
        &mut self.registry
    }

    pub fn state(&self, func: FuncId) -> FunctionState {
        if let Some(&state) = self.body_states.get(&func) {
            return state;
        }
        if self.registry.function(func).signature.is_some() {
            FunctionState::PrototypeResolved
        } else {
            FunctionState::Declared
        }
    }

    pub(crate) fn set_body_state(&mut self, func: FuncId, state: FunctionState) {
        self.body_states.insert(func, state);
    }

    /// Whether the body of `func` has been demanded at any point.
    pub fn is_demanded(&self, func: FuncId) -> bool {
        self.queued.contains(&func) || self.state(func) >= FunctionState::BodyInProgress
    }

    /// Queue the body of `func` for analysis. Returns `false` if it already
    /// was.
    pub(crate) fn enqueue(&mut self, func: FuncId) -> bool {
        if self.is_demanded(func) {
            return false;
        }
        self.queued.insert(func);
        self.demanded.push_back(func);
        true
    }

    pub(crate) fn next_demanded(&mut self) -> Option<FuncId> {
        let func = self.demanded.pop_front()?;
        self.queued.remove(&func);
        Some(func)
    }

    pub(crate) fn has_demanded(&self) -> bool {
        !self.demanded.is_empty()
    }

    pub fn typed_body(&self, func: FuncId) -> Option<&TypedBody> {
        self.bodies.get(&func)
    }

    pub(crate) fn insert_body(&mut self, func: FuncId, body: TypedBody) {
        self.bodies.insert(func, body);
    }

    pub(crate) fn mark_constructed(&mut self, class: TypeId) -> bool {
        self.constructed.insert(class)
    }

    pub fn constructed(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.constructed.iter().copied()
    }

    /// Record an import of the canonical `path`.
    ///
    /// Returns `false` if the path was already imported, in which case the
    /// import is a no-op.
    pub fn mark_imported(&mut self, path: &Path) -> bool {
        self.imports.insert(path.to_path_buf())
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    pub fn entry(&self) -> Option<FuncId> {
        self.entry
    }

    pub(crate) fn set_entry(&mut self, func: FuncId) {
        self.entry = Some(func);
    }
}
