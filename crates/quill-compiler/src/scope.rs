//! Local variable scopes for function analysis.
//!
//! [`VarScope`] is a stack of frames, one per block. Each binding gets a
//! function-wide [`LocalId`] so the generator can map it to one backend
//! variable; shadowing a name in an inner frame allocates a new local.

use quill_core::{SemanticError, Span};
use quill_registry::TypeId;
use rustc_hash::FxHashMap;

/// Index of a local variable within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u32);

impl LocalId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A declared local.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: String,
    pub ty: TypeId,
    pub span: Span,
}

/// Parent-linked variable frames of one function body.
#[derive(Debug)]
pub struct VarScope {
    frames: Vec<FxHashMap<String, LocalId>>,
    locals: Vec<LocalVar>,
}

impl Default for VarScope {
    fn default() -> Self {
        Self::new()
    }
}

impl VarScope {
    /// A scope with the function-level frame already pushed.
    pub fn new() -> Self {
        Self {
            frames: vec![FxHashMap::default()],
            locals: Vec::new(),
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind `name` in the innermost frame.
    ///
    /// A second binding of the same name in the same frame is a
    /// [`SemanticError::RedefinitionError`].
    pub fn declare(&mut self, name: &str, ty: TypeId, span: Span) -> Result<LocalId, SemanticError> {
        let id = LocalId(self.locals.len() as u32);
        let innermost = self.frames.len() - 1;
        let frame = &mut self.frames[innermost];
        if frame.contains_key(name) {
            return Err(SemanticError::RedefinitionError {
                name: name.to_string(),
                span,
            });
        }
        frame.insert(name.to_string(), id);
        self.locals.push(LocalVar {
            name: name.to_string(),
            ty,
            span,
        });
        Ok(id)
    }

    /// Allocate a local no name refers to, such as the method receiver.
    pub fn declare_hidden(&mut self, name: &str, ty: TypeId, span: Span) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(LocalVar {
            name: name.to_string(),
            ty,
            span,
        });
        id
    }

    /// Nearest binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<(LocalId, TypeId)> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
            .map(|id| (id, self.locals[id.index()].ty))
    }

    pub fn local(&self, id: LocalId) -> &LocalVar {
        &self.locals[id.index()]
    }

    /// Every local declared so far, indexed by [`LocalId`].
    pub fn into_locals(self) -> Vec<LocalVar> {
        self.locals
    }
}
