//! Per-function analysis results.
//!
//! A [`TypedBody`] is the side table the analyzer fills for one function
//! and the generator reads back. Entries are keyed by [`NodeId`], so one
//! generic method declaration can be typed once per instantiation.

use quill_core::CodegenError;
use quill_parser::ast::NodeId;
use quill_registry::{FuncId, TypeId};
use rustc_hash::FxHashMap;

use crate::scope::{LocalId, LocalVar};

/// The object a `new` expression creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Construction {
    pub class: TypeId,
    /// Selected `init` overload; `None` leaves the object zero-initialized.
    pub init: Option<FuncId>,
}

/// A resolved instance variable access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    /// Index among all fields of the object, superclass fields first.
    pub slot: usize,
    pub ty: TypeId,
}

/// Definite-return facts of one `if` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BranchFacts {
    pub then_returns: bool,
    pub else_returns: bool,
}

impl BranchFacts {
    /// Whether control can reach the statement after the `if`.
    pub fn needs_merge(&self) -> bool {
        !(self.then_returns && self.else_returns)
    }
}

#[derive(Debug, Default)]
pub struct TypedBody {
    types: FxHashMap<NodeId, TypeId>,
    calls: FxHashMap<NodeId, FuncId>,
    constructions: FxHashMap<NodeId, Construction>,
    bindings: FxHashMap<NodeId, LocalId>,
    fields: FxHashMap<NodeId, FieldRef>,
    sizes: FxHashMap<NodeId, u32>,
    branches: FxHashMap<NodeId, BranchFacts>,

    pub(crate) locals: Vec<LocalVar>,
    /// Locals of the declared parameters, in order.
    pub(crate) params: Vec<LocalId>,
    pub(crate) receiver: Option<LocalId>,
    pub(crate) definitely_returns: bool,
    /// Expression whose value the entry function returns.
    pub(crate) result: Option<NodeId>,
}

impl TypedBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type of `node`. A node is typed exactly once.
    pub fn record_type(&mut self, node: NodeId, ty: TypeId) -> Result<(), CodegenError> {
        match self.types.insert(node, ty) {
            Some(previous) if previous != ty => Err(CodegenError::internal(format!(
                "node {node:?} typed as {previous:?} and then {ty:?}"
            ))),
            _ => Ok(()),
        }
    }

    pub fn type_of(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).copied()
    }

    pub(crate) fn record_call(&mut self, node: NodeId, func: FuncId) {
        self.calls.insert(node, func);
    }

    /// Function a call, operator or conversion node resolved to.
    pub fn call(&self, node: NodeId) -> Option<FuncId> {
        self.calls.get(&node).copied()
    }

    pub(crate) fn record_construction(&mut self, node: NodeId, construction: Construction) {
        self.constructions.insert(node, construction);
    }

    pub fn construction(&self, node: NodeId) -> Option<Construction> {
        self.constructions.get(&node).copied()
    }

    pub(crate) fn bind(&mut self, node: NodeId, local: LocalId) {
        self.bindings.insert(node, local);
    }

    pub fn binding(&self, node: NodeId) -> Option<LocalId> {
        self.bindings.get(&node).copied()
    }

    pub(crate) fn record_field(&mut self, node: NodeId, field: FieldRef) {
        self.fields.insert(node, field);
    }

    pub fn field(&self, node: NodeId) -> Option<FieldRef> {
        self.fields.get(&node).copied()
    }

    pub(crate) fn record_size(&mut self, node: NodeId, size: u32) {
        self.sizes.insert(node, size);
    }

    pub fn size(&self, node: NodeId) -> Option<u32> {
        self.sizes.get(&node).copied()
    }

    pub(crate) fn record_branches(&mut self, node: NodeId, facts: BranchFacts) {
        self.branches.insert(node, facts);
    }

    pub fn branches(&self, node: NodeId) -> BranchFacts {
        self.branches.get(&node).copied().unwrap_or_default()
    }

    pub fn locals(&self) -> &[LocalVar] {
        &self.locals
    }

    pub fn params(&self) -> &[LocalId] {
        &self.params
    }

    pub fn receiver(&self) -> Option<LocalId> {
        self.receiver
    }

    pub fn definitely_returns(&self) -> bool {
        self.definitely_returns
    }

    pub fn result(&self) -> Option<NodeId> {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_are_set_once() {
        let mut body = TypedBody::new();
        let node = NodeId(4);
        body.record_type(node, TypeId::new(3)).unwrap();
        body.record_type(node, TypeId::new(3)).unwrap();
        assert!(body.record_type(node, TypeId::new(6)).is_err());
        assert_eq!(body.type_of(node), Some(TypeId::new(3)));
    }

    #[test]
    fn missing_branch_facts_need_a_merge() {
        let body = TypedBody::new();
        assert!(body.branches(NodeId(1)).needs_merge());
        let both = BranchFacts {
            then_returns: true,
            else_returns: true,
        };
        assert!(!both.needs_merge());
    }
}
