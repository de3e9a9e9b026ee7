//! Function scopes: parent-linked overload tables.
//!
//! Each scope maps a name to the ordered list of overloads declared in it.
//! Scopes live in an arena and link to a parent by [`ScopeId`]; a class's
//! method scope links to its superclass's method scope.

use rustc_hash::FxHashMap;

use crate::{FuncId, ScopeId};

#[derive(Debug, Default)]
struct FunctionScope {
    parent: Option<ScopeId>,
    entries: FxHashMap<String, Vec<FuncId>>,
    /// Every function in declaration order.
    order: Vec<FuncId>,
}

/// Arena of function scopes.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<FunctionScope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(FunctionScope {
            parent,
            ..FunctionScope::default()
        });
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }

    pub fn set_parent(&mut self, scope: ScopeId, parent: Option<ScopeId>) {
        self.scopes[scope.index()].parent = parent;
    }

    /// Append an overload of `name`.
    pub fn insert(&mut self, scope: ScopeId, name: &str, func: FuncId) {
        let scope = &mut self.scopes[scope.index()];
        scope.entries.entry(name.to_string()).or_default().push(func);
        scope.order.push(func);
    }

    /// Overloads declared directly in `scope`.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> &[FuncId] {
        self.scopes[scope.index()]
            .entries
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Overloads of `name` grouped per scope, nearest scope first.
    pub fn lookup_chain(&self, scope: ScopeId, name: &str) -> Vec<&[FuncId]> {
        let mut found = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let local = self.lookup_local(id, name);
            if !local.is_empty() {
                found.push(local);
            }
            current = self.parent(id);
        }
        found
    }

    /// Every function declared directly in `scope`, in declaration order.
    pub fn functions(&self, scope: ScopeId) -> impl Iterator<Item = FuncId> + '_ {
        self.scopes[scope.index()].order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overloads_keep_insertion_order() {
        let mut arena = ScopeArena::new();
        let scope = arena.create(None);
        arena.insert(scope, "f", FuncId::new(1));
        arena.insert(scope, "f", FuncId::new(2));
        assert_eq!(arena.lookup_local(scope, "f"), &[FuncId::new(1), FuncId::new(2)]);
        assert!(arena.lookup_local(scope, "g").is_empty());
    }

    #[test]
    fn chain_walks_to_parents() {
        let mut arena = ScopeArena::new();
        let base = arena.create(None);
        let derived = arena.create(Some(base));
        arena.insert(base, "speak", FuncId::new(0));
        arena.insert(derived, "speak", FuncId::new(1));
        let chain = arena.lookup_chain(derived, "speak");
        assert_eq!(chain, vec![&[FuncId::new(1)][..], &[FuncId::new(0)][..]]);
    }

    #[test]
    fn functions_iterate_in_declaration_order() {
        let mut arena = ScopeArena::new();
        let scope = arena.create(None);
        arena.insert(scope, "b", FuncId::new(0));
        arena.insert(scope, "a", FuncId::new(1));
        arena.insert(scope, "b", FuncId::new(2));
        let all: Vec<_> = arena.functions(scope).collect();
        assert_eq!(all, vec![FuncId::new(0), FuncId::new(1), FuncId::new(2)]);
    }
}
