//! Virtual method slot assignment.
//!
//! Slots are assigned from the root class downward. A class inherits the
//! slot list of its superclass unchanged and appends its own overridable
//! methods in declaration order, so a slot index computed against a static
//! receiver type is valid for every subclass object.

use quill_registry::{FuncId, FunctionBody, FunctionFlags, Registry, TypeId};

/// Slot list of one class. Each slot holds the root declaration of a
/// virtual method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VtableLayout {
    slots: Vec<FuncId>,
}

impl VtableLayout {
    pub fn compute(registry: &Registry<'_>, class: TypeId) -> Self {
        let mut slots: Vec<FuncId> = Vec::new();
        let mut chain = registry.chain(class);
        chain.reverse();

        for ancestor in chain {
            let methods = registry.get(ancestor).methods;
            for func in registry.scopes().functions(methods) {
                let function = registry.function(func);
                if !matches!(function.body, FunctionBody::Script(_))
                    || function
                        .flags
                        .intersects(FunctionFlags::STATIC | FunctionFlags::CONSTRUCTOR)
                {
                    continue;
                }
                let overrides_slot = slots
                    .iter()
                    .any(|&root| registry.function(root).overriders.get(&ancestor) == Some(&func));
                if !overrides_slot && function.is_virtual() {
                    slots.push(func);
                }
            }
        }
        Self { slots }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// The function each slot runs for objects of `class`.
    pub fn implementations(&self, registry: &Registry<'_>, class: TypeId) -> Vec<FuncId> {
        self.slots
            .iter()
            .map(|&root| registry.resolve_override(root, class))
            .collect()
    }

    /// Slot of `func`, a method visible on `class` or one of its overrides.
    pub fn slot_of(&self, registry: &Registry<'_>, class: TypeId, func: FuncId) -> Option<usize> {
        self.slots
            .iter()
            .position(|&root| root == func || registry.resolve_override(root, class) == func)
    }
}
