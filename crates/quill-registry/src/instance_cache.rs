//! Memoization of generic instantiations.
//!
//! Keyed by template and argument list, which is equivalent to keying by the
//! rendered instance name since rendered names are canonical.

use rustc_hash::FxHashMap;

use crate::TypeId;

#[derive(Debug, Default)]
pub struct InstanceCache {
    instances: FxHashMap<(TypeId, Vec<TypeId>), TypeId>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, template: TypeId, args: &[TypeId]) -> Option<TypeId> {
        self.instances.get(&(template, args.to_vec())).copied()
    }

    pub fn insert(&mut self, template: TypeId, args: Vec<TypeId>, instance: TypeId) {
        self.instances.insert((template, args), instance);
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hits_on_same_arguments() {
        let mut cache = InstanceCache::new();
        let (list, int, long) = (TypeId::new(10), TypeId::new(3), TypeId::new(4));
        cache.insert(list, vec![int], TypeId::new(20));
        assert_eq!(cache.get(list, &[int]), Some(TypeId::new(20)));
        assert_eq!(cache.get(list, &[long]), None);
        assert_eq!(cache.len(), 1);
    }
}
