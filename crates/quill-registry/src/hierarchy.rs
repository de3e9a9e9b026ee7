//! Class inheritance graph.
//!
//! Edges point from a class to its superclass. The graph exists to reject
//! cyclic inheritance before a superclass link is recorded; the chain itself
//! is walked through [`ObjectType::superclass`](crate::ObjectType).

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::TypeId;

#[derive(Debug, Default)]
pub struct ClassGraph {
    graph: DiGraphMap<TypeId, ()>,
}

impl ClassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether linking `class` to `superclass` would close a cycle.
    pub fn would_cycle(&self, class: TypeId, superclass: TypeId) -> bool {
        if class == superclass {
            return true;
        }
        self.graph.contains_node(superclass)
            && self.graph.contains_node(class)
            && has_path_connecting(&self.graph, superclass, class, None)
    }

    /// Record `class < superclass`, replacing any previous link of `class`.
    ///
    /// Returns `false` (and changes nothing) if the link would be cyclic.
    pub fn link(&mut self, class: TypeId, superclass: TypeId) -> bool {
        if self.would_cycle(class, superclass) {
            return false;
        }
        let previous: Vec<TypeId> = self
            .graph
            .neighbors_directed(class, Direction::Outgoing)
            .collect();
        for parent in previous {
            self.graph.remove_edge(class, parent);
        }
        self.graph.add_edge(class, superclass, ());
        true
    }

    /// Direct subclasses of `class`.
    pub fn subclasses(&self, class: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.graph.neighbors_directed(class, Direction::Incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cycles() {
        let (a, b, c) = (TypeId::new(1), TypeId::new(2), TypeId::new(3));
        let mut graph = ClassGraph::new();
        assert!(graph.link(b, a));
        assert!(graph.link(c, b));
        assert!(graph.would_cycle(a, c));
        assert!(!graph.link(a, c));
        assert!(graph.would_cycle(a, a));
    }

    #[test]
    fn lists_direct_subclasses() {
        let (animal, dog, cat) = (TypeId::new(1), TypeId::new(2), TypeId::new(3));
        let mut graph = ClassGraph::new();
        graph.link(dog, animal);
        graph.link(cat, animal);
        let mut subs: Vec<_> = graph.subclasses(animal).collect();
        subs.sort();
        assert_eq!(subs, vec![dog, cat]);
    }
}
