//! Read-only traversals over IR trees.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{Node, NodeKind};
use crate::tensor::Tensor;

impl Node {
    /// Direct children in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Loop(l) => {
                let mut out: Vec<&Node> = vec![&*l.lower, &*l.upper, &*l.step];
                out.extend(l.body.iter());
                out
            }
            Node::Load(a) | Node::Store(a) => a.indices.iter().collect(),
            Node::Add(lhs, rhs) | Node::Mul(lhs, rhs) | Node::Min(lhs, rhs) => vec![&**lhs, &**rhs],
            Node::Assign(a) => vec![a.target(), a.value()],
            Node::Const(_) | Node::Variable(_) => Vec::new(),
        }
    }

    /// Pre-order traversal of the whole subtree, this node included.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Number of nodes of `kind` in the subtree.
    pub fn count(&self, kind: NodeKind) -> usize {
        let mut n = 0;
        self.walk(&mut |node| {
            if node.kind() == kind {
                n += 1;
            }
        });
        n
    }

    /// Node count per kind over the subtree.
    pub fn histogram(&self) -> BTreeMap<NodeKind, usize> {
        let mut out = BTreeMap::new();
        self.walk(&mut |node| *out.entry(node.kind()).or_insert(0) += 1);
        out
    }

    /// Maximum loop nesting depth.
    pub fn loop_depth(&self) -> usize {
        match self {
            Node::Loop(l) => 1 + l.body.iter().map(Node::loop_depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Tensors referenced by loads and stores, deduplicated, in name order.
    pub fn tensors(&self) -> Vec<Arc<Tensor>> {
        let mut by_name: BTreeMap<&str, &Arc<Tensor>> = BTreeMap::new();
        self.walk(&mut |node| {
            if let Node::Load(a) | Node::Store(a) = node {
                by_name.entry(a.tensor.name()).or_insert(&a.tensor);
            }
        });
        by_name.into_values().cloned().collect()
    }

    /// Index names of every loop in the subtree.
    pub fn loop_indices(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.walk(&mut |node| {
            if let Node::Loop(l) = node {
                out.insert(l.index.clone());
            }
        });
        out
    }

    /// Every identifier used in the subtree: loop indices and variables.
    pub fn names(&self) -> BTreeSet<String> {
        let mut out = self.loop_indices();
        self.walk(&mut |node| {
            if let Node::Variable(name) = node {
                out.insert(name.clone());
            }
        });
        out
    }

    /// Variables that no loop in the subtree binds (sizes, tile widths).
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let bound = self.loop_indices();
        let mut out = BTreeSet::new();
        self.walk(&mut |node| {
            if let Node::Variable(name) = node {
                if !bound.contains(name) {
                    out.insert(name.clone());
                }
            }
        });
        out
    }

    /// Free symbols that appear in some loop's bounds or step.
    pub fn extent_symbols(&self) -> BTreeSet<String> {
        let free = self.free_symbols();
        let mut out = BTreeSet::new();
        self.walk(&mut |node| {
            if let Node::Loop(l) = node {
                for part in [&*l.lower, &*l.upper, &*l.step] {
                    part.walk(&mut |n| {
                        if let Node::Variable(name) = n {
                            if free.contains(name) {
                                out.insert(name.clone());
                            }
                        }
                    });
                }
            }
        });
        out
    }

    /// The tensor written by the first store in the subtree.
    pub fn store_tensor(&self) -> Option<Arc<Tensor>> {
        let mut found = None;
        self.walk(&mut |node| {
            if let Node::Store(a) = node {
                if found.is_none() {
                    found = Some(a.tensor.clone());
                }
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::{Loop, Node, NodeKind};
    use crate::tensor::{DType, TensorRegistry};

    fn nest() -> Node {
        let mut reg = TensorRegistry::new();
        let c = reg.register("C", DType::Float32, &[4, 4]).unwrap();
        let b = reg.register("B", DType::Float32, &[4, 4]).unwrap();
        let a = reg.register("A", DType::Float32, &[4, 4]).unwrap();
        let ij = || vec![Node::var("i"), Node::var("j")];
        let stmt = Node::assign(
            Node::store(c, ij()),
            Node::add(Node::load(a, ij()), Node::load(b, ij())),
        )
        .unwrap();
        let inner = Loop::new("j", Node::int(0), Node::var("M"), Node::int(1)).with_body(vec![stmt]);
        Node::Loop(
            Loop::new("i", Node::int(0), Node::var("N"), Node::int(1))
                .with_body(vec![Node::Loop(inner)]),
        )
    }

    #[test]
    fn test_counts() {
        let root = nest();
        assert_eq!(root.count(NodeKind::Loop), 2);
        assert_eq!(root.count(NodeKind::Assign), 1);
        assert_eq!(root.count(NodeKind::Load), 2);
        assert_eq!(root.count(NodeKind::Store), 1);
        assert_eq!(root.loop_depth(), 2);
        let h = root.histogram();
        assert_eq!(h[&NodeKind::Const], 4);
        assert_eq!(h.get(&NodeKind::Min), None);
    }

    #[test]
    fn test_tensors_sorted_and_deduplicated() {
        let root = nest();
        let names: Vec<String> = root.tensors().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_free_symbols() {
        let root = nest();
        let free: Vec<String> = root.free_symbols().into_iter().collect();
        assert_eq!(free, vec!["M", "N"]);
        let names: Vec<String> = root.names().into_iter().collect();
        assert_eq!(names, vec!["M", "N", "i", "j"]);
    }

    #[test]
    fn test_extent_symbols_exclude_scalars() {
        let mut reg = TensorRegistry::new();
        let c = reg.register("C", DType::Float32, &[4]).unwrap();
        let a = reg.register("A", DType::Float32, &[4]).unwrap();
        let stmt = Node::assign(
            Node::store(c, vec![Node::var("i")]),
            Node::mul(Node::load(a, vec![Node::var("i")]), Node::var("alpha")),
        )
        .unwrap();
        let root = Node::Loop(
            Loop::new("i", Node::int(0), Node::var("N"), Node::var("S")).with_body(vec![stmt]),
        );

        let free: Vec<String> = root.free_symbols().into_iter().collect();
        assert_eq!(free, vec!["N", "S", "alpha"]);
        let extents: Vec<String> = root.extent_symbols().into_iter().collect();
        assert_eq!(extents, vec!["N", "S"]);
        assert_eq!(root.store_tensor().map(|t| t.name().to_string()), Some("C".to_string()));
        assert!(Node::var("x").store_tensor().is_none());
        assert!(Node::var("x").extent_symbols().is_empty());
    }
}
