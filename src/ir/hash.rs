//! Content addressing for IR trees.
//!
//! A kernel's identity is the BLAKE3 hash of a versioned canonical
//! serialization: the tree dump, the element type and shape of every tensor
//! it touches, and the element type of every constant. Two structurally identical trees hash equal no matter
//! how they were built; a tree and its tiled form never do.

use super::Node;

const HASH_VERSION: u8 = 2;

/// Short form length in hex characters.
const SHORT_LEN: usize = 16;

/// Fingerprint of a tree, shown as `#` plus the first 16 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// All 64 hex digits.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    pub fn to_short(&self) -> String {
        self.to_hex()[..SHORT_LEN].to_string()
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

/// Canonical byte form of a tree.
fn serialize(node: &Node) -> Vec<u8> {
    let mut buf = vec![HASH_VERSION];
    buf.extend_from_slice(node.to_string().as_bytes());
    for tensor in node.tensors() {
        buf.push(0);
        buf.extend_from_slice(tensor.name().as_bytes());
        buf.push(0);
        buf.extend_from_slice(tensor.dtype().as_str().as_bytes());
        for extent in tensor.extents() {
            buf.extend_from_slice(&(*extent as u64).to_le_bytes());
        }
    }
    // The dump prints `1` for both I32 and I64; constants carry their dtype here.
    node.walk(&mut |n| {
        if let Node::Const(c) = n {
            buf.push(1);
            buf.extend_from_slice(c.dtype().as_str().as_bytes());
        }
    });
    buf
}

/// Hash a tree.
pub fn hash_node(node: &Node) -> ContentHash {
    ContentHash(blake3::hash(&serialize(node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Loop;
    use crate::tensor::{DType, TensorRegistry};

    fn copy_kernel(reg: &TensorRegistry) -> Node {
        let a = reg.lookup("A").unwrap();
        let c = reg.lookup("C").unwrap();
        let stmt = Node::assign(
            Node::store(c, vec![Node::var("i")]),
            Node::load(a, vec![Node::var("i")]),
        )
        .unwrap();
        Node::Loop(Loop::new("i", Node::int(0), Node::var("N"), Node::int(1)).with_body(vec![stmt]))
    }

    fn registry(extent: usize) -> TensorRegistry {
        let mut reg = TensorRegistry::new();
        reg.register("A", DType::Float32, &[extent]).unwrap();
        reg.register("C", DType::Float32, &[extent]).unwrap();
        reg
    }

    #[test]
    fn test_identical_trees_hash_equal() {
        let reg = registry(16);
        let root = copy_kernel(&reg);
        assert_eq!(hash_node(&root), hash_node(&root.clone()));
        assert_eq!(hash_node(&root), hash_node(&copy_kernel(&reg)));
    }

    #[test]
    fn test_shape_changes_hash() {
        let small = copy_kernel(&registry(16));
        let large = copy_kernel(&registry(32));
        assert_ne!(hash_node(&small), hash_node(&large));
    }

    #[test]
    fn test_structure_changes_hash() {
        let reg = registry(16);
        let root = copy_kernel(&reg);
        let mut other = root.clone();
        if let Node::Loop(l) = &mut other {
            l.step = Box::new(Node::int(2));
        }
        assert_ne!(hash_node(&root), hash_node(&other));
    }

    #[test]
    fn test_constant_dtype_changes_hash() {
        use crate::ir::ConstValue;

        let c = |v: ConstValue| hash_node(&Node::Const(v));
        assert_ne!(c(ConstValue::I32(1)), c(ConstValue::I64(1)));
        assert_ne!(c(ConstValue::F32(0.5)), c(ConstValue::F64(0.5)));
        assert_eq!(c(ConstValue::I64(1)), c(ConstValue::I64(1)));
    }

    #[test]
    fn test_hex_forms() {
        let h = hash_node(&copy_kernel(&registry(4)));
        let hex = h.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(h.as_bytes().len(), 32);
        assert_eq!(h.to_short().len(), 16);
        assert!(hex.starts_with(&h.to_short()));
        assert_eq!(format!("{}", h), format!("#{}", h.to_short()));
    }
}
