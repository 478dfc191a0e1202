//! Tree IR for dense loop nests.
//!
//! The IR is a closed sum type. Every non-leaf node owns its children
//! (`Box`/`Vec`), so a tree can never share a node between two parents and
//! dropping a root drops the whole subtree. Access nodes hold an
//! `Arc<Tensor>` that is shared, never copied, by `Clone`.
//!
//! `Clone` is the deep copy: it rebuilds every owned child recursively and
//! bumps the reference count of each tensor descriptor.

pub mod display;
pub mod hash;
mod visit;

use std::fmt;
use std::sync::Arc;

use crate::error::CompileError;
use crate::tensor::{DType, Tensor};

// ─── Node Kinds ────────────────────────────────────────────────────

/// Discriminant of a [`Node`], used in diagnostics and counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Loop,
    Load,
    Store,
    Add,
    Mul,
    Min,
    Assign,
    Const,
    Variable,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Loop => "loop",
            NodeKind::Load => "load",
            NodeKind::Store => "store",
            NodeKind::Add => "add",
            NodeKind::Mul => "mul",
            NodeKind::Min => "min",
            NodeKind::Assign => "assign",
            NodeKind::Const => "const",
            NodeKind::Variable => "variable",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Constants ─────────────────────────────────────────────────────

/// A typed numeric literal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstValue {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl ConstValue {
    pub fn dtype(&self) -> DType {
        match self {
            ConstValue::I32(_) => DType::Int32,
            ConstValue::I64(_) => DType::Int64,
            ConstValue::F32(_) => DType::Float32,
            ConstValue::F64(_) => DType::Float64,
        }
    }

    /// Integer value, if this is an integer literal.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ConstValue::I32(v) => Some(v as i64),
            ConstValue::I64(v) => Some(v),
            ConstValue::F32(_) | ConstValue::F64(_) => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::I32(v) => write!(f, "{}", v),
            ConstValue::I64(v) => write!(f, "{}", v),
            ConstValue::F32(v) => write!(f, "{:?}", v),
            ConstValue::F64(v) => write!(f, "{:?}", v),
        }
    }
}

// ─── Nodes ─────────────────────────────────────────────────────────

/// A tensor element access: the tensor plus one index expression per dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Access {
    pub tensor: Arc<Tensor>,
    pub indices: Vec<Node>,
}

/// A counted loop `for index in [lower, upper) by step`.
#[derive(Clone, Debug, PartialEq)]
pub struct Loop {
    pub index: String,
    pub lower: Box<Node>,
    pub upper: Box<Node>,
    pub step: Box<Node>,
    pub body: Vec<Node>,
}

impl Loop {
    pub fn new(index: impl Into<String>, lower: Node, upper: Node, step: Node) -> Self {
        Self {
            index: index.into(),
            lower: Box::new(lower),
            upper: Box::new(upper),
            step: Box::new(step),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: Vec<Node>) -> Self {
        self.body = body;
        self
    }
}

/// `target = value`. The target is restricted to [`Node::Store`] or
/// [`Node::Variable`]; the fields are private so that cannot be bypassed.
#[derive(Clone, Debug, PartialEq)]
pub struct Assign {
    target: Box<Node>,
    value: Box<Node>,
}

impl Assign {
    pub fn new(target: Node, value: Node) -> Result<Self, CompileError> {
        match target {
            Node::Store(_) | Node::Variable(_) => Ok(Self {
                target: Box::new(target),
                value: Box::new(value),
            }),
            other => Err(CompileError::InvalidAssignTarget { kind: other.kind() }),
        }
    }

    pub fn target(&self) -> &Node {
        &self.target
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    /// Replace the value expression, returning the old one.
    pub fn replace_value(&mut self, value: Node) -> Node {
        *std::mem::replace(&mut self.value, Box::new(value))
    }

    pub fn into_parts(self) -> (Node, Node) {
        (*self.target, *self.value)
    }
}

/// One IR node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Loop(Loop),
    Load(Access),
    Store(Access),
    Add(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Min(Box<Node>, Box<Node>),
    Assign(Assign),
    Const(ConstValue),
    Variable(String),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Loop(_) => NodeKind::Loop,
            Node::Load(_) => NodeKind::Load,
            Node::Store(_) => NodeKind::Store,
            Node::Add(..) => NodeKind::Add,
            Node::Mul(..) => NodeKind::Mul,
            Node::Min(..) => NodeKind::Min,
            Node::Assign(_) => NodeKind::Assign,
            Node::Const(_) => NodeKind::Const,
            Node::Variable(_) => NodeKind::Variable,
        }
    }

    pub fn var(name: impl Into<String>) -> Node {
        Node::Variable(name.into())
    }

    pub fn int(value: i32) -> Node {
        Node::Const(ConstValue::I32(value))
    }

    pub fn add(lhs: Node, rhs: Node) -> Node {
        Node::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: Node, rhs: Node) -> Node {
        Node::Mul(Box::new(lhs), Box::new(rhs))
    }

    pub fn min(lhs: Node, rhs: Node) -> Node {
        Node::Min(Box::new(lhs), Box::new(rhs))
    }

    pub fn load(tensor: Arc<Tensor>, indices: Vec<Node>) -> Node {
        Node::Load(Access { tensor, indices })
    }

    pub fn store(tensor: Arc<Tensor>, indices: Vec<Node>) -> Node {
        Node::Store(Access { tensor, indices })
    }

    pub fn assign(target: Node, value: Node) -> Result<Node, CompileError> {
        Assign::new(target, value).map(Node::Assign)
    }

    /// Whether this node may appear where a value is expected.
    pub fn is_expr(&self) -> bool {
        matches!(
            self,
            Node::Load(_)
                | Node::Add(..)
                | Node::Mul(..)
                | Node::Min(..)
                | Node::Const(_)
                | Node::Variable(_)
        )
    }

    /// Whether this node may appear in a loop body.
    pub fn is_stmt(&self) -> bool {
        matches!(self, Node::Loop(_) | Node::Assign(_))
    }

    pub fn as_loop(&self) -> Option<&Loop> {
        match self {
            Node::Loop(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_assign(&self) -> Option<&Assign> {
        match self {
            Node::Assign(a) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tensor::TensorRegistry;

    fn registry() -> TensorRegistry {
        let mut reg = TensorRegistry::new();
        reg.register("A", DType::Float32, &[8, 8]).unwrap();
        reg.register("C", DType::Float32, &[8, 8]).unwrap();
        reg
    }

    fn ij() -> Vec<Node> {
        vec![Node::var("i"), Node::var("j")]
    }

    #[test]
    fn test_assign_accepts_store_and_variable() {
        let reg = registry();
        let c = reg.lookup("C").unwrap();
        let a = reg.lookup("A").unwrap();
        assert!(Node::assign(Node::store(c, ij()), Node::load(a.clone(), ij())).is_ok());
        assert!(Node::assign(Node::var("acc"), Node::load(a, ij())).is_ok());
    }

    #[test]
    fn test_assign_rejects_other_targets() {
        let reg = registry();
        let a = reg.lookup("A").unwrap();
        let bad = [
            Node::load(a, ij()),
            Node::int(3),
            Node::add(Node::var("x"), Node::var("y")),
            Node::Loop(Loop::new("i", Node::int(0), Node::var("N"), Node::int(1))),
        ];
        for target in bad {
            let kind = target.kind();
            let err = Node::assign(target, Node::int(0)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAssignTarget);
            assert_eq!(err, CompileError::InvalidAssignTarget { kind });
        }
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(Node::int(1).kind(), NodeKind::Const);
        assert_eq!(Node::var("N").kind(), NodeKind::Variable);
        assert_eq!(Node::min(Node::int(1), Node::int(2)).kind(), NodeKind::Min);
        assert!(Node::var("N").is_expr());
        assert!(!Node::var("N").is_stmt());
        let l = Node::Loop(Loop::new("i", Node::int(0), Node::var("N"), Node::int(1)));
        assert!(l.is_stmt());
        assert!(!l.is_expr());
        assert_eq!(l.as_loop().map(|l| l.index.as_str()), Some("i"));
    }

    #[test]
    fn test_const_values() {
        assert_eq!(ConstValue::I32(4).dtype(), DType::Int32);
        assert_eq!(ConstValue::F64(0.5).dtype(), DType::Float64);
        assert_eq!(ConstValue::I64(-3).as_i64(), Some(-3));
        assert_eq!(ConstValue::F32(1.0).as_i64(), None);
        assert_eq!(ConstValue::F32(1.0).to_string(), "1.0");
        assert_eq!(ConstValue::I32(42).to_string(), "42");
    }

    #[test]
    fn test_replace_value_is_whole_subtree() {
        let mut a = Assign::new(Node::var("x"), Node::int(1)).unwrap();
        let old = a.replace_value(Node::add(Node::var("x"), Node::int(2)));
        assert_eq!(old, Node::int(1));
        assert_eq!(a.value().kind(), NodeKind::Add);
        let (target, value) = a.into_parts();
        assert_eq!(target, Node::var("x"));
        assert_eq!(value.kind(), NodeKind::Add);
    }
}
