//! Human-readable dumps of IR trees.
//!
//! `Display` for [`Node`] prints an indented tree, one node per line, with
//! loop bounds folded into compact infix expressions. The same text is the
//! canonical form that [`super::hash`] fingerprints.

use std::fmt;

use super::{Access, Node};

const INDENT: &str = "    ";

/// Compact single-line rendering of an expression (`MIN((ii + T), N)`).
pub fn format_expr(node: &Node) -> String {
    match node {
        Node::Const(c) => c.to_string(),
        Node::Variable(name) => name.clone(),
        Node::Add(lhs, rhs) => format!("({} + {})", format_expr(lhs), format_expr(rhs)),
        Node::Mul(lhs, rhs) => format!("({} * {})", format_expr(lhs), format_expr(rhs)),
        Node::Min(lhs, rhs) => format!("MIN({}, {})", format_expr(lhs), format_expr(rhs)),
        Node::Load(a) | Node::Store(a) => format_access(a),
        Node::Loop(_) | Node::Assign(_) => "[COMPLEX_EXPR]".to_string(),
    }
}

fn format_access(access: &Access) -> String {
    let idx: Vec<String> = access.indices.iter().map(format_expr).collect();
    format!("{}[{}]", access.tensor.name(), idx.join(", "))
}

fn write_tree(node: &Node, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let pad = INDENT.repeat(depth);
    match node {
        Node::Loop(l) => {
            writeln!(
                f,
                "{}LOOP {} = {} to {} step {}",
                pad,
                l.index,
                format_expr(&l.lower),
                format_expr(&l.upper),
                format_expr(&l.step)
            )?;
            for child in &l.body {
                write_tree(child, depth + 1, f)?;
            }
            Ok(())
        }
        Node::Assign(a) => {
            writeln!(f, "{}ASSIGN", pad)?;
            write_tree(a.target(), depth + 1, f)?;
            write_tree(a.value(), depth + 1, f)
        }
        Node::Load(a) => writeln!(f, "{}LOAD {}", pad, format_access(a)),
        Node::Store(a) => writeln!(f, "{}STORE {}", pad, format_access(a)),
        Node::Add(lhs, rhs) | Node::Mul(lhs, rhs) | Node::Min(lhs, rhs) => {
            let op = match node {
                Node::Add(..) => "ADD",
                Node::Mul(..) => "MUL",
                _ => "MIN",
            };
            writeln!(f, "{}{}", pad, op)?;
            write_tree(lhs, depth + 1, f)?;
            write_tree(rhs, depth + 1, f)
        }
        Node::Const(c) => writeln!(f, "{}CONST {}", pad, c),
        Node::Variable(name) => writeln!(f, "{}VAR {}", pad, name),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(self, 0, f)
    }
}
