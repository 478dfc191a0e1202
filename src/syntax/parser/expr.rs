//! Right-hand-side expressions.
//!
//! Precedence is resolved by scanning the cleaned text from the right for
//! the lowest-precedence operator present at nesting depth 0: the rightmost
//! `+` if there is one, else the rightmost `*`. The text is split there and
//! both halves are parsed recursively, which makes both operators
//! left-associative. A sub-expression wrapped in one matching pair of
//! parentheses has them stripped before the scan.

use super::fragment::Fragment;
use super::{is_ident, Parser};
use crate::error::CompileError;
use crate::ir::{ConstValue, Node};

/// Rightmost top-level operators found by one scan.
struct Operators {
    plus: Option<usize>,
    star: Option<usize>,
}

impl<'r> Parser<'r> {
    pub(crate) fn parse_expr(&self, expr: Fragment<'_>) -> Result<Node, CompileError> {
        if expr.is_empty() {
            return Err(CompileError::parse("expected an expression", expr.span()));
        }

        if let Some(inner) = strip_wrapping_parens(expr) {
            return self.parse_expr(inner);
        }

        let ops = scan_operators(expr)?;
        if let Some(at) = ops.plus {
            let lhs = self.parse_expr(expr.slice(0, at))?;
            let rhs = self.parse_expr(expr.slice_from(at + 1))?;
            return Ok(Node::add(lhs, rhs));
        }
        if let Some(at) = ops.star {
            let lhs = self.parse_expr(expr.slice(0, at))?;
            let rhs = self.parse_expr(expr.slice_from(at + 1))?;
            return Ok(Node::mul(lhs, rhs));
        }

        self.parse_factor(expr)
    }

    /// An operator-free operand: access, numeric literal, or scalar name.
    fn parse_factor(&self, factor: Fragment<'_>) -> Result<Node, CompileError> {
        let text = factor.as_str();
        if factor.find_byte(b'[').is_some() || factor.find_byte(b']').is_some() {
            return self.parse_access(factor).map(Node::Load);
        }
        if text.bytes().all(|b| b.is_ascii_digit()) {
            return text
                .parse::<i32>()
                .map(Node::int)
                .map_err(|_| {
                    CompileError::parse(
                        format!("integer literal '{}' does not fit in 32 bits", text),
                        factor.span(),
                    )
                });
        }
        if is_decimal(text) {
            return text
                .parse::<f32>()
                .map(|v| Node::Const(ConstValue::F32(v)))
                .map_err(|_| {
                    CompileError::parse(format!("invalid literal '{}'", text), factor.span())
                });
        }
        if is_ident(text) {
            return Ok(Node::var(text));
        }
        Err(CompileError::parse(
            format!("unexpected '{}' in expression", text),
            factor.span(),
        ))
    }
}

/// `digits "." digits` with at least one digit on each side.
fn is_decimal(s: &str) -> bool {
    match s.split_once('.') {
        Some((whole, frac)) => {
            !whole.is_empty()
                && !frac.is_empty()
                && whole.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// If the whole fragment is `( ... )` with the first `(` matching the last
/// `)`, return the inside.
fn strip_wrapping_parens<'a>(expr: Fragment<'a>) -> Option<Fragment<'a>> {
    let text = expr.as_str().as_bytes();
    if text.len() < 2 || text[0] != b'(' || text[text.len() - 1] != b')' {
        return None;
    }
    let mut depth = 0i32;
    for (i, &b) in text.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return (i == text.len() - 1).then(|| expr.slice(1, text.len() - 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Scan right to left, tracking `()`/`[]` nesting, and record the rightmost
/// `+` and `*` at depth 0.
fn scan_operators(expr: Fragment<'_>) -> Result<Operators, CompileError> {
    let text = expr.as_str().as_bytes();
    let mut ops = Operators {
        plus: None,
        star: None,
    };
    let mut parens = 0i32;
    let mut brackets = 0i32;
    for i in (0..text.len()).rev() {
        match text[i] {
            b')' => parens += 1,
            b'(' => {
                parens -= 1;
                if parens < 0 {
                    return Err(CompileError::parse("unmatched '('", expr.span_at(i)));
                }
            }
            b']' => brackets += 1,
            b'[' => {
                brackets -= 1;
                if brackets < 0 {
                    return Err(CompileError::parse("unmatched '['", expr.span_at(i)));
                }
            }
            b'+' if parens == 0 && brackets == 0 && ops.plus.is_none() => ops.plus = Some(i),
            b'*' if parens == 0 && brackets == 0 && ops.star.is_none() => ops.star = Some(i),
            _ => {}
        }
    }
    if parens > 0 {
        return Err(CompileError::parse("unmatched ')'", expr.span()));
    }
    if brackets > 0 {
        return Err(CompileError::parse("unmatched ']'", expr.span()));
    }
    Ok(ops)
}
