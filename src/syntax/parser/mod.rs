//! DSL builder: program text → IR tree.
//!
//! ```text
//! program   := "LOOPS:" header ("," header)* "BODY:" statement
//! header    := ident "=" bound ":" bound ":" bound
//! statement := access "=" expr
//! access    := ident "[" ident ("," ident)* "]"
//! ```
//!
//! Whitespace is stripped up front. Headers nest in order (first listed is
//! outermost) and wrap the single assignment. Expressions are handled in
//! [`expr`].

mod expr;
mod fragment;

use std::collections::BTreeSet;

use crate::error::CompileError;
use crate::ir::{Access, Loop, Node};
use crate::tensor::TensorRegistry;

use fragment::{Cleaned, Fragment};

const LOOPS_MARKER: &str = "LOOPS:";
const BODY_MARKER: &str = "BODY:";

/// Parses DSL programs against a tensor registry.
pub struct Parser<'r> {
    registry: &'r TensorRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r TensorRegistry) -> Self {
        Self { registry }
    }

    /// Parse a whole program. The root of the result is the outermost loop.
    pub fn parse(&self, source: &str) -> Result<Node, CompileError> {
        let cleaned = Cleaned::new(source);
        let program = cleaned.fragment();

        let loops_at = program.find_token(LOOPS_MARKER).ok_or_else(|| {
            CompileError::parse("missing 'LOOPS:' section marker", program.span())
        })?;
        let body_at = program.find_token(BODY_MARKER).ok_or_else(|| {
            CompileError::parse("missing 'BODY:' section marker", program.span())
        })?;
        if body_at < loops_at {
            return Err(CompileError::parse(
                "'BODY:' must follow the 'LOOPS:' section",
                program.slice(body_at, body_at + BODY_MARKER.len()).span(),
            ));
        }
        if loops_at > 0 {
            return Err(CompileError::parse(
                "unexpected text before 'LOOPS:'",
                program.slice(0, loops_at).span(),
            ));
        }

        let headers = program.slice(loops_at + LOOPS_MARKER.len(), body_at);
        let body = program.slice_from(body_at + BODY_MARKER.len());

        let loops = self.parse_headers(headers)?;
        let stmt = self.parse_statement(body)?;

        let mut current = stmt;
        for header in loops.into_iter().rev() {
            current = Node::Loop(header.with_body(vec![current]));
        }
        tracing::debug!("parsed loop nest of depth {}", current.loop_depth());
        Ok(current)
    }

    fn parse_headers(&self, headers: Fragment<'_>) -> Result<Vec<Loop>, CompileError> {
        if headers.is_empty() {
            return Err(CompileError::parse(
                "expected at least one loop header after 'LOOPS:'",
                headers.span(),
            ));
        }
        let mut seen = BTreeSet::new();
        let mut loops = Vec::new();
        for header in headers.split_top_level(b',') {
            let l = parse_header(header)?;
            if !seen.insert(l.index.clone()) {
                return Err(CompileError::parse(
                    format!("loop index '{}' is declared twice", l.index),
                    header.span(),
                ));
            }
            loops.push(l);
        }
        Ok(loops)
    }

    fn parse_statement(&self, body: Fragment<'_>) -> Result<Node, CompileError> {
        if body.is_empty() {
            return Err(CompileError::parse(
                "expected a statement after 'BODY:'",
                body.span(),
            ));
        }
        let eq = body.find_byte(b'=').ok_or_else(|| {
            CompileError::parse("expected '=' in statement", body.span())
        })?;
        let target = body.slice(0, eq);
        let value = body.slice_from(eq + 1);

        let store = Node::Store(self.parse_access(target)?);
        let value = self.parse_expr(value)?;
        Node::assign(store, value)
    }

    /// `name[i, j, ...]` with bare identifier indices.
    pub(crate) fn parse_access(&self, access: Fragment<'_>) -> Result<Access, CompileError> {
        let open = match access.find_byte(b'[') {
            Some(open) => open,
            None => {
                let reason = if access.find_byte(b']').is_some() {
                    format!("unmatched ']' in tensor access '{}'", access.as_str())
                } else {
                    format!(
                        "expected a tensor access like 'A[i, j]', found '{}'",
                        access.as_str()
                    )
                };
                return Err(CompileError::parse(reason, access.span()));
            }
        };
        let close = access.find_byte(b']').ok_or_else(|| {
            CompileError::parse(
                format!("unmatched '[' in tensor access '{}'", access.as_str()),
                access.span_at(open),
            )
        })?;
        if close < open {
            return Err(CompileError::parse(
                format!("unmatched ']' in tensor access '{}'", access.as_str()),
                access.span_at(close),
            ));
        }
        if close + 1 != access.len() {
            return Err(CompileError::parse(
                format!("unexpected text after ']' in '{}'", access.as_str()),
                access.slice_from(close + 1).span(),
            ));
        }

        let name = access.slice(0, open);
        if !is_ident(name.as_str()) {
            return Err(CompileError::parse(
                format!("invalid tensor name '{}'", name.as_str()),
                name.span(),
            ));
        }

        let inner = access.slice(open + 1, close);
        if inner.is_empty() {
            return Err(CompileError::parse(
                format!("tensor access '{}' has no indices", access.as_str()),
                access.span(),
            ));
        }
        let mut indices = Vec::new();
        for idx in inner.split_top_level(b',') {
            if !is_ident(idx.as_str()) {
                return Err(CompileError::parse(
                    format!(
                        "index expressions must be bare identifiers, found '{}'",
                        idx.as_str()
                    ),
                    idx.span(),
                ));
            }
            indices.push(Node::var(idx.as_str()));
        }

        let tensor = self
            .registry
            .lookup(name.as_str())
            .map_err(|_| CompileError::UnknownTensor {
                name: name.as_str().to_string(),
                span: Some(name.span()),
            })?;
        if tensor.rank() != indices.len() {
            return Err(CompileError::parse(
                format!(
                    "tensor '{}' has rank {} but is indexed with {} indices",
                    tensor.name(),
                    tensor.rank(),
                    indices.len()
                ),
                access.span(),
            ));
        }

        Ok(Access { tensor, indices })
    }
}

/// `ident "=" bound ":" bound ":" bound`
fn parse_header(header: Fragment<'_>) -> Result<Loop, CompileError> {
    if header.is_empty() {
        return Err(CompileError::parse("empty loop header", header.span()));
    }
    let eq = header.find_byte(b'=').ok_or_else(|| {
        CompileError::parse(
            format!("loop header '{}' is missing '='", header.as_str()),
            header.span(),
        )
    })?;
    let index = header.slice(0, eq);
    if !is_ident(index.as_str()) {
        return Err(CompileError::parse(
            format!("invalid loop index '{}'", index.as_str()),
            index.span(),
        ));
    }

    let bounds = header.slice_from(eq + 1).split_top_level(b':');
    if bounds.len() != 3 {
        return Err(CompileError::parse(
            format!(
                "loop header '{}' needs lower:upper:step, found {} part(s)",
                header.as_str(),
                bounds.len()
            ),
            header.span(),
        ));
    }

    Ok(Loop::new(
        index.as_str(),
        parse_bound(bounds[0])?,
        parse_bound(bounds[1])?,
        parse_bound(bounds[2])?,
    ))
}

/// All digits → `Const(i32)`; an identifier → `Variable`.
fn parse_bound(bound: Fragment<'_>) -> Result<Node, CompileError> {
    let text = bound.as_str();
    if text.is_empty() {
        return Err(CompileError::parse("empty loop bound", bound.span()));
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse::<i32>().map(Node::int).map_err(|_| {
            CompileError::parse(
                format!("loop bound '{}' does not fit in a 32-bit integer", text),
                bound.span(),
            )
        });
    }
    if is_ident(text) {
        return Ok(Node::var(text));
    }
    Err(CompileError::parse(
        format!(
            "invalid loop bound '{}': expected an integer literal or a symbolic name",
            text
        ),
        bound.span(),
    ))
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse `source` into an IR tree using `registry` for tensor lookups.
pub fn parse(source: &str, registry: &TensorRegistry) -> Result<Node, CompileError> {
    Parser::new(registry).parse(source)
}
