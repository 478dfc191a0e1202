//! Two-level loop tiling.
//!
//! A nest `i > j > stmt` becomes `ii > jj > i > j > stmt`:
//!
//! ```text
//! for ii in [lb_i, ub_i) by T
//!   for jj in [lb_j, ub_j) by T
//!     for i in [ii, MIN(ii + T, ub_i)) by s_i
//!       for j in [jj, MIN(jj + T, ub_j)) by s_j
//!         stmt
//! ```
//!
//! The width `T` stays symbolic. Only a loop whose single body statement is
//! a loop whose single body statement is an assignment is accepted.


use std::collections::BTreeSet;

use crate::error::CompileError;
use crate::ir::{Loop, Node};
use crate::syntax::parser::is_ident;

/// Tiling parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileOptions {
    /// Name of the symbolic tile width.
    pub width: String,
}

impl TileOptions {
    pub fn new(width: impl Into<String>) -> Self {
        Self {
            width: width.into(),
        }
    }
}

impl Default for TileOptions {
    fn default() -> Self {
        Self::new("T")
    }
}

/// Tile `root` with the default width symbol `T`.
pub fn tile(root: &Node) -> Result<Node, CompileError> {
    tile_with(root, &TileOptions::default())
}

/// Tile `root` into an independent four-level nest.
pub fn tile_with(root: &Node, options: &TileOptions) -> Result<Node, CompileError> {
    check_nest(root)?;
    if !is_ident(&options.width) {
        return Err(CompileError::precondition(format!(
            "tile width '{}' is not an identifier",
            options.width
        )));
    }

    let (outer, inner, stmt) = split_nest(root.clone())?;
    if options.width == outer.index || options.width == inner.index {
        return Err(CompileError::precondition(format!(
            "tile width '{}' collides with a loop index of the nest",
            options.width
        )));
    }

    let mut taken = root.names();
    taken.extend(root.tensors().iter().map(|t| t.name().to_string()));
    taken.insert(options.width.clone());
    let ii = fresh_index(&outer.index, &mut taken);
    let jj = fresh_index(&inner.index, &mut taken);
    tracing::debug!(
        "tiling {} x {} with tile indices {}, {} and width {}",
        outer.index,
        inner.index,
        ii,
        jj,
        options.width
    );

    let width = || Node::var(options.width.as_str());
    let point_upper = |tile: &str, upper: &Node| {
        Node::min(Node::add(Node::var(tile), width()), upper.clone())
    };

    let point_j = Loop {
        upper: Box::new(point_upper(&jj, &inner.upper)),
        lower: Box::new(Node::var(jj.as_str())),
        index: inner.index,
        step: inner.step,
        body: vec![stmt],
    };
    let point_i = Loop {
        upper: Box::new(point_upper(&ii, &outer.upper)),
        lower: Box::new(Node::var(ii.as_str())),
        index: outer.index,
        step: outer.step,
        body: vec![Node::Loop(point_j)],
    };
    let tile_j = Loop {
        index: jj,
        lower: inner.lower,
        upper: inner.upper,
        step: Box::new(width()),
        body: vec![Node::Loop(point_i)],
    };
    let tile_i = Loop {
        index: ii,
        lower: outer.lower,
        upper: outer.upper,
        step: Box::new(width()),
        body: vec![Node::Loop(tile_j)],
    };
    Ok(Node::Loop(tile_i))
}

/// Validate the nest shape by reference, before anything is copied.
fn check_nest(root: &Node) -> Result<(), CompileError> {
    let outer = root.as_loop().ok_or_else(|| {
        CompileError::precondition(format!(
            "root is not a loop (found {} node)",
            root.kind()
        ))
    })?;
    let inner = match single(outer)? {
        Node::Loop(l) => l,
        other => {
            return Err(CompileError::precondition(format!(
                "body of loop '{}' is not a nested loop (found {} node)",
                outer.index,
                other.kind()
            )))
        }
    };
    match single(inner)? {
        Node::Assign(_) => Ok(()),
        other => Err(CompileError::precondition(format!(
            "body of loop '{}' is not an assignment (found {} node)",
            inner.index,
            other.kind()
        ))),
    }
}

fn single(l: &Loop) -> Result<&Node, CompileError> {
    match l.body.as_slice() {
        [only] => Ok(only),
        body => Err(CompileError::precondition(format!(
            "loop '{}' has {} body statements, expected 1",
            l.index,
            body.len()
        ))),
    }
}

/// Take an owned, already validated nest apart.
fn split_nest(root: Node) -> Result<(Loop, Loop, Node), CompileError> {
    let shape = || CompileError::precondition("expected a two-level loop nest");
    let Node::Loop(mut outer) = root else {
        return Err(shape());
    };
    let Some(Node::Loop(mut inner)) = outer.body.pop() else {
        return Err(shape());
    };
    let stmt = inner.body.pop().ok_or_else(shape)?;
    Ok((outer, inner, stmt))
}

/// `i` → `ii`, `row` → `row_tile`, then `ii2`, `ii3`, ... until unused.
fn fresh_index(index: &str, taken: &mut BTreeSet<String>) -> String {
    let base = if index.chars().count() == 1 {
        format!("{}{}", index, index)
    } else {
        format!("{}_tile", index)
    };
    let mut name = base.clone();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{}{}", base, n);
        n += 1;
    }
    taken.insert(name.clone());
    name
}
