//! C99 target: flat row-major indexing and a `TILEC_MIN` macro.
//!
//! Accesses are flattened with the tensor's strides, so `A[i, j]` on an
//! `f32[1024, 1024]` becomes `A[i * 1024 + j]`. Unit strides drop the
//! multiplication. An index count that differs from the rank renders a
//! placeholder comment.

use super::KernelTarget;
use crate::tensor::Tensor;

const PREAMBLE: &[&str] = &[
    "#include <math.h>",
    "",
    "#ifndef TILEC_MIN",
    "#define TILEC_MIN(a, b) ((a) < (b) ? (a) : (b))",
    "#endif",
];

pub struct CTarget;

impl CTarget {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelTarget for CTarget {
    fn target_name(&self) -> &str {
        "c"
    }

    fn language(&self) -> &str {
        "C"
    }

    fn preamble(&self) -> &[&str] {
        PREAMBLE
    }

    fn min_call(&self, lhs: &str, rhs: &str) -> String {
        format!("TILEC_MIN({}, {})", lhs, rhs)
    }

    fn access(&self, tensor: &Tensor, indices: &[String]) -> String {
        if indices.len() != tensor.rank() {
            return format!(
                "/* invalid access: {} has rank {}, indexed with {} */",
                tensor.name(),
                tensor.rank(),
                indices.len()
            );
        }
        let terms: Vec<String> = indices
            .iter()
            .zip(tensor.strides())
            .map(|(index, &stride)| match stride {
                1 => index.clone(),
                _ => format!("{} * {}", index, stride),
            })
            .collect();
        format!("{}[{}]", tensor.name(), terms.join(" + "))
    }
}
