//! C++ target: `std::min` and multi-index `A[i, j]` accesses.

use super::KernelTarget;
use crate::tensor::Tensor;

const PREAMBLE: &[&str] = &["#include <algorithm>", "#include <iostream>", "#include <cmath>"];

pub struct CppTarget;

impl CppTarget {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CppTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelTarget for CppTarget {
    fn target_name(&self) -> &str {
        "cpp"
    }

    fn language(&self) -> &str {
        "C++"
    }

    fn preamble(&self) -> &[&str] {
        PREAMBLE
    }

    fn min_call(&self, lhs: &str, rhs: &str) -> String {
        format!("std::min({}, {})", lhs, rhs)
    }

    fn access(&self, tensor: &Tensor, indices: &[String]) -> String {
        format!("{}[{}]", tensor.name(), indices.join(", "))
    }
}
