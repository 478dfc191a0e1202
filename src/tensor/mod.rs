//! Tensor descriptors and the registry the parser resolves accesses against.
//!
//! A [`Tensor`] is created once at registration and never changes. IR access
//! nodes hold an `Arc<Tensor>`, so copying a tree shares descriptors rather
//! than duplicating them, and tensors outlive any tree that mentions them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CompileError;

// ─── Element Types ─────────────────────────────────────────────────

/// Numeric element kinds a tensor (or constant) can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DType {
    #[serde(rename = "f32")]
    Float32,
    #[serde(rename = "f64")]
    Float64,
    #[serde(rename = "i32")]
    Int32,
    #[serde(rename = "i64")]
    Int64,
}

impl DType {
    /// Short label used in configs and dumps.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Float32 => "f32",
            DType::Float64 => "f64",
            DType::Int32 => "i32",
            DType::Int64 => "i64",
        }
    }

    /// Element type spelling in emitted C/C++ source.
    pub fn c_type(self) -> &'static str {
        match self {
            DType::Float32 => "float",
            DType::Float64 => "double",
            DType::Int32 => "int",
            DType::Int64 => "long long",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Tensor ────────────────────────────────────────────────────────

/// A named dense array descriptor with row-major strides.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tensor {
    name: String,
    dtype: DType,
    extents: Vec<usize>,
    strides: Vec<usize>,
}

impl Tensor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.extents.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.extents.iter().map(|e| e.to_string()).collect();
        write!(f, "{}: {}[{}]", self.name, self.dtype, dims.join(", "))
    }
}

/// Row-major strides: last dimension 1, each earlier one the product of
/// all later extents. `None` on overflow.
fn row_major_strides(extents: &[usize]) -> Option<Vec<usize>> {
    let mut strides = vec![1usize; extents.len()];
    for d in (0..extents.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1].checked_mul(extents[d + 1])?;
    }
    Some(strides)
}

// ─── Registry ──────────────────────────────────────────────────────

/// Named tensors, looked up by the parser when it builds access nodes.
#[derive(Clone, Debug, Default)]
pub struct TensorRegistry {
    tensors: BTreeMap<String, Arc<Tensor>>,
}

impl TensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tensor whose rank is implied by `extents`.
    pub fn register(
        &mut self,
        name: &str,
        dtype: DType,
        extents: &[usize],
    ) -> Result<Arc<Tensor>, CompileError> {
        self.register_ranked(name, dtype, extents.len(), extents)
    }

    /// Register a tensor with an explicitly declared rank.
    pub fn register_ranked(
        &mut self,
        name: &str,
        dtype: DType,
        rank: usize,
        extents: &[usize],
    ) -> Result<Arc<Tensor>, CompileError> {
        if self.tensors.contains_key(name) {
            return Err(CompileError::DuplicateName {
                name: name.to_string(),
            });
        }
        let mismatch = |reason: String| CompileError::ShapeMismatch {
            name: name.to_string(),
            reason,
        };
        if rank != extents.len() {
            return Err(mismatch(format!(
                "declared rank {} but {} extents given",
                rank,
                extents.len()
            )));
        }
        if rank == 0 {
            return Err(mismatch("rank must be at least 1".to_string()));
        }
        if let Some(dim) = extents.iter().position(|&e| e == 0) {
            return Err(mismatch(format!("extent 0 in dimension {}", dim)));
        }
        let strides = row_major_strides(extents)
            .ok_or_else(|| mismatch("element count overflows usize".to_string()))?;
        if extents.iter().try_fold(1usize, |acc, &e| acc.checked_mul(e)).is_none() {
            return Err(mismatch("element count overflows usize".to_string()));
        }

        let tensor = Arc::new(Tensor {
            name: name.to_string(),
            dtype,
            extents: extents.to_vec(),
            strides,
        });
        tracing::debug!("registered tensor {}", tensor);
        self.tensors.insert(name.to_string(), Arc::clone(&tensor));
        Ok(tensor)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Tensor>, CompileError> {
        self.tensors
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownTensor {
                name: name.to_string(),
                span: None,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Registered tensors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tensor>> {
        self.tensors.values()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tensors.keys().map(|k| k.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_row_major_strides() {
        let mut reg = TensorRegistry::new();
        let t = reg.register("A", DType::Float32, &[4, 5, 6]).unwrap();
        assert_eq!(t.rank(), 3);
        assert_eq!(t.extents(), &[4, 5, 6]);
        assert_eq!(t.strides(), &[30, 6, 1]);
        assert_eq!(t.len(), 120);

        let v = reg.register("v", DType::Int64, &[7]).unwrap();
        assert_eq!(v.strides(), &[1]);
    }

    #[test]
    fn test_lookup_shares_descriptor() {
        let mut reg = TensorRegistry::new();
        let a = reg.register("A", DType::Float64, &[2, 2]).unwrap();
        let found = reg.lookup("A").unwrap();
        assert!(Arc::ptr_eq(&a, &found));
        assert!(reg.contains("A"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_duplicate_name() {
        let mut reg = TensorRegistry::new();
        reg.register("A", DType::Float32, &[8]).unwrap();
        let err = reg.register("A", DType::Int32, &[8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        // The first registration is untouched.
        assert_eq!(reg.lookup("A").unwrap().dtype(), DType::Float32);
    }

    #[test]
    fn test_shape_mismatch() {
        let mut reg = TensorRegistry::new();
        let err = reg
            .register_ranked("A", DType::Float32, 3, &[4, 4])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(err.to_string().contains("declared rank 3"));

        let err = reg.register("B", DType::Float32, &[4, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);
        assert!(err.to_string().contains("dimension 1"));

        let err = reg.register("S", DType::Float32, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let err = reg
            .register("Huge", DType::Float32, &[usize::MAX, 2])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        assert!(reg.is_empty());
    }

    #[test]
    fn test_unknown_tensor() {
        let reg = TensorRegistry::new();
        let err = reg.lookup("Q").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTensor);
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_iteration_in_name_order() {
        let mut reg = TensorRegistry::new();
        reg.register("C", DType::Float32, &[2]).unwrap();
        reg.register("A", DType::Float32, &[2]).unwrap();
        reg.register("B", DType::Float32, &[2]).unwrap();
        assert_eq!(reg.names(), vec!["A", "B", "C"]);
        let names: Vec<&str> = reg.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_display() {
        let mut reg = TensorRegistry::new();
        let t = reg.register("A", DType::Float32, &[1024, 1024]).unwrap();
        assert_eq!(t.to_string(), "A: f32[1024, 1024]");
        assert_eq!(DType::Int64.c_type(), "long long");
        assert!(DType::Float64.is_float());
        assert!(!DType::Int32.is_float());
    }
}
