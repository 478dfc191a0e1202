//! Project configuration from `tilec.toml`.
//!
//! ```toml
//! [kernel]
//! name = "add"
//! target = "cpp"
//! tile_width = "T"
//! tile = true
//!
//! [tensors.A]
//! dtype = "f32"
//! shape = [1024, 1024]
//! ```
//!
//! Every section is optional. Without a `[tensors]` table the registry
//! holds `A`, `B` and `C` as `f32[1024, 1024]`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::codegen::{create_target, KernelTarget};
use crate::error::CompileError;
use crate::syntax::parser::is_ident;
use crate::tensor::{DType, TensorRegistry};
use crate::transform::TileOptions;

pub const CONFIG_FILE: &str = "tilec.toml";

const DEFAULT_TENSORS: [&str; 3] = ["A", "B", "C"];
const DEFAULT_EXTENT: usize = 1024;

/// Parsed `tilec.toml`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelConfig {
    #[serde(default)]
    pub kernel: KernelSection,
    #[serde(default)]
    pub tensors: BTreeMap<String, TensorDecl>,
}

/// The `[kernel]` table.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelSection {
    /// Base name; variants are emitted as `untiled_<name>` and `tiled_<name>`.
    pub name: String,
    /// Emission target: "cpp" or "c".
    pub target: String,
    /// Symbol used for the tile width.
    pub tile_width: String,
    /// Whether `build` emits the tiled variant.
    pub tile: bool,
}

impl Default for KernelSection {
    fn default() -> Self {
        Self {
            name: "kernel".to_string(),
            target: "cpp".to_string(),
            tile_width: "T".to_string(),
            tile: true,
        }
    }
}

/// One `[tensors.<name>]` table.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TensorDecl {
    pub dtype: DType,
    pub shape: Vec<usize>,
    /// Optional; checked against the length of `shape`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl KernelConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            CompileError::Config { reason } => {
                CompileError::config(format!("{}: {}", path.display(), reason))
            }
            other => other,
        })?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, CompileError> {
        let config: KernelConfig = toml::from_str(content)
            .map_err(|e| CompileError::config(format!("TOML parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, CompileError> {
        toml::to_string_pretty(self)
            .map_err(|e| CompileError::config(format!("TOML serialise error: {}", e)))
    }

    /// Try to find a `tilec.toml` in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// An explicit path wins; otherwise search upward from the input's
    /// directory; otherwise use the defaults.
    pub fn resolve(explicit: Option<&Path>, input: &Path) -> Result<Self, CompileError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let start = match input.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        match Self::find(&start) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("no {} found above {}, using defaults", CONFIG_FILE, start.display());
                Ok(Self::default())
            }
        }
    }

    /// Check names, target and width. Run again after overriding fields.
    pub fn validate(&self) -> Result<(), CompileError> {
        if !is_ident(&self.kernel.name) {
            return Err(CompileError::config(format!(
                "kernel name '{}' is not an identifier",
                self.kernel.name
            )));
        }
        if create_target(&self.kernel.target).is_none() {
            return Err(unknown_target(&self.kernel.target));
        }
        if !is_ident(&self.kernel.tile_width) {
            return Err(CompileError::config(format!(
                "tile width '{}' is not an identifier",
                self.kernel.tile_width
            )));
        }
        if let Some(name) = self.tensors.keys().find(|name| !is_ident(name)) {
            return Err(CompileError::config(format!(
                "tensor name '{}' is not an identifier",
                name
            )));
        }
        Ok(())
    }

    /// Build the tensor registry the parser resolves accesses against.
    pub fn registry(&self) -> Result<TensorRegistry, CompileError> {
        let mut reg = TensorRegistry::new();
        if self.tensors.is_empty() {
            for name in DEFAULT_TENSORS {
                reg.register(name, DType::Float32, &[DEFAULT_EXTENT, DEFAULT_EXTENT])?;
            }
            return Ok(reg);
        }
        for (name, decl) in &self.tensors {
            let rank = decl.rank.unwrap_or(decl.shape.len());
            reg.register_ranked(name, decl.dtype, rank, &decl.shape)?;
        }
        Ok(reg)
    }

    pub fn tile_options(&self) -> TileOptions {
        TileOptions::new(self.kernel.tile_width.as_str())
    }

    pub fn target(&self) -> Result<Box<dyn KernelTarget>, CompileError> {
        create_target(&self.kernel.target).ok_or_else(|| unknown_target(&self.kernel.target))
    }
}

pub(crate) fn unknown_target(name: &str) -> CompileError {
    CompileError::config(format!(
        "unknown target '{}'; expected 'cpp' or 'c'",
        name
    ))
}
