pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod ir;
pub mod syntax;
pub mod tensor;
pub mod transform;

// Re-exports: short `tilec::X` paths used by the CLI and tests
pub use syntax::parser;
pub use syntax::span;

pub use codegen::{
    create_target, generate, generate_expr, generate_for, generate_kernel, generate_variants,
    KernelTarget,
};
pub use config::KernelConfig;
pub use error::{CompileError, ErrorKind};
pub use ir::hash::{hash_node, ContentHash};
pub use ir::{Access, Assign, ConstValue, Loop, Node, NodeKind};
pub use parser::parse;
pub use tensor::{DType, Tensor, TensorRegistry};
pub use transform::{tile, tile_with, TileOptions};

use diagnostic::Diagnostic;

/// The untiled tree of a kernel and, when requested, its tiled form.
#[derive(Clone, Debug)]
pub struct CompiledKernel {
    pub untiled: Node,
    pub tiled: Option<Node>,
}

impl CompiledKernel {
    /// Both variants as target source text.
    pub fn render(&self, kernel: &str, target: &dyn KernelTarget) -> String {
        generate_variants(kernel, &self.untiled, self.tiled.as_ref(), target)
    }
}

/// Parse `source`, then tile it when `tiling` is given.
pub fn compile(
    source: &str,
    registry: &TensorRegistry,
    tiling: Option<&TileOptions>,
) -> Result<CompiledKernel, CompileError> {
    let untiled = parse(source, registry)?;
    let tiled = match tiling {
        Some(options) => Some(tile_with(&untiled, options)?),
        None => None,
    };
    tracing::info!(
        "compiled kernel: {} loops untiled, {} tiled",
        untiled.count(NodeKind::Loop),
        tiled.as_ref().map_or(0, |t| t.count(NodeKind::Loop))
    );
    Ok(CompiledKernel { untiled, tiled })
}

/// Parse and render any error against the source.
pub fn parse_source(
    source: &str,
    filename: &str,
    registry: &TensorRegistry,
) -> Result<Node, Diagnostic> {
    parse(source, registry).map_err(|e| {
        let diag = e.to_diagnostic();
        diag.render(filename, source);
        diag
    })
}

/// Parse without rendering; the diagnostic is returned for the caller.
pub fn parse_source_silent(source: &str, registry: &TensorRegistry) -> Result<Node, Diagnostic> {
    parse(source, registry).map_err(|e| e.to_diagnostic())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD: &str = "LOOPS: i=0:N:1, j=0:M:1 BODY: C[i,j] = A[i,j] + B[i,j]";

    #[test]
    fn test_compile_both_variants() {
        let reg = KernelConfig::default().registry().unwrap();
        let kernel = compile(ADD, &reg, Some(&TileOptions::default())).unwrap();
        assert_eq!(kernel.untiled.loop_depth(), 2);
        assert_eq!(kernel.tiled.as_ref().map(Node::loop_depth), Some(4));

        let text = kernel.render("add", &codegen::CppTarget::new());
        assert!(text.contains("void untiled_add("));
        assert!(text.contains("void tiled_add("));
    }

    #[test]
    fn test_compile_without_tiling() {
        let reg = KernelConfig::default().registry().unwrap();
        let kernel = compile("LOOPS: i=0:N:1 BODY: C[i,i] = A[i,i]", &reg, None).unwrap();
        assert!(kernel.tiled.is_none());
        // A single loop cannot be tiled.
        let err = compile("LOOPS: i=0:N:1 BODY: C[i,i] = A[i,i]", &reg, Some(&TileOptions::default()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralPrecondition);
    }

    #[test]
    fn test_parse_source_returns_rendered_diagnostic() {
        let reg = KernelConfig::default().registry().unwrap();
        let source = "LOOPS: i=0:N BODY: C[i,i] = A[i,i]";
        let diag = parse_source(source, "bad.tile", &reg).unwrap_err();
        assert!(diag.message.starts_with("parse error:"));
        assert_eq!(diag, parse_source_silent(source, &reg).unwrap_err());

        let ok = parse_source("LOOPS: i=0:N:1 BODY: C[i,i] = A[i,i]", "ok.tile", &reg).unwrap();
        assert_eq!(ok.loop_depth(), 1);
    }

    #[test]
    fn test_parse_source_silent_reports_span() {
        let reg = KernelConfig::default().registry().unwrap();
        let source = "LOOPS: i=0:N:1 BODY: C[i,i] = Q[i,i]";
        let diag = parse_source_silent(source, &reg).unwrap_err();
        assert_eq!(diag.message, "unknown tensor 'Q'");
        let at = source.find('Q').unwrap() as u32;
        assert_eq!(diag.span, span::Span::new(at, at + 1));
    }
}
