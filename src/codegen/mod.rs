//! Code generation: IR tree → kernel source text.
//!
//! Rendering is total. Node kinds that cannot appear where they are found
//! (a loop used as a value, a load used as a statement) produce a visible
//! placeholder comment instead of an error, so every tree the parser or
//! the tiling pass hands over turns into text.
//!
//! Emission targets differ only in spelling: the min call, tensor element
//! access, data parameters, and the include preamble. Everything else is
//! shared and lives here.

mod c;
mod cpp;

use crate::ir::{Access, ConstValue, Node};
use crate::tensor::Tensor;

pub use c::CTarget;
pub use cpp::CppTarget;

const INDENT: &str = "    ";
const BANNER: &str = "======================================================";

// ─── Targets ───────────────────────────────────────────────────────

/// Spelling rules of one output language.
pub trait KernelTarget {
    /// Short name used on the command line (e.g. "cpp", "c").
    fn target_name(&self) -> &str;

    /// Human-readable language name for banners.
    fn language(&self) -> &str;

    /// Lines emitted before each kernel.
    fn preamble(&self) -> &[&str];

    /// A two-argument minimum.
    fn min_call(&self, lhs: &str, rhs: &str) -> String;

    /// Element access with already rendered index expressions.
    fn access(&self, tensor: &Tensor, indices: &[String]) -> String;

    /// One tensor data parameter of the kernel signature.
    fn data_param(&self, tensor: &Tensor) -> String {
        format!("{} *{}", tensor.dtype().c_type(), tensor.name())
    }
}

/// Look up an emission target by name.
pub fn create_target(name: &str) -> Option<Box<dyn KernelTarget>> {
    match name {
        "cpp" | "c++" | "cxx" => Some(Box::new(CppTarget::new())),
        "c" | "c99" => Some(Box::new(CTarget::new())),
        _ => None,
    }
}

// ─── Entry points ──────────────────────────────────────────────────

/// Render a loop nest with the default C++ target at depth 0.
pub fn generate(root: &Node) -> String {
    generate_for(root, &CppTarget::new())
}

/// Render a loop nest with `target` at depth 0.
pub fn generate_for(root: &Node, target: &dyn KernelTarget) -> String {
    let mut emitter = Emitter::new(target);
    emitter.stmt(root, 0);
    emitter.finish()
}

/// Render an expression with the default C++ target.
pub fn generate_expr(node: &Node) -> String {
    Emitter::new(&CppTarget::new()).expr(node)
}

/// Render an expression with `target`.
pub fn generate_expr_for(node: &Node, target: &dyn KernelTarget) -> String {
    Emitter::new(target).expr(node)
}

/// A complete kernel: preamble, doc comment, signature, the nest at depth 1,
/// and a commented-out usage stub.
///
/// Parameters are one pointer per referenced tensor, then one per free
/// symbol, both in name order. Symbols in loop bounds or steps (problem
/// sizes, the tile width) are `int`; scalars used only in values take the
/// element type of the stored tensor.
pub fn generate_kernel(name: &str, root: &Node, target: &dyn KernelTarget) -> String {
    let mut params: Vec<String> = root
        .tensors()
        .iter()
        .map(|t| target.data_param(t))
        .collect();
    let extents = root.extent_symbols();
    let scalar_type = root
        .store_tensor()
        .map_or("int", |t| t.dtype().c_type());
    params.extend(root.free_symbols().iter().map(|s| {
        let ty = if extents.contains(s) { "int" } else { scalar_type };
        format!("{} {}", ty, s)
    }));
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };

    let mut emitter = Emitter::new(target);
    for line in target.preamble() {
        emitter.line(0, line);
    }
    emitter.blank();
    emitter.line(0, "/**");
    emitter.line(0, &format!(" * Generated kernel: {}", name));
    emitter.line(0, " */");
    emitter.line(0, &format!("void {}({}) {{", name, params));
    emitter.stmt(root, 1);
    emitter.line(0, "}");
    emitter.blank();
    emitter.line(0, "/*");
    emitter.line(0, "int main() {");
    emitter.line(
        1,
        "// Example usage requires initializing tensors and calling the kernel",
    );
    emitter.line(1, "return 0;");
    emitter.line(0, "}");
    emitter.line(0, "*/");
    emitter.finish()
}

/// Both variants of a kernel, each under a banner: `untiled_<kernel>`, then
/// `tiled_<kernel>` when a tiled tree is given.
pub fn generate_variants(
    kernel: &str,
    untiled: &Node,
    tiled: Option<&Node>,
    target: &dyn KernelTarget,
) -> String {
    let mut variants = vec![("untiled", untiled)];
    if let Some(tiled) = tiled {
        variants.push(("tiled", tiled));
    }

    let mut out = String::new();
    for (i, (variant, root)) in variants.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(BANNER);
        out.push('\n');
        out.push_str(&format!(
            ">>> GENERATED {} CODE: {} {} KERNEL <<<\n",
            target.language(),
            variant,
            kernel
        ));
        out.push_str(BANNER);
        out.push_str("\n\n");
        out.push_str(&generate_kernel(
            &format!("{}_{}", variant, kernel),
            root,
            target,
        ));
    }
    tracing::debug!(
        "generated {} bytes of {} for kernel {}",
        out.len(),
        target.target_name(),
        kernel
    );
    out
}

// ─── Emitter ───────────────────────────────────────────────────────

struct Emitter<'t> {
    target: &'t dyn KernelTarget,
    output: Vec<String>,
}

impl<'t> Emitter<'t> {
    fn new(target: &'t dyn KernelTarget) -> Self {
        Self {
            target,
            output: Vec::new(),
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        self.output.push(format!("{}{}", INDENT.repeat(depth), text));
    }

    fn blank(&mut self) {
        self.output.push(String::new());
    }

    fn finish(self) -> String {
        let mut out = self.output.join("\n");
        out.push('\n');
        out
    }

    fn stmt(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Loop(l) => {
                let lower = self.expr(&l.lower);
                let upper = self.expr(&l.upper);
                let step = self.expr(&l.step);
                self.line(
                    depth,
                    &format!(
                        "for (int {i} = {}; {i} < {}; {i} += {}) {{",
                        lower,
                        upper,
                        step,
                        i = l.index
                    ),
                );
                for child in &l.body {
                    self.stmt(child, depth + 1);
                }
                self.line(depth, "}");
            }
            Node::Assign(a) => {
                let target = match a.target() {
                    Node::Store(access) => self.access(access),
                    Node::Variable(name) => name.clone(),
                    other => placeholder("assignment target", other),
                };
                let value = self.expr(a.value());
                self.line(depth, &format!("{} = {};", target, value));
            }
            other => {
                let text = placeholder("statement", other);
                self.line(depth, &text);
            }
        }
    }

    fn expr(&self, node: &Node) -> String {
        match node {
            Node::Const(c) => literal(c),
            Node::Variable(name) => name.clone(),
            Node::Add(lhs, rhs) => format!("({} + {})", self.expr(lhs), self.expr(rhs)),
            Node::Mul(lhs, rhs) => format!("({} * {})", self.expr(lhs), self.expr(rhs)),
            Node::Min(lhs, rhs) => self.target.min_call(&self.expr(lhs), &self.expr(rhs)),
            Node::Load(access) => self.access(access),
            Node::Loop(_) | Node::Store(_) | Node::Assign(_) => placeholder("expression", node),
        }
    }

    fn access(&self, access: &Access) -> String {
        let indices: Vec<String> = access.indices.iter().map(|i| self.expr(i)).collect();
        self.target.access(&access.tensor, &indices)
    }
}

fn placeholder(position: &str, node: &Node) -> String {
    format!("/* invalid {}: {} */", position, node.kind())
}

/// Numeric literal spelling shared by the C-family targets.
fn literal(value: &ConstValue) -> String {
    match *value {
        ConstValue::I32(v) => v.to_string(),
        ConstValue::I64(v) => format!("{}LL", v),
        ConstValue::F32(v) => float_literal(v as f64, format!("{:?}", v), "f"),
        ConstValue::F64(v) => float_literal(v, format!("{:?}", v), ""),
    }
}

fn float_literal(value: f64, debug: String, suffix: &str) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INFINITY" } else { "-INFINITY" }.to_string();
    }
    let mut text = debug;
    if !text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        text.push_str(".0");
    }
    text.push_str(suffix);
    text
}
