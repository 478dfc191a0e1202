pub mod build;
pub mod check;
pub mod hash;
pub mod view;

use std::path::{Path, PathBuf};
use std::process;

use tilec::{CompileError, KernelConfig, Node, TensorRegistry};
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` overrides the `-v` count.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// A DSL file with the configuration that applies to it.
pub struct LoadedInput {
    pub path: PathBuf,
    pub source: String,
    pub config: KernelConfig,
    pub registry: TensorRegistry,
}

impl LoadedInput {
    pub fn filename(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Parse the program, exiting with a rendered diagnostic on failure.
    pub fn parse(&self) -> Node {
        match tilec::parse_source(&self.source, &self.filename(), &self.registry) {
            Ok(root) => root,
            Err(_) => process::exit(1),
        }
    }

    /// Tile with the configured width, exiting on a precondition failure.
    pub fn tile(&self, root: &Node) -> Node {
        match tilec::tile_with(root, &self.config.tile_options()) {
            Ok(tiled) => tiled,
            Err(e) => exit_with(&e, self),
        }
    }
}

/// Read the input and resolve its configuration, exiting on error.
pub fn load_input(input: &Path, config: Option<&Path>) -> LoadedInput {
    let source = match std::fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", input.display(), e);
            process::exit(1);
        }
    };
    let config = match KernelConfig::resolve(config, input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    let registry = match config.registry() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    LoadedInput {
        path: input.to_path_buf(),
        source,
        config,
        registry,
    }
}

/// Render `err` against the input source and exit.
pub fn exit_with(err: &CompileError, input: &LoadedInput) -> ! {
    err.to_diagnostic().render(&input.filename(), &input.source);
    process::exit(1);
}
