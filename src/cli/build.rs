use std::path::PathBuf;
use std::process;

use clap::Args;

use super::load_input;

#[derive(Args)]
pub struct BuildArgs {
    /// Input DSL file
    pub input: PathBuf,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Emission target: cpp or c (default: from tilec.toml, else cpp)
    #[arg(long)]
    pub target: Option<String>,
    /// Kernel base name (default: from tilec.toml, else "kernel")
    #[arg(long)]
    pub name: Option<String>,
    /// Emit only the untiled variant
    #[arg(long)]
    pub no_tile: bool,
    /// Tile-width symbol (default: from tilec.toml, else T)
    #[arg(long, value_name = "SYMBOL")]
    pub tile_width: Option<String>,
    /// Configuration file (default: nearest tilec.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        input,
        output,
        target,
        name,
        no_tile,
        tile_width,
        config,
    } = args;
    let mut loaded = load_input(&input, config.as_deref());
    if let Some(target) = target {
        loaded.config.kernel.target = target;
    }
    if let Some(name) = name {
        loaded.config.kernel.name = name;
    }
    if let Some(width) = tile_width {
        loaded.config.kernel.tile_width = width;
    }
    if no_tile {
        loaded.config.kernel.tile = false;
    }
    if let Err(e) = loaded.config.validate() {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    let target = match loaded.config.target() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let untiled = loaded.parse();
    let tiled = if loaded.config.kernel.tile {
        Some(loaded.tile(&untiled))
    } else {
        None
    };
    let kernel = tilec::CompiledKernel { untiled, tiled };
    let code = kernel.render(&loaded.config.kernel.name, target.as_ref());

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, &code) {
                eprintln!("error: cannot write '{}': {}", path.display(), e);
                process::exit(1);
            }
            eprintln!("Compiled -> {}", path.display());
        }
        None => print!("{}", code),
    }
}
