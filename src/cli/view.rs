use std::path::PathBuf;

use clap::Args;

use super::load_input;

#[derive(Args)]
pub struct ViewArgs {
    /// Input DSL file
    pub input: PathBuf,
    /// Show the tiled tree instead of the parsed one
    #[arg(long)]
    pub tiled: bool,
    /// Configuration file (default: nearest tilec.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_view(args: ViewArgs) {
    let ViewArgs {
        input,
        tiled,
        config,
    } = args;
    let loaded = load_input(&input, config.as_deref());
    let root = loaded.parse();
    let shown = if tiled { loaded.tile(&root) } else { root };

    eprintln!("Hash: {}", tilec::hash_node(&shown));
    print!("{}", shown);
}
