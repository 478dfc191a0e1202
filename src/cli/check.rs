use std::path::PathBuf;

use clap::Args;

use super::load_input;

#[derive(Args)]
pub struct CheckArgs {
    /// Input DSL file
    pub input: PathBuf,
    /// Configuration file (default: nearest tilec.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs { input, config } = args;
    let loaded = load_input(&input, config.as_deref());
    let root = loaded.parse();
    if loaded.config.kernel.tile {
        loaded.tile(&root);
    }
    eprintln!("OK: {}", input.display());
}
