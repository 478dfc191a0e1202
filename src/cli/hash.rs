use std::path::PathBuf;

use clap::Args;

use super::load_input;

#[derive(Args)]
pub struct HashArgs {
    /// Input DSL file
    pub input: PathBuf,
    /// Show full 256-bit hashes instead of short form
    #[arg(long)]
    pub full: bool,
    /// Configuration file (default: nearest tilec.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_hash(args: HashArgs) {
    let HashArgs {
        input,
        full,
        config,
    } = args;
    let loaded = load_input(&input, config.as_deref());
    let untiled = loaded.parse();

    let mut rows = vec![("untiled", tilec::hash_node(&untiled))];
    if loaded.config.kernel.tile {
        rows.push(("tiled", tilec::hash_node(&loaded.tile(&untiled))));
    }

    eprintln!("File: {}", input.display());
    for (variant, hash) in rows {
        if full {
            println!("  {} {}", hash.to_hex(), variant);
        } else {
            println!("  {} {}", hash, variant);
        }
    }
}
