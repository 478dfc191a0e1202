mod cli;

use clap::{ArgAction, Parser, Subcommand};

use cli::build::BuildArgs;
use cli::check::CheckArgs;
use cli::hash::HashArgs;
use cli::view::ViewArgs;

#[derive(Parser)]
#[command(
    name = "tilec",
    version,
    about = "tilec: loop-nest kernel compiler with symbolic tiling"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a DSL file to untiled and tiled kernels
    Build(BuildArgs),
    /// Parse and check tiling preconditions without emitting code
    Check(CheckArgs),
    /// Print the IR tree of a DSL file
    View(ViewArgs),
    /// Show content hashes of the untiled and tiled trees (BLAKE3)
    Hash(HashArgs),
}

fn main() {
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::View(args) => cli::view::cmd_view(args),
        Command::Hash(args) => cli::hash::cmd_hash(args),
    }
}
