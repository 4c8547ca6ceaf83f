use clap::Parser;
use kitsune_dazscene::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    kitsune_dazscene::run(cli)
}
