use anyhow::Result;
use clap::Parser;

use editor_sync::cli::CliArgs;

fn main() -> Result<()> {
    editor_sync::tracing::init();

    let args = CliArgs::parse();
    let stdout = std::io::stdout();
    args.run(&mut stdout.lock())
}
