use anyhow::Context;
use printview::cli::{self, CliArgs};
use printview::init_logging;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let args = CliArgs::parse(std::env::args().skip(1)).context("Invalid arguments")?;
    let stdout = std::io::stdout();
    cli::run(&args, &mut stdout.lock())
}
