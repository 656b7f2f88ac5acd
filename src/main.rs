use clap::Parser;

use sortify::cli::{Cli, run};
use sortify::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        OutputFormatter::error(&message);
        std::process::exit(1);
    }
}
