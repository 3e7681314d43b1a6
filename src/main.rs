use clap::Parser;

use fanscore::cli::{Cli, Output};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(cli.verbose > 0, cli.quiet);

    if let Err(e) = cli.run().await {
        output.error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
