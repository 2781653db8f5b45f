use clap::{CommandFactory, Parser};
use icescan::cli::Cli;
use icescan::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&err.to_string());
            if err.wants_usage() {
                eprintln!();
                eprintln!("{}", Cli::command().render_usage());
            }
            ExitCode::from(err.exit_code())
        }
    }
}
