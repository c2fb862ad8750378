mod args;
mod commands;

use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::args::{ENV_LOG, print_usage};
use crate::commands::App;

fn init_logging() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();

    let invocation = match args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    let result = App::open(&invocation.config).and_then(|mut app| {
        let stdin = io::stdin();
        let stdout = io::stdout();
        commands::run(
            &mut app,
            invocation.command,
            &mut stdin.lock(),
            &mut stdout.lock(),
        )
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
