use std::io;
use std::process;

use tracing_subscriber::EnvFilter;

use lineage::{ArgumentList, Bootstrap, DEFAULT_CONFIG_FILE};

fn main() {
    // Logs go to stderr; stdout carries only the configuration dump.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = ArgumentList::capture();
    let bootstrap = Bootstrap::new(DEFAULT_CONFIG_FILE);

    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();
    let result = bootstrap.run(&args, &mut out, &mut err, None);
    drop(out);
    drop(err);

    match result {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
