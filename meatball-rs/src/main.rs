use std::process::ExitCode;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use meatball::cli::{self, USAGE};
use meatball::config::RunConfig;
use meatball::preprocess::Preprocessor;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("meatball: {e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    init_tracing(args.debug);
    let config = RunConfig::from(args);

    match run(&config) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("meatball: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `MEATBALL_LOG` (default `warn`, or `debug`
/// with `-d`).
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MEATBALL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(config: &RunConfig) -> Result<String, Box<dyn std::error::Error>> {
    let mut context = config.load_context()?;
    let text = config.read_input()?;
    let processed = Preprocessor::default().process_yaml(&text, &mut context)?;
    Ok(config.render(&processed)?)
}
