use std::process;

use subscan::app::App;
use subscan::cli::Cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();
    init_tracing(&cli);

    let code = match App::run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            if cli.error_enabled() {
                eprintln!("Error: {e}");
            }
            e.exit_code()
        }
    };
    process::exit(code);
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins
/// over `--verbose`.
fn init_tracing(cli: &Cli) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
