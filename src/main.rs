/// Bridgemon - Main entry point
///
/// Single-shot invocation: the host scheduler fires the binary, one
/// tick runs to a terminal state, and the exit code reports the
/// outcome (0 equal, 10 tripped, 20 sampler failure, 21 signer or
/// broadcast failure, 22 config or secret failure).
use clap::Parser;
use tracing::{error, info};

use bridgemon::secrets::EnvSecretStore;
use bridgemon::{init_logging, tick, MonitorConfig};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config/monitor.yaml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

const EXIT_CONFIG: i32 = 22;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("failed to initialize logging: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    // Local development convenience; the production host injects the
    // environment directly.
    dotenv::dotenv().ok();

    let code = run(&cli).await;
    std::process::exit(code);
}

async fn run(cli: &Cli) -> i32 {
    let cfg = match MonitorConfig::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "cannot load configuration");
            return EXIT_CONFIG;
        }
    };

    info!(
        home = cfg.home_label(),
        remote = cfg.remote_label(),
        breaker_side = %cfg.breaker_side,
        "bridgemon v{} tick starting",
        bridgemon::version::VERSION
    );

    let store = EnvSecretStore::new();
    match tick::run_tick(&cfg, &store).await {
        Ok(outcome) => {
            info!(
                outcome = outcome.as_str(),
                exit_code = outcome.exit_code(),
                "tick complete"
            );
            outcome.exit_code()
        }
        Err(failure) => {
            error!(
                phase = ?failure.phase,
                error = %failure.source,
                exit_code = failure.exit_code(),
                "tick failed"
            );
            failure.exit_code()
        }
    }
}
