use std::io::Write;
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use volley::config::parser::RawConfig;
use volley::metrics::presenter_for;
use volley::errors::ErrorContext;
use volley::{Config, Coordinator, HttpTransport, Result};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application failed: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let raw_config = RawConfig::parse_from_args()?;

    // Logging comes up before validation so configuration errors are visible
    init_logging(raw_config.verbose);

    let config = Config::from_raw(raw_config)?;

    info!("🏐 Volley - HTTP Load Generator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if config.output.format == volley::config::ReportFormat::Text {
        config.print_summary();
    }

    let transport = HttpTransport::new(config.load.timeout)?;
    let presenter = presenter_for(config.output.format);

    let summary = Coordinator::new(config, Arc::new(transport))?
        .with_signal_handling()
        .run()
        .await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    presenter.present(&summary, &mut out)?;
    out.flush().with_execution_context("Failed to write report")?;

    Ok(())
}

/// Initialize logging based on verbosity; logs go to stderr, the report to stdout
fn init_logging(verbose: bool) {
    let volley_level = if verbose { "debug" } else { "info" };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(
                    format!("volley={}", volley_level)
                        .parse()
                        .expect("Invalid filter directive"),
                )
                .add_directive("reqwest=warn".parse().expect("Invalid filter directive"))
                .add_directive("hyper=warn".parse().expect("Invalid filter directive")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default subscriber");

    if verbose {
        info!("Verbose logging enabled");
    }
}
