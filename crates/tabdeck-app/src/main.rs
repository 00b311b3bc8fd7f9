mod cli;
mod protocol;
mod session;

use tabdeck_config::TabdeckConfig;
use tabdeck_core::Desktop;
use tabdeck_host::HeadlessHost;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::session::Session;

const DEFAULT_LOG_DIRECTIVE: &str = "tabdeck=info";

fn load_config(args: &cli::Args) -> (TabdeckConfig, Option<String>) {
    let loaded = match &args.config {
        Some(path) => tabdeck_config::load_config_from(path),
        None => tabdeck_config::load_config(),
    };
    match loaded {
        Ok(config) => (config, None),
        Err(e) => (TabdeckConfig::default(), Some(e.to_string())),
    }
}

// stdout carries the protocol, so logs go to stderr.
fn init_logging(directive: &str) {
    let directive: Result<Directive, _> = directive
        .parse()
        .or_else(|_| DEFAULT_LOG_DIRECTIVE.parse());
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: cli::Args, config: TabdeckConfig) -> tabdeck_common::Result<()> {
    let mut session = Session::new(Desktop::new(config, HeadlessHost::new()));
    tracing::debug!(
        "Effective config: {}",
        tabdeck_config::config_to_json(session.desktop().config())
    );

    let window = session.open_initial_window(args.url.as_deref())?;
    tracing::info!(window_id = %window, "initial window ready");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin, tokio::io::stdout()).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli::parse();
    let (config, config_error) = load_config(&args);

    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&directive);

    tracing::info!("Tabdeck v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    if let Some(e) = config_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    if let Err(e) = run(args, config).await {
        tracing::error!("Tabdeck stopped: {e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
