use std::path::PathBuf;

use clap::Parser;

/// Tabdeck: multi-window tab orchestration over a stdio bridge.
#[derive(Parser, Debug)]
#[command(name = "tabdeck", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. `tabdeck=debug`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// URL to open as the first tab once the tab strip is ready.
    #[arg(short = 'u', long)]
    pub url: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = Args::parse_from([
            "tabdeck",
            "--config",
            "/tmp/tabdeck.toml",
            "--log-level",
            "tabdeck=debug",
            "-u",
            "https://a",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/tabdeck.toml")));
        assert_eq!(args.log_level.as_deref(), Some("tabdeck=debug"));
        assert_eq!(args.url.as_deref(), Some("https://a"));
    }

    #[test]
    fn everything_is_optional() {
        let args = Args::parse_from(["tabdeck"]);
        assert!(args.config.is_none());
        assert!(args.url.is_none());
    }
}
