pub mod config;
pub mod output;

use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use wlkeys::{KeyFinder, ReportFilter, ResolveOptions, ScannerConfig};

use crate::config::FileConfig;
use crate::output::{render_json, render_text};

/// List saved Wi-Fi profiles and their pre-shared keys.
///
/// Run as Administrator (Windows) or root (Linux) to read more keys.
#[derive(Parser, Debug)]
#[command(name = "wlkeys")]
#[command(version, about)]
struct Args {
    /// Only interfaces whose description or id contains TEXT (case-insensitive)
    #[arg(short, long, value_name = "TEXT")]
    interface: Option<String>,

    /// Only the profile with this exact name
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Show which strategy produced each key
    #[arg(long)]
    show_source: bool,

    /// Never run the fallback tool
    #[arg(long)]
    no_fallback: bool,

    /// Fallback tool timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Additional key label to look for in the fallback tool's output (repeatable)
    #[arg(long = "label", value_name = "TEXT")]
    labels: Vec<String>,

    /// Config file (default: <config dir>/wlkeys/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn filter(&self) -> ReportFilter {
        ReportFilter {
            interface: self.interface.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// Merges platform defaults, the config file and command-line flags, in
/// that order of precedence.
fn settings(args: &Args, file: &FileConfig) -> (ScannerConfig, ResolveOptions) {
    let (mut scanner, mut options) =
        file.apply(ScannerConfig::platform_default(), ResolveOptions::default());

    if args.no_fallback {
        options.fallback = false;
    }
    if let Some(secs) = args.timeout {
        scanner = scanner.with_timeout(Duration::from_secs(secs));
    }
    for label in &args.labels {
        scanner = scanner.with_label(label.clone());
    }

    (scanner, options)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

pub fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let file = config::load(args.config.as_deref())?;
    let (scanner, options) = settings(&args, &file);
    let filter = args.filter();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let reports = runtime.block_on(async {
        let finder = KeyFinder::with_config(scanner, options)
            .await
            .context("failed to open the wireless profile store")?;
        finder
            .report(&filter)
            .await
            .context("failed to enumerate wireless interfaces")
    })?;

    if args.json {
        println!("{}", render_json(&reports)?);
    } else {
        print!("{}", render_text(&reports, args.show_source));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["wlkeys"]).unwrap();
        assert!(!args.json);
        assert!(!args.no_fallback);
        assert!(args.labels.is_empty());
        assert!(args.filter().is_empty());
    }

    #[test]
    fn test_parse_filters_and_labels() {
        let args = Args::try_parse_from([
            "wlkeys",
            "-i",
            "wlan0",
            "--profile",
            "Home",
            "--label",
            "Contenu de la clé",
            "--label",
            "Schlüsselinhalt",
            "-vv",
        ])
        .unwrap();

        let filter = args.filter();
        assert_eq!(filter.interface.as_deref(), Some("wlan0"));
        assert_eq!(filter.profile.as_deref(), Some("Home"));
        assert_eq!(args.labels.len(), 2);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_settings_cli_overrides_file() {
        let args = Args::try_parse_from([
            "wlkeys",
            "--no-fallback",
            "--timeout",
            "7",
            "--label",
            "Extra",
        ])
        .unwrap();
        let file = FileConfig {
            fallback: Some(true),
            timeout_secs: Some(1),
            labels: Some(vec!["Base".into()]),
            ..Default::default()
        };

        let (scanner, options) = settings(&args, &file);

        assert!(!options.fallback);
        assert_eq!(scanner.timeout, Duration::from_secs(7));
        assert_eq!(scanner.labels, vec!["Base", "Extra"]);
    }

    #[test]
    fn test_settings_defaults_follow_platform() {
        let args = Args::try_parse_from(["wlkeys"]).unwrap();
        let (scanner, options) = settings(&args, &FileConfig::default());
        assert_eq!(scanner, ScannerConfig::platform_default());
        assert!(options.fallback);
    }
}
