//! Optional TOML configuration file.
//!
//! Looked up at `<config dir>/wlkeys/config.toml` unless a path is given on
//! the command line. Every field is optional:
//!
//! ```toml
//! fallback = true
//! timeout_secs = 5
//! program = "netsh"
//! args = ["wlan", "show", "profile", "name={profile}", "key=clear"]
//! labels = ["Key Content"]
//! extra_labels = ["Contenu de la clé", "Schlüsselinhalt"]
//! placeholders = ["--"]
//! encoding = "oem-code-page"
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wlkeys::{OutputEncoding, ResolveOptions, ScannerConfig};

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Run the fallback tool when the profile store yields nothing.
    pub fallback: Option<bool>,
    /// Fallback tool timeout.
    pub timeout_secs: Option<u64>,
    /// Fallback tool executable.
    pub program: Option<String>,
    /// Fallback tool arguments; `{profile}` is replaced with the profile name.
    pub args: Option<Vec<String>>,
    /// Replaces the default key labels.
    pub labels: Option<Vec<String>>,
    /// Appended to the key labels.
    pub extra_labels: Vec<String>,
    /// Replaces the values that stand in for a withheld key.
    pub placeholders: Option<Vec<String>>,
    /// Fallback tool output encoding.
    pub encoding: Option<OutputEncoding>,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push("wlkeys");
        path.push("config.toml");
        path
    })
}

/// Loads the configuration file.
///
/// A missing default file yields the empty configuration; an explicit path
/// that cannot be read is an error.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<FileConfig> {
    match explicit {
        Some(path) => read(path),
        None => match default_config_path() {
            Some(path) if path.is_file() => read(&path),
            _ => Ok(FileConfig::default()),
        },
    }
}

fn read(path: &Path) -> anyhow::Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

impl FileConfig {
    /// Applies the file settings on top of the given defaults.
    pub fn apply(
        &self,
        mut scanner: ScannerConfig,
        mut options: ResolveOptions,
    ) -> (ScannerConfig, ResolveOptions) {
        if let Some(fallback) = self.fallback {
            options.fallback = fallback;
        }
        if let Some(secs) = self.timeout_secs {
            scanner = scanner.with_timeout(Duration::from_secs(secs));
        }
        if let Some(program) = &self.program {
            scanner.program = program.clone();
        }
        if let Some(args) = &self.args {
            scanner.args = args.clone();
        }
        if let Some(labels) = &self.labels {
            scanner = scanner.with_labels(labels.iter().cloned());
        }
        for label in &self.extra_labels {
            scanner = scanner.with_label(label.clone());
        }
        if let Some(placeholders) = &self.placeholders {
            scanner = scanner.with_placeholders(placeholders.iter().cloned());
        }
        if let Some(encoding) = self.encoding {
            scanner = scanner.with_encoding(encoding);
        }
        (scanner, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
fallback = false
timeout_secs = 3
extra_labels = ["Contenu de la clé"]
encoding = "utf8"
"#
        )
        .unwrap();

        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.fallback, Some(false));
        assert_eq!(config.timeout_secs, Some(3));
        assert_eq!(config.extra_labels, vec!["Contenu de la clé"]);
        assert_eq!(config.encoding, Some(OutputEncoding::Utf8));
        assert_eq!(config.labels, None);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "labelz = [\"typo\"]").unwrap();
        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn test_apply_overrides_defaults() {
        let config = FileConfig {
            fallback: Some(false),
            timeout_secs: Some(2),
            program: Some("sh".into()),
            args: Some(vec!["-c".into(), "echo {profile}".into()]),
            labels: Some(vec!["Key".into()]),
            extra_labels: vec!["Clé".into()],
            placeholders: Some(vec!["(hidden)".into()]),
            encoding: Some(OutputEncoding::OemCodePage),
        };

        let (scanner, options) =
            config.apply(ScannerConfig::nmcli(), ResolveOptions::default());

        assert!(!options.fallback);
        assert_eq!(scanner.timeout, Duration::from_secs(2));
        assert_eq!(scanner.program, "sh");
        assert_eq!(scanner.args_for("x"), vec!["-c", "echo x"]);
        assert_eq!(scanner.labels, vec!["Key", "Clé"]);
        assert_eq!(scanner.encoding, OutputEncoding::OemCodePage);
        assert!(scanner.is_placeholder("(hidden)"));
        assert!(!scanner.is_placeholder("--"));
    }

    #[test]
    fn test_apply_empty_keeps_defaults() {
        let (scanner, options) =
            FileConfig::default().apply(ScannerConfig::netsh(), ResolveOptions::default());
        assert_eq!(scanner, ScannerConfig::netsh());
        assert_eq!(options, ResolveOptions::default());
    }
}
