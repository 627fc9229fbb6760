//! Configuration for key resolution.
//!
//! [`ScannerConfig`] describes the fallback tool: what to run, which labels
//! mark the key row in its output, how to decode that output and how long to
//! wait for it. [`ResolveOptions`] toggles the fallback path as a whole.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::constants::{fallback, timeouts};

/// Text encoding of the fallback tool's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputEncoding {
    /// UTF-8. Invalid sequences are replaced with `U+FFFD`.
    #[default]
    Utf8,
    /// The console OEM code page (e.g. 932 on Japanese Windows).
    /// Decoded as UTF-8 on platforms without code pages.
    OemCodePage,
}

/// How to run and parse the fallback tool.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use wlkeys::ScannerConfig;
///
/// let config = ScannerConfig::netsh()
///     .with_label("Contenu de la clé")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.labels.len(), 3);
/// assert_eq!(config.args_for("Home"), vec!["wlan", "show", "profile", "name=Home", "key=clear"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Executable to launch.
    pub program: String,
    /// Argument templates. Each `{profile}` is replaced with the profile name.
    pub args: Vec<String>,
    /// Candidate labels for the key row, tried in order on each line.
    pub labels: Vec<String>,
    /// Values the tool prints in place of a secret it cannot show. A key
    /// row carrying one of these counts as no key.
    #[serde(default)]
    pub placeholders: Vec<String>,
    /// Output decoding.
    pub encoding: OutputEncoding,
    /// Maximum run time before the tool is killed.
    pub timeout: Duration,
}

impl ScannerConfig {
    /// `netsh wlan show profile name=<profile> key=clear`, English and
    /// Japanese labels, OEM code page output.
    pub fn netsh() -> Self {
        Self {
            program: fallback::netsh::PROGRAM.to_string(),
            args: to_owned_vec(fallback::netsh::ARGS),
            labels: to_owned_vec(fallback::netsh::LABELS),
            placeholders: to_owned_vec(fallback::netsh::PLACEHOLDERS),
            encoding: OutputEncoding::OemCodePage,
            timeout: timeouts::scanner_timeout(),
        }
    }

    /// `nmcli --show-secrets connection show id <profile>`, UTF-8 output.
    pub fn nmcli() -> Self {
        Self {
            program: fallback::nmcli::PROGRAM.to_string(),
            args: to_owned_vec(fallback::nmcli::ARGS),
            labels: to_owned_vec(fallback::nmcli::LABELS),
            placeholders: to_owned_vec(fallback::nmcli::PLACEHOLDERS),
            encoding: OutputEncoding::Utf8,
            timeout: timeouts::scanner_timeout(),
        }
    }

    /// The default for the current platform.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::netsh()
        } else {
            Self::nmcli()
        }
    }

    /// Appends a candidate label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Replaces the candidate labels.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the program and its argument templates.
    #[must_use]
    pub fn with_command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the placeholder values.
    #[must_use]
    pub fn with_placeholders<I, S>(mut self, placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholders = placeholders.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the output decoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the maximum run time.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns true if `value` is one of the tool's placeholders.
    pub fn is_placeholder(&self, value: &str) -> bool {
        self.placeholders.iter().any(|p| p == value)
    }

    /// Expands the argument templates for one profile.
    pub fn args_for(&self, profile: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(fallback::PROFILE_PLACEHOLDER, profile))
            .collect()
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::platform_default()
    }
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Options for a resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Try the fallback tool when the structured query yields nothing.
    pub fallback: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { fallback: true }
    }
}

impl ResolveOptions {
    /// Options with the fallback tool disabled.
    pub fn structured_only() -> Self {
        Self { fallback: false }
    }
}
