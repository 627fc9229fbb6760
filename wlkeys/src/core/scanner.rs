//! Fallback key lookup through an external command-line tool.
//!
//! The tool (`netsh` on Windows, `nmcli` on Linux) prints a human-oriented
//! report for one profile. The only shape relied on is "label, then a colon,
//! then the value on the same line":
//!
//! ```text
//! Security settings
//! -----------------
//!     Authentication         : WPA2-Personal
//!     Key Content            : hunter2
//! ```
//!
//! Labels are matched case-insensitively, first label in configuration order
//! wins on a line, and scanning stops at the first line that carries any
//! label, whether or not a value could be cut from it. A value equal to one
//! of the tool's placeholders (`--` from nmcli) is not a key.

use async_trait::async_trait;
use log::{debug, warn};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::api::config::{OutputEncoding, ScannerConfig};
use crate::core::text::{find_folded, trim};
use crate::{KeyError, Result};

/// A fallback strategy for reading one profile's key.
#[async_trait]
pub trait CredentialScanner: Send + Sync {
    /// Looks up the key for `profile`.
    ///
    /// The returned value is trimmed but may be empty if the tool printed a
    /// label and colon with nothing after it.
    async fn scan(&self, profile: &str) -> Result<String>;
}

/// Outcome of checking one output line.
#[derive(Debug, PartialEq, Eq)]
enum LineMatch {
    /// No label on this line.
    Miss,
    /// A label followed by a colon; carries the trimmed value.
    Value(String),
    /// A label with no colon after it.
    NoColon,
}

fn match_line(line: &str, labels: &[String]) -> LineMatch {
    let Some((label_start, _)) = labels.iter().find_map(|label| find_folded(line, label)) else {
        return LineMatch::Miss;
    };

    match line[label_start..].find(':') {
        Some(offset) => {
            let value_start = label_start + offset + ':'.len_utf8();
            LineMatch::Value(trim(&line[value_start..]).to_string())
        }
        None => LineMatch::NoColon,
    }
}

/// Finds the key value in a tool's output lines.
///
/// Stops at the first line carrying any of `labels`. Returns `LabelNotFound`
/// if no line does, and `NoColonAfterLabel` if the first labelled line has
/// no colon after the label.
pub fn find_credential<'a, I>(lines: I, labels: &[String]) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    for line in lines {
        match match_line(line, labels) {
            LineMatch::Miss => continue,
            LineMatch::Value(value) => return Ok(value),
            LineMatch::NoColon => return Err(KeyError::NoColonAfterLabel),
        }
    }
    Err(KeyError::LabelNotFound)
}

/// Decodes one raw output line, dropping the line terminator.
pub(crate) fn decode_line(raw: &[u8], encoding: OutputEncoding) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    match encoding {
        OutputEncoding::Utf8 => String::from_utf8_lossy(raw).into_owned(),
        #[cfg(windows)]
        OutputEncoding::OemCodePage => crate::backend::wlan::decode_oem(raw),
        #[cfg(not(windows))]
        OutputEncoding::OemCodePage => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Reads stdout and stderr together, line by line, until a labelled line
/// is seen or both streams close.
async fn read_until_label<O, E>(stdout: O, stderr: E, config: &ScannerConfig) -> Result<String>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout).split(b'\n');
    let mut err = BufReader::new(stderr).split(b'\n');
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        let raw = tokio::select! {
            seg = out.next_segment(), if out_open => match seg? {
                Some(raw) => raw,
                None => {
                    out_open = false;
                    continue;
                }
            },
            seg = err.next_segment(), if err_open => match seg? {
                Some(raw) => raw,
                None => {
                    err_open = false;
                    continue;
                }
            },
        };

        let line = decode_line(&raw, config.encoding);
        match match_line(&line, &config.labels) {
            LineMatch::Miss => {}
            LineMatch::Value(value) if config.is_placeholder(&value) => {
                return Err(KeyError::SecretWithheld(value));
            }
            LineMatch::Value(value) => return Ok(value),
            LineMatch::NoColon => return Err(KeyError::NoColonAfterLabel),
        }
    }

    Err(KeyError::LabelNotFound)
}

/// Runs the configured tool as a child process and scans its output.
///
/// The child is killed if it outlives the configured timeout or is still
/// running once a labelled line has been read, and is always reaped before
/// `scan` returns.
#[derive(Debug, Clone)]
pub struct CommandScanner {
    config: ScannerConfig,
}

impl CommandScanner {
    /// Creates a scanner for the given tool configuration.
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// The tool configuration in use.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }
}

impl Default for CommandScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::platform_default())
    }
}

#[async_trait]
impl CredentialScanner for CommandScanner {
    async fn scan(&self, profile: &str) -> Result<String> {
        let program = &self.config.program;
        debug!("Running {program} for profile '{profile}'");

        let mut child = Command::new(program)
            .args(self.config.args_for(profile))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| KeyError::ProcessLaunchFailed {
                program: program.clone(),
                source,
            })?;

        let result = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => {
                match timeout(
                    self.config.timeout,
                    read_until_label(stdout, stderr, &self.config),
                )
                .await
                {
                    Ok(found) => found,
                    Err(_) => {
                        warn!(
                            "{program} did not finish within {:?} for profile '{profile}'",
                            self.config.timeout
                        );
                        Err(KeyError::ProcessTimeout(self.config.timeout))
                    }
                }
            }
            _ => Err(KeyError::Io(std::io::Error::other(
                "child output pipes were not captured",
            ))),
        };

        if !matches!(child.try_wait(), Ok(Some(_))) {
            let _ = child.start_kill();
        }
        match child.wait().await {
            Ok(status) => debug!("{program} exited with {status}"),
            Err(e) => warn!("Failed to reap {program}: {e}"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const NETSH_EN: &str = "\
Profile MyHomeWiFi on interface Wi-Fi:
=======================================================================

Security settings
-----------------
    Authentication         : WPA2-Personal
    Cipher                 : CCMP
    Security key           : Present
    Key Content            : secret123

Cost settings
-------------
    Cost                   : Unrestricted
";

    const NETSH_JA: &str = "\
セキュリティの設定
-----------------
    認証                   : WPA2-パーソナル
    暗号                   : CCMP
    セキュリティ キー      : あり
    キー コンテンツ        : パスワード123
";

    #[test]
    fn test_find_credential_english() {
        let result = find_credential(NETSH_EN.lines(), &labels(&["Key Content", "キー コンテンツ"]));
        assert_eq!(result.unwrap(), "secret123");
    }

    #[test]
    fn test_find_credential_localized() {
        let result = find_credential(NETSH_JA.lines(), &labels(&["Key Content", "キー コンテンツ"]));
        assert_eq!(result.unwrap(), "パスワード123");
    }

    #[test]
    fn test_find_credential_either_label_order() {
        let result = find_credential(NETSH_JA.lines(), &labels(&["キー コンテンツ", "Key Content"]));
        assert_eq!(result.unwrap(), "パスワード123");
    }

    #[test]
    fn test_find_credential_case_insensitive_label() {
        let result = find_credential(["KEY CONTENT : AbCd"], &labels(&["key content"]));
        assert_eq!(result.unwrap(), "AbCd");
    }

    #[test]
    fn test_find_credential_value_keeps_inner_colons() {
        let result = find_credential(["Key Content : a:b:c "], &labels(&["Key Content"]));
        assert_eq!(result.unwrap(), "a:b:c");
    }

    #[test]
    fn test_find_credential_no_colon_stops_scanning() {
        let lines = ["    Key Content is hidden", "    Key Content : later"];
        let result = find_credential(lines, &labels(&["Key Content"]));
        assert!(matches!(result, Err(KeyError::NoColonAfterLabel)));
    }

    #[test]
    fn test_find_credential_colon_before_label_is_ignored() {
        let result = find_credential(["note: Key Content"], &labels(&["Key Content"]));
        assert!(matches!(result, Err(KeyError::NoColonAfterLabel)));
    }

    #[test]
    fn test_find_credential_label_missing() {
        let result = find_credential(
            ["Profile \"Guest\" is not found on the system."],
            &labels(&["Key Content"]),
        );
        assert!(matches!(result, Err(KeyError::LabelNotFound)));
    }

    #[test]
    fn test_find_credential_empty_value() {
        let result = find_credential(["Key Content :   "], &labels(&["Key Content"]));
        assert_eq!(result.unwrap(), "");
    }

    #[test]
    fn test_find_credential_nmcli_output() {
        let output = "\
connection.id:                          Home
802-11-wireless.ssid:                   Home
802-11-wireless-security.key-mgmt:      wpa-psk
802-11-wireless-security.psk:           nm pass 1
802-11-wireless-security.psk-flags:     0 (none)
";
        let result = find_credential(output.lines(), &labels(&["802-11-wireless-security.psk"]));
        assert_eq!(result.unwrap(), "nm pass 1");
    }

    #[tokio::test]
    async fn test_read_until_label_nmcli_placeholder() {
        let config = ScannerConfig::nmcli();
        for shown in ["--", "<hidden>"] {
            let output = format!(
                "connection.id:                          Home\n\
                 802-11-wireless-security.psk:           {shown}\n"
            );
            let result = read_until_label(output.as_bytes(), &b""[..], &config).await;
            assert!(matches!(result, Err(KeyError::SecretWithheld(ref v)) if v == shown));
        }
    }

    #[tokio::test]
    async fn test_read_until_label_placeholder_only_when_exact() {
        let config = ScannerConfig::nmcli();
        let stdout: &[u8] = b"802-11-wireless-security.psk:  --real--\n";
        let result = read_until_label(stdout, &b""[..], &config).await;
        assert_eq!(result.unwrap(), "--real--");
    }

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"Key Content : x\r\n", OutputEncoding::Utf8), "Key Content : x");
        assert_eq!(decode_line(b"plain", OutputEncoding::Utf8), "plain");
        assert_eq!(
            decode_line("キー : 値\n".as_bytes(), OutputEncoding::Utf8),
            "キー : 値"
        );
    }

    #[test]
    fn test_decode_line_invalid_utf8_is_replaced() {
        let line = decode_line(b"Key Content : \xff\xfe", OutputEncoding::Utf8);
        assert!(line.starts_with("Key Content : "));
        assert!(line.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_read_until_label_from_stderr() {
        let config = ScannerConfig::nmcli().with_labels(["Key Content"]);
        let stdout: &[u8] = b"nothing here\n";
        let stderr: &[u8] = b"Key Content : from-stderr\n";
        let result = read_until_label(stdout, stderr, &config).await;
        assert_eq!(result.unwrap(), "from-stderr");
    }

    #[tokio::test]
    async fn test_read_until_label_exhausted() {
        let config = ScannerConfig::nmcli().with_labels(["Key Content"]);
        let stdout: &[u8] = b"a\nb\n";
        let stderr: &[u8] = b"";
        let result = read_until_label(stdout, stderr, &config).await;
        assert!(matches!(result, Err(KeyError::LabelNotFound)));
    }

    #[tokio::test]
    async fn test_command_scanner_launch_failure() {
        let scanner = CommandScanner::new(
            ScannerConfig::nmcli().with_command("wlkeys-definitely-missing-tool", ["{profile}"]),
        );
        let result = scanner.scan("Home").await;
        assert!(matches!(result, Err(KeyError::ProcessLaunchFailed { .. })));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::time::{Duration, Instant};

        fn sh(script: &str) -> CommandScanner {
            CommandScanner::new(
                ScannerConfig::nmcli()
                    .with_command("sh", ["-c", script, "sh", "{profile}"])
                    .with_labels(["Key Content", "キー コンテンツ"])
                    .with_timeout(Duration::from_secs(5)),
            )
        }

        #[tokio::test]
        async fn test_scan_passes_profile_name() {
            let scanner = sh(r#"echo "Profile $1"; echo "    Key Content : pw-for-$1""#);
            assert_eq!(scanner.scan("Cafe Net").await.unwrap(), "pw-for-Cafe Net");
        }

        #[tokio::test]
        async fn test_scan_localized_label() {
            let scanner = sh("printf '    キー コンテンツ        : 日本語パス\\n'");
            assert_eq!(scanner.scan("x").await.unwrap(), "日本語パス");
        }

        #[tokio::test]
        async fn test_scan_reads_stderr() {
            let scanner = sh("echo 'Key Content : err-pw' 1>&2");
            assert_eq!(scanner.scan("x").await.unwrap(), "err-pw");
        }

        #[tokio::test]
        async fn test_scan_no_label() {
            let scanner = sh("echo 'There is no such wireless interface on the system.'");
            assert!(matches!(scanner.scan("x").await, Err(KeyError::LabelNotFound)));
        }

        #[tokio::test]
        async fn test_scan_stops_early_and_kills_child() {
            let scanner = sh("echo 'Key Content : early'; sleep 30");
            let started = Instant::now();
            assert_eq!(scanner.scan("x").await.unwrap(), "early");
            assert!(started.elapsed() < Duration::from_secs(5));
        }

        #[tokio::test]
        async fn test_scan_nmcli_withheld_secret() {
            let scanner = CommandScanner::new(
                ScannerConfig::nmcli()
                    .with_command("sh", ["-c", "printf '802-11-wireless-security.psk:  --\\n'"])
                    .with_timeout(Duration::from_secs(5)),
            );
            assert!(matches!(
                scanner.scan("Home").await,
                Err(KeyError::SecretWithheld(_))
            ));
        }

        #[tokio::test]
        async fn test_scan_timeout() {
            let scanner = CommandScanner::new(
                ScannerConfig::nmcli()
                    .with_command("sh", ["-c", "sleep 30"])
                    .with_timeout(Duration::from_millis(200)),
            );
            let started = Instant::now();
            let result = scanner.scan("x").await;
            assert!(matches!(result, Err(KeyError::ProcessTimeout(_))));
            assert!(started.elapsed() < Duration::from_secs(5));
        }
    }
}
