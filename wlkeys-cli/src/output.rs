//! Rendering of enumeration reports.

use std::fmt::Write;
use wlkeys::types::constants::UNAVAILABLE_MARKER;
use wlkeys::{InterfaceReport, ResolvedCredential};

/// Renders reports in the classic per-interface layout:
///
/// ```text
/// ---- Interface: Wi-Fi ----
/// Profile: MyHomeWiFi
///   SSID: MyHomeWiFi
///   PASS: mypassword123
/// ```
pub fn render_text(reports: &[InterfaceReport], show_source: bool) -> String {
    let mut out = String::new();

    for report in reports {
        let _ = writeln!(out, "---- Interface: {} ----", report.interface.description);

        if let Some(err) = &report.error {
            let _ = writeln!(out, "  (profiles unavailable: {err})");
            continue;
        }

        for entry in &report.profiles {
            let _ = writeln!(out, "Profile: {}", entry.profile.name);
            let _ = writeln!(out, "  SSID: {}", entry.profile.ssid);
            match &entry.credential {
                ResolvedCredential::Found { secret, provenance } if show_source => {
                    let _ = writeln!(out, "  PASS: {secret} [{provenance}]");
                }
                ResolvedCredential::Found { secret, .. } => {
                    let _ = writeln!(out, "  PASS: {secret}");
                }
                ResolvedCredential::Unavailable => {
                    let _ = writeln!(out, "  PASS: {UNAVAILABLE_MARKER}");
                }
            }
        }
    }

    out
}

/// Renders reports as pretty-printed JSON.
pub fn render_json(reports: &[InterfaceReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wlkeys::{Interface, Profile, ProfileReport, Provenance};

    fn sample() -> Vec<InterfaceReport> {
        vec![
            InterfaceReport {
                interface: Interface::new("0", "Wi-Fi"),
                profiles: vec![
                    ProfileReport {
                        profile: Profile::named("MyHomeWiFi"),
                        credential: ResolvedCredential::from_raw(
                            "mypassword123",
                            Provenance::Structured,
                        ),
                    },
                    ProfileReport {
                        profile: Profile::named("CafeNet"),
                        credential: ResolvedCredential::Unavailable,
                    },
                ],
                error: None,
            },
            InterfaceReport {
                interface: Interface::new("1", "USB adapter"),
                profiles: vec![],
                error: Some("access denied".into()),
            },
        ]
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample(), false);
        let expected = "\
---- Interface: Wi-Fi ----
Profile: MyHomeWiFi
  SSID: MyHomeWiFi
  PASS: mypassword123
Profile: CafeNet
  SSID: CafeNet
  PASS: (not available / permission denied)
---- Interface: USB adapter ----
  (profiles unavailable: access denied)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_with_source() {
        let text = render_text(&sample(), true);
        assert!(text.contains("  PASS: mypassword123 [structured]\n"));
        assert!(text.contains("  PASS: (not available / permission denied)\n"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["profiles"][0]["credential"]["secret"], "mypassword123");
        assert_eq!(value[1]["error"], "access denied");
    }
}
