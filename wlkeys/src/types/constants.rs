//! Constants for profile stores, documents and the fallback tools.
//!
//! These correspond to tag names, D-Bus identifiers and command lines used
//! by the Windows WLAN service and NetworkManager.

/// WLAN profile XML constants.
pub mod wlan_xml {
    /// Element holding the pre-shared key when plaintext keys are requested.
    pub const KEY_MATERIAL_TAG: &str = "keyMaterial";

    /// WLAN API client version for Windows Vista and later.
    pub const CLIENT_VERSION: u32 = 2;
}

/// NetworkManager secrets layout.
pub mod nm_secrets {
    /// Setting name passed to `GetSecrets` and used as the section key.
    pub const WIRELESS_SECURITY: &str = "802-11-wireless-security";

    /// Fields checked in order for a stored key.
    pub const KEY_FIELDS: &[&str] = &["psk", "wep-key0"];
}

/// NetworkManager D-Bus identifiers and setting names.
pub mod nm_dbus {
    pub const SERVICE: &str = "org.freedesktop.NetworkManager";
    pub const SETTINGS_PATH: &str = "/org/freedesktop/NetworkManager/Settings";
    pub const SETTINGS_INTERFACE: &str = "org.freedesktop.NetworkManager.Settings";
    pub const CONNECTION_INTERFACE: &str = "org.freedesktop.NetworkManager.Settings.Connection";

    pub const CONNECTION_SECTION: &str = "connection";
    pub const WIRELESS_SECTION: &str = "802-11-wireless";
}

/// NetworkManager device type constants.
pub mod device_type {
    pub const WIFI: u32 = 2;
}

/// Default fallback tool invocations. `{profile}` is replaced with the
/// profile name.
pub mod fallback {
    /// Placeholder substituted in argument templates.
    pub const PROFILE_PLACEHOLDER: &str = "{profile}";

    pub mod netsh {
        pub const PROGRAM: &str = "netsh";
        pub const ARGS: &[&str] = &["wlan", "show", "profile", "name={profile}", "key=clear"];
        /// English and Japanese labels for the key row.
        pub const LABELS: &[&str] = &["Key Content", "キー コンテンツ"];
        pub const PLACEHOLDERS: &[&str] = &[];
    }

    pub mod nmcli {
        pub const PROGRAM: &str = "nmcli";
        pub const ARGS: &[&str] = &["--show-secrets", "connection", "show", "id", "{profile}"];
        pub const LABELS: &[&str] = &["802-11-wireless-security.psk"];
        /// Printed in place of a secret NetworkManager would not disclose.
        pub const PLACEHOLDERS: &[&str] = &["--", "<hidden>"];
    }
}

/// Timeout constants for the fallback subprocess.
pub mod timeouts {
    use std::time::Duration;

    /// Maximum time the fallback tool may run before it is killed (10 seconds).
    const SCANNER_TIMEOUT_SECS: u64 = 10;

    /// Returns the default fallback tool timeout.
    pub fn scanner_timeout() -> Duration {
        Duration::from_secs(SCANNER_TIMEOUT_SECS)
    }
}

/// Text shown when no key could be resolved.
pub const UNAVAILABLE_MARKER: &str = "(not available / permission denied)";
