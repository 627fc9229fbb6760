use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;
use thiserror::Error;

use crate::core::text::trim;

/// A wireless adapter known to the profile store.
///
/// `id` is opaque to the resolver and only used to scope profile lookups.
/// On Windows it is the adapter GUID as 32 hex digits, on Linux the
/// NetworkManager device object path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interface {
    /// Store-specific identifier.
    pub id: String,
    /// Human-readable adapter description (e.g. "Intel(R) Wi-Fi 6 AX201" or "wlan0").
    pub description: String,
}

impl Interface {
    /// Creates an interface from its identifier and description.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

impl Display for Interface {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// A saved wireless profile on one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name, unique within its interface.
    pub name: String,
    /// Network name for display. Usually identical to `name`.
    pub ssid: String,
    /// Store-specific locator for the saved profile, set by stores whose
    /// profile names are not unique (the NetworkManager settings path).
    #[serde(skip)]
    pub handle: Option<String>,
}

impl Profile {
    /// Creates a profile whose SSID is the profile name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ssid: name.clone(),
            name,
            handle: None,
        }
    }

    /// Creates a profile with a distinct SSID.
    pub fn new(name: impl Into<String>, ssid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ssid: ssid.into(),
            handle: None,
        }
    }

    /// Attaches the store's locator for this profile.
    #[must_use]
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }
}

/// Raw profile data returned by the structured store query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDocument {
    /// WLAN profile XML as returned by `WlanGetProfile`.
    Xml(String),
    /// NetworkManager secrets keyed by setting name, then field name.
    /// Only string-valued fields are kept.
    Settings(BTreeMap<String, BTreeMap<String, String>>),
}

impl ProfileDocument {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            ProfileDocument::Xml(_) => "XML",
            ProfileDocument::Settings(_) => "settings",
        }
    }
}

/// Which strategy produced a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Read from the profile store's own document.
    Structured,
    /// Parsed from the fallback tool's text output.
    Subprocess,
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Structured => write!(f, "structured"),
            Provenance::Subprocess => write!(f, "subprocess"),
        }
    }
}

/// Outcome of resolving one profile.
///
/// A profile with a genuinely empty key is reported as `Unavailable`: a
/// blank value after trimming cannot be told apart from a missing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResolvedCredential {
    /// A non-empty, trimmed secret.
    Found {
        secret: String,
        provenance: Provenance,
    },
    /// No strategy produced a secret.
    Unavailable,
}

impl ResolvedCredential {
    /// Builds a result from a raw value, trimming it first.
    ///
    /// Blank input becomes `Unavailable`, so a `Found` secret never carries
    /// surrounding whitespace.
    pub fn from_raw(raw: &str, provenance: Provenance) -> Self {
        let secret = trim(raw);
        if secret.is_empty() {
            ResolvedCredential::Unavailable
        } else {
            ResolvedCredential::Found {
                secret: secret.to_string(),
                provenance,
            }
        }
    }

    /// The secret, if one was found.
    pub fn secret(&self) -> Option<&str> {
        match self {
            ResolvedCredential::Found { secret, .. } => Some(secret),
            ResolvedCredential::Unavailable => None,
        }
    }

    /// The strategy that produced the secret, if any.
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            ResolvedCredential::Found { provenance, .. } => Some(*provenance),
            ResolvedCredential::Unavailable => None,
        }
    }

    /// Returns true if a secret was found.
    pub fn is_found(&self) -> bool {
        matches!(self, ResolvedCredential::Found { .. })
    }
}

/// One line of the enumeration output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileReport {
    pub profile: Profile,
    pub credential: ResolvedCredential,
}

/// All profiles found on one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceReport {
    pub interface: Interface,
    pub profiles: Vec<ProfileReport>,
    /// Set when the interface's profile list could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Narrows an enumeration run.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Case-insensitive substring matched against interface id or description.
    pub interface: Option<String>,
    /// Exact profile name.
    pub profile: Option<String>,
}

impl ReportFilter {
    /// Returns true if no filter is set.
    pub fn is_empty(&self) -> bool {
        self.interface.is_none() && self.profile.is_none()
    }
}

/// Errors raised while enumerating profiles or resolving keys.
///
/// Only store-level failures (`StoreUnavailable`, `InterfaceEnumFailed`,
/// `Unsupported`) abort an enumeration run. Everything else is absorbed per
/// profile and reported as unavailable.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The platform profile store could not be opened.
    #[error("profile store unavailable: {0}")]
    StoreUnavailable(String),

    /// The list of wireless interfaces could not be read.
    #[error("failed to enumerate interfaces: {0}")]
    InterfaceEnumFailed(String),

    /// The saved profiles on an interface could not be listed.
    #[error("failed to list profiles on {interface}: {reason}")]
    ProfileListFailed { interface: String, reason: String },

    /// The structured query for one profile failed (permission, removed, store error).
    #[error("store query failed for profile '{profile}': {reason}")]
    StoreQueryFailed { profile: String, reason: String },

    /// The profile document carried no key field.
    #[error("no key material in profile document")]
    MarkerNotFound,

    /// The fallback tool could not be started.
    #[error("failed to launch {program}: {source}")]
    ProcessLaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The fallback tool did not finish in time and was killed.
    #[error("fallback tool timed out after {0:?}")]
    ProcessTimeout(Duration),

    /// No line of the fallback tool's output carried a key label.
    #[error("no key label in tool output")]
    LabelNotFound,

    /// A key label was found but no colon followed it on that line.
    #[error("key label not followed by a colon")]
    NoColonAfterLabel,

    /// The key row held a placeholder instead of a secret.
    #[error("tool withheld the key (printed {0:?})")]
    SecretWithheld(String),

    /// An I/O error while talking to the fallback tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A D-Bus communication error occurred.
    #[cfg(target_os = "linux")]
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// No profile store backend exists for this platform.
    #[error("unsupported platform: {0}")]
    Unsupported(String),
}
