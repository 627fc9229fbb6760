//! Recover saved Wi-Fi pre-shared keys from the platform profile store.
//!
//! This crate enumerates wireless interfaces, lists the saved profiles on
//! each, and resolves every profile's key with two strategies:
//!
//! - **Structured**: ask the profile store for the profile document with
//!   plaintext keys (`WlanGetProfile` on Windows, `GetSecrets` on
//!   NetworkManager) and extract the key field.
//! - **Subprocess**: if that yields nothing, run the platform tool
//!   (`netsh wlan show profile ... key=clear` or `nmcli --show-secrets`)
//!   and pick the value following a key label in its output.
//!
//! A profile neither strategy can read is reported as unavailable; it never
//! aborts the enumeration.
//!
//! # Example
//!
//! ```no_run
//! use wlkeys::{KeyFinder, ReportFilter};
//!
//! # async fn example() -> wlkeys::Result<()> {
//! let finder = KeyFinder::new().await?;
//!
//! for iface in finder.report(&ReportFilter::default()).await? {
//!     for entry in &iface.profiles {
//!         println!("{}: {:?}", entry.profile.ssid, entry.credential.secret());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return `Result<T, KeyError>`. Only failing to open the
//! profile store or to list interfaces is an error for a whole run;
//! per-profile failures surface as [`ResolvedCredential::Unavailable`].
//!
//! # Locales
//!
//! The fallback parser matches a configurable list of labels (English and
//! Japanese `netsh` labels by default). Add labels for other locales with
//! [`ScannerConfig::with_label`].
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. Keys
//! are never logged. To see log output, add a logging implementation like
//! `env_logger`:
//!
//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
#[cfg(target_os = "linux")]
mod dbus;

// Public API modules
pub mod api;
pub mod backend;
pub mod core;
pub mod types;

// Re-exported public API
pub use crate::api::config::{OutputEncoding, ResolveOptions, ScannerConfig};
pub use crate::api::key_finder::KeyFinder;
pub use crate::api::models::{
    Interface, InterfaceReport, KeyError, Profile, ProfileDocument, ProfileReport, Provenance,
    ReportFilter, ResolvedCredential,
};
pub use crate::core::extract::{extract_key_material, extract_tag};
pub use crate::core::resolver::CredentialResolver;
pub use crate::core::scanner::{CommandScanner, CredentialScanner, find_credential};
pub use crate::core::store::ProfileStore;
pub use crate::core::text::{fold_case, trim};

/// A specialized `Result` type for key recovery operations.
pub type Result<T> = std::result::Result<T, KeyError>;
