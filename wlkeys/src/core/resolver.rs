//! Two-strategy key resolution for a single profile.
//!
//! 1. Ask the profile store for the profile document with plaintext keys
//!    and extract the key field.
//! 2. If that yields nothing, run the fallback tool and parse its output.
//! 3. Otherwise report the profile as unavailable.
//!
//! No failure in either step escapes: each one degrades to the next step,
//! and the last step degrades to [`ResolvedCredential::Unavailable`].

use log::debug;

use crate::api::config::ResolveOptions;
use crate::api::models::{Interface, Profile, Provenance, ResolvedCredential};
use crate::core::scanner::CredentialScanner;
use crate::core::store::ProfileStore;
use crate::Result;

/// Resolves profile keys against a store and a fallback scanner.
pub struct CredentialResolver<'a> {
    store: &'a dyn ProfileStore,
    scanner: &'a dyn CredentialScanner,
    options: ResolveOptions,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(store: &'a dyn ProfileStore, scanner: &'a dyn CredentialScanner) -> Self {
        Self::with_options(store, scanner, ResolveOptions::default())
    }

    pub fn with_options(
        store: &'a dyn ProfileStore,
        scanner: &'a dyn CredentialScanner,
        options: ResolveOptions,
    ) -> Self {
        Self {
            store,
            scanner,
            options,
        }
    }

    /// Resolves the key for the profile named `profile` on `interface`.
    pub async fn resolve(&self, interface: &Interface, profile: &str) -> ResolvedCredential {
        self.resolve_profile(interface, &Profile::named(profile)).await
    }

    /// Resolves the key for a profile as listed by the store.
    pub async fn resolve_profile(&self, interface: &Interface, entry: &Profile) -> ResolvedCredential {
        let profile = entry.name.as_str();

        match self.structured(interface, entry).await {
            Ok(secret) => {
                let resolved = ResolvedCredential::from_raw(&secret, Provenance::Structured);
                if resolved.is_found() {
                    debug!("Resolved '{profile}' from the profile store");
                    return resolved;
                }
            }
            Err(e) => debug!("Structured lookup for '{profile}' failed: {e}"),
        }

        if !self.options.fallback {
            debug!("Fallback disabled, '{profile}' unavailable");
            return ResolvedCredential::Unavailable;
        }

        match self.scanner.scan(profile).await {
            Ok(secret) => {
                let resolved = ResolvedCredential::from_raw(&secret, Provenance::Subprocess);
                if resolved.is_found() {
                    debug!("Resolved '{profile}' from the fallback tool");
                } else {
                    debug!("Fallback tool printed an empty key for '{profile}'");
                }
                resolved
            }
            Err(e) => {
                debug!("Fallback lookup for '{profile}' failed: {e}");
                ResolvedCredential::Unavailable
            }
        }
    }

    async fn structured(&self, interface: &Interface, profile: &Profile) -> Result<String> {
        let document = self.store.profile_document(interface, profile).await?;
        document.key_material()
    }
}
