//! Interface and profile enumeration.
//!
//! Walks every interface, then every saved profile on it, resolving each
//! one in turn. Only failure to list interfaces aborts the run; a profile
//! list that cannot be read is recorded on its interface and skipped.

use log::{debug, info, warn};

use crate::api::models::{Interface, InterfaceReport, ProfileReport, ReportFilter};
use crate::core::resolver::CredentialResolver;
use crate::core::store::ProfileStore;
use crate::core::text::find_folded;
use crate::{KeyError, Result};

fn interface_matches(interface: &Interface, filter: &ReportFilter) -> bool {
    match &filter.interface {
        None => true,
        Some(needle) => {
            find_folded(&interface.description, needle).is_some()
                || find_folded(&interface.id, needle).is_some()
        }
    }
}

/// Builds a report for every matching interface and profile.
pub(crate) async fn build_report(
    store: &dyn ProfileStore,
    resolver: &CredentialResolver<'_>,
    filter: &ReportFilter,
) -> Result<Vec<InterfaceReport>> {
    let interfaces = store.interfaces().await.map_err(|e| match e {
        KeyError::InterfaceEnumFailed(_) => e,
        other => KeyError::InterfaceEnumFailed(other.to_string()),
    })?;
    debug!("Found {} wireless interface(s)", interfaces.len());

    let mut reports = Vec::new();

    for interface in interfaces {
        if !interface_matches(&interface, filter) {
            debug!("Skipping interface {} (filtered)", interface.description);
            continue;
        }

        let profiles = match store.profiles(&interface).await {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to list profiles on {}: {e}", interface.description);
                reports.push(InterfaceReport {
                    interface,
                    profiles: Vec::new(),
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let mut entries = Vec::with_capacity(profiles.len());
        for profile in profiles {
            if let Some(wanted) = &filter.profile {
                if &profile.name != wanted {
                    continue;
                }
            }

            let credential = resolver.resolve_profile(&interface, &profile).await;
            entries.push(ProfileReport {
                profile,
                credential,
            });
        }

        info!(
            "{}: resolved {}/{} profile(s)",
            interface.description,
            entries.iter().filter(|e| e.credential.is_found()).count(),
            entries.len()
        );

        reports.push(InterfaceReport {
            interface,
            profiles: entries,
            error: None,
        });
    }

    Ok(reports)
}
