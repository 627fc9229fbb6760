//! Key extraction from stored profile documents.
//!
//! WLAN profile XML carries the pre-shared key in a
//! `<sharedKey><keyMaterial>...</keyMaterial></sharedKey>` block when the
//! store is asked for plaintext keys. NetworkManager hands back a secrets map
//! instead. Both end up here.

use log::debug;

use crate::api::models::ProfileDocument;
use crate::core::text::{find_folded, find_folded_from, trim};
use crate::types::constants::{nm_secrets, wlan_xml};
use crate::{KeyError, Result};

/// Returns the trimmed text between the first `<tag>` and the first `</tag>`
/// that follows it.
///
/// Tag matching ignores case, but the returned value is sliced from the
/// original document so the secret keeps its casing. Only the first pair is
/// honoured and the rest of the document is not validated.
pub fn extract_tag<'a>(document: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let (_, start) = find_folded(document, &open)?;
    let (end, _) = find_folded_from(document, &close, start)?;

    Some(trim(&document[start..end]))
}

/// Pulls the `keyMaterial` field out of a WLAN profile document.
///
/// Returns `None` when the opening tag is missing, or when no closing tag
/// follows it. A present but blank field yields `Some("")`.
pub fn extract_key_material(document: &str) -> Option<&str> {
    extract_tag(document, wlan_xml::KEY_MATERIAL_TAG)
}

impl ProfileDocument {
    /// Extracts the stored secret from this document.
    ///
    /// Returns `MarkerNotFound` if the document holds no key field or the
    /// field is blank after trimming.
    pub fn key_material(&self) -> Result<String> {
        let found = match self {
            ProfileDocument::Xml(xml) => extract_key_material(xml),
            ProfileDocument::Settings(sections) => sections
                .get(nm_secrets::WIRELESS_SECURITY)
                .and_then(|sec| {
                    nm_secrets::KEY_FIELDS.iter().find_map(|field| {
                        sec.get(*field)
                            .map(|v| trim(v))
                            .filter(|v| !v.is_empty())
                    })
                }),
        };

        match found {
            Some(secret) if !secret.is_empty() => Ok(secret.to_string()),
            _ => {
                debug!("No key material in {} profile document", self.kind());
                Err(KeyError::MarkerNotFound)
            }
        }
    }
}
