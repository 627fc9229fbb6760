//! NetworkManager profile store.
//!
//! Wi-Fi devices stand in for interfaces, saved `802-11-wireless`
//! connections for profiles. Secrets are read with `GetSecrets`, which
//! NetworkManager only answers for callers allowed to see them (root, or the
//! owning user through polkit).

use async_trait::async_trait;
use log::{debug, warn};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::OnceCell;
use zbus::Connection;
use zvariant::{OwnedObjectPath, Value};

use crate::api::models::{Interface, Profile, ProfileDocument};
use crate::core::store::ProfileStore;
use crate::dbus::{NMDeviceProxy, NMProxy};
use crate::types::constants::{device_type, nm_dbus, nm_secrets};
use crate::{KeyError, Result};

/// A saved Wi-Fi connection as read from `GetSettings`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SavedWifi {
    pub path: String,
    pub id: String,
    pub ssid: Option<String>,
    /// `connection.interface-name`, if the profile is bound to one device.
    pub interface_name: Option<String>,
}

impl SavedWifi {
    fn applies_to(&self, interface: &Interface) -> bool {
        match &self.interface_name {
            None => true,
            Some(name) => name.is_empty() || *name == interface.description,
        }
    }
}

/// Decode SSID bytes, returning `None` if empty or invalid UTF-8.
fn decode_ssid(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if bytes.is_empty() {
        return None;
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(Cow::Borrowed(s)),
        Err(e) => {
            warn!("Invalid UTF-8 in saved SSID: {e}");
            None
        }
    }
}

/// Picks the Wi-Fi fields out of a connection's settings.
///
/// Returns `None` for anything that is not an `802-11-wireless` connection.
pub(crate) fn parse_saved_wifi(
    path: &str,
    settings: &HashMap<String, HashMap<String, Value<'_>>>,
) -> Option<SavedWifi> {
    let conn_sec = settings.get(nm_dbus::CONNECTION_SECTION)?;

    match conn_sec.get("type") {
        Some(Value::Str(t)) if t.as_str() == nm_dbus::WIRELESS_SECTION => {}
        _ => return None,
    }

    let id = match conn_sec.get("id") {
        Some(Value::Str(id)) => id.as_str().to_string(),
        _ => return None,
    };

    let interface_name = match conn_sec.get("interface-name") {
        Some(Value::Str(name)) => Some(name.as_str().to_string()),
        _ => None,
    };

    let ssid = settings
        .get(nm_dbus::WIRELESS_SECTION)
        .and_then(|wifi| match wifi.get("ssid") {
            Some(Value::Array(arr)) => {
                let mut raw = Vec::new();
                for v in arr.iter() {
                    if let Ok(b) = u8::try_from(v.clone()) {
                        raw.push(b);
                    }
                }
                decode_ssid(&raw).map(|s| s.into_owned())
            }
            _ => None,
        });

    Some(SavedWifi {
        path: path.to_string(),
        id,
        ssid,
        interface_name,
    })
}

/// Keeps the string-valued fields of a `GetSecrets` reply.
pub(crate) fn secrets_document(
    secrets: &HashMap<String, HashMap<String, Value<'_>>>,
) -> ProfileDocument {
    let sections = secrets
        .iter()
        .map(|(section, fields)| {
            let strings = fields
                .iter()
                .filter_map(|(k, v)| match v {
                    Value::Str(s) => Some((k.clone(), s.as_str().to_string())),
                    _ => None,
                })
                .collect::<BTreeMap<_, _>>();
            (section.clone(), strings)
        })
        .collect();
    ProfileDocument::Settings(sections)
}

/// Helper to create a NetworkManager D-Bus proxy for a given path and interface.
async fn nm_proxy<'a, P>(conn: &'a Connection, path: P, interface: &'a str) -> Result<zbus::Proxy<'a>>
where
    P: TryInto<OwnedObjectPath>,
    P::Error: Into<zbus::Error>,
{
    let owned_path = path.try_into().map_err(Into::into)?;
    Ok(zbus::proxy::Builder::new(conn)
        .destination(nm_dbus::SERVICE)?
        .path(owned_path)?
        .interface(interface)?
        .build()
        .await?)
}

/// Turns one connection's `GetSettings` reply into a saved Wi-Fi entry.
///
/// A reply that could not be decoded is skipped so one bad connection does
/// not hide the others.
fn read_connection(
    path: &str,
    settings: zbus::Result<HashMap<String, HashMap<String, Value<'_>>>>,
) -> Option<SavedWifi> {
    match settings {
        Ok(all) => parse_saved_wifi(path, &all),
        Err(e) => {
            warn!("Skipping {path}: malformed settings: {e}");
            None
        }
    }
}

/// Builds an interface from a Wi-Fi device's name property, skipping the
/// device if the name could not be read.
fn wifi_interface(path: &str, name: zbus::Result<String>) -> Option<Interface> {
    match name {
        Ok(name) => Some(Interface::new(path, name)),
        Err(e) => {
            warn!("Failed to get interface name for {path}: {e}");
            None
        }
    }
}

/// Profiles on `interface`, each carrying its settings path as handle.
fn profiles_for(saved: &[SavedWifi], interface: &Interface) -> Vec<Profile> {
    saved
        .iter()
        .filter(|w| w.applies_to(interface))
        .map(|w| {
            let ssid = w.ssid.clone().unwrap_or_else(|| w.id.clone());
            Profile::new(w.id.clone(), ssid).with_handle(w.path.clone())
        })
        .collect()
}

/// Finds a saved connection for a profile that was not listed by this store.
fn find_by_id<'a>(saved: &'a [SavedWifi], interface: &Interface, id: &str) -> Option<&'a SavedWifi> {
    let mut matches = saved.iter().filter(|w| w.id == id && w.applies_to(interface));
    let first = matches.next()?;
    if matches.next().is_some() {
        warn!("Several saved connections are named '{id}', using {}", first.path);
    }
    Some(first)
}

/// Profile store backed by NetworkManager's settings service.
///
/// Holds a system bus connection for its lifetime. Saved connections are
/// listed once per store and shared by every interface.
#[derive(Debug, Clone)]
pub struct NetworkManagerStore {
    conn: Connection,
    saved: OnceCell<Vec<SavedWifi>>,
}

impl NetworkManagerStore {
    /// Connects to NetworkManager on the system bus.
    pub async fn connect() -> Result<Self> {
        let conn = Connection::system()
            .await
            .map_err(|e| KeyError::StoreUnavailable(format!("system bus: {e}")))?;
        Ok(Self::from_connection(conn))
    }

    /// Uses an existing bus connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            saved: OnceCell::new(),
        }
    }

    async fn saved(&self) -> Result<&[SavedWifi]> {
        let saved = self.saved.get_or_try_init(|| self.list_saved_wifi()).await?;
        Ok(saved.as_slice())
    }

    /// Lists every saved Wi-Fi connection.
    async fn list_saved_wifi(&self) -> Result<Vec<SavedWifi>> {
        let settings = nm_proxy(&self.conn, nm_dbus::SETTINGS_PATH, nm_dbus::SETTINGS_INTERFACE).await?;

        let reply = settings.call_method("ListConnections", &()).await?;
        let paths: Vec<OwnedObjectPath> = reply.body().deserialize()?;

        let mut saved = Vec::new();
        for cpath in paths {
            let cproxy = nm_proxy(&self.conn, cpath.clone(), nm_dbus::CONNECTION_INTERFACE).await?;

            let msg = match cproxy.call_method("GetSettings", &()).await {
                Ok(msg) => msg,
                Err(e) => {
                    debug!("Skipping {}: {e}", cpath.as_str());
                    continue;
                }
            };
            let body = msg.body();
            if let Some(wifi) = read_connection(cpath.as_str(), body.deserialize()) {
                saved.push(wifi);
            }
        }

        debug!("Found {} saved Wi-Fi connection(s)", saved.len());
        Ok(saved)
    }

    /// The settings path for `profile`, from its handle when it has one.
    async fn settings_path(&self, interface: &Interface, profile: &Profile) -> Result<String> {
        if let Some(path) = &profile.handle {
            return Ok(path.clone());
        }

        let saved = self.saved().await?;
        find_by_id(saved, interface, &profile.name)
            .map(|w| w.path.clone())
            .ok_or_else(|| KeyError::StoreQueryFailed {
                profile: profile.name.clone(),
                reason: "no saved connection with this id".into(),
            })
    }
}

#[async_trait]
impl ProfileStore for NetworkManagerStore {
    async fn interfaces(&self) -> Result<Vec<Interface>> {
        let nm = NMProxy::new(&self.conn)
            .await
            .map_err(|e| KeyError::InterfaceEnumFailed(e.to_string()))?;
        let paths = nm
            .get_devices()
            .await
            .map_err(|e| KeyError::InterfaceEnumFailed(e.to_string()))?;

        let mut interfaces = Vec::new();
        for p in paths {
            let d_proxy = NMDeviceProxy::builder(&self.conn)
                .path(p.clone())?
                .build()
                .await?;

            match d_proxy.device_type().await {
                Ok(device_type::WIFI) => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!("Failed to get device type for {}: {e}", p.as_str());
                    continue;
                }
            }

            if let Some(iface) = wifi_interface(p.as_str(), d_proxy.interface().await) {
                interfaces.push(iface);
            }
        }

        Ok(interfaces)
    }

    async fn profiles(&self, interface: &Interface) -> Result<Vec<Profile>> {
        let saved = self
            .saved()
            .await
            .map_err(|e| KeyError::ProfileListFailed {
                interface: interface.description.clone(),
                reason: e.to_string(),
            })?;

        Ok(profiles_for(saved, interface))
    }

    async fn profile_document(
        &self,
        interface: &Interface,
        profile: &Profile,
    ) -> Result<ProfileDocument> {
        let query_failed = |e: KeyError| match e {
            KeyError::StoreQueryFailed { .. } => e,
            other => KeyError::StoreQueryFailed {
                profile: profile.name.clone(),
                reason: other.to_string(),
            },
        };

        let path = self.settings_path(interface, profile).await.map_err(query_failed)?;
        let cproxy = nm_proxy(&self.conn, path.as_str(), nm_dbus::CONNECTION_INTERFACE)
            .await
            .map_err(query_failed)?;

        let msg = cproxy
            .call_method("GetSecrets", &(nm_secrets::WIRELESS_SECURITY,))
            .await
            .map_err(|e| query_failed(e.into()))?;
        let body = msg.body();
        let secrets: HashMap<String, HashMap<String, Value>> =
            body.deserialize().map_err(|e| query_failed(e.into()))?;

        Ok(secrets_document(&secrets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(pairs: Vec<(&str, Value<'static>)>) -> HashMap<String, Value<'static>> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn wifi_settings(id: &str, iface: Option<&str>) -> HashMap<String, HashMap<String, Value<'static>>> {
        let mut conn = vec![
            ("id", Value::from(id.to_string())),
            ("type", Value::from("802-11-wireless")),
        ];
        if let Some(name) = iface {
            conn.push(("interface-name", Value::from(name.to_string())));
        }

        let mut all = HashMap::new();
        all.insert("connection".to_string(), section(conn));
        all.insert(
            "802-11-wireless".to_string(),
            section(vec![("ssid", Value::from(b"Home SSID".to_vec()))]),
        );
        all
    }

    #[test]
    fn test_parse_saved_wifi() {
        let settings = wifi_settings("Home", None);
        let wifi = parse_saved_wifi("/org/freedesktop/NetworkManager/Settings/1", &settings).unwrap();
        assert_eq!(wifi.id, "Home");
        assert_eq!(wifi.ssid.as_deref(), Some("Home SSID"));
        assert_eq!(wifi.interface_name, None);
    }

    #[test]
    fn test_parse_saved_wifi_skips_other_types() {
        let mut all = HashMap::new();
        all.insert(
            "connection".to_string(),
            section(vec![
                ("id", Value::from("Wired connection 1")),
                ("type", Value::from("802-3-ethernet")),
            ]),
        );
        assert_eq!(parse_saved_wifi("/x", &all), None);
    }

    #[test]
    fn test_applies_to_interface_binding() {
        let wlan0 = Interface::new("/org/freedesktop/NetworkManager/Devices/3", "wlan0");
        let wlan1 = Interface::new("/org/freedesktop/NetworkManager/Devices/4", "wlan1");

        let unbound = parse_saved_wifi("/a", &wifi_settings("Any", None)).unwrap();
        assert!(unbound.applies_to(&wlan0));
        assert!(unbound.applies_to(&wlan1));

        let bound = parse_saved_wifi("/b", &wifi_settings("Bound", Some("wlan0"))).unwrap();
        assert!(bound.applies_to(&wlan0));
        assert!(!bound.applies_to(&wlan1));
    }

    #[test]
    fn test_profiles_for_keeps_duplicate_ids_apart() {
        let wlan0 = Interface::new("/org/freedesktop/NetworkManager/Devices/3", "wlan0");
        let saved = vec![
            parse_saved_wifi("/Settings/1", &wifi_settings("Home", None)).unwrap(),
            parse_saved_wifi("/Settings/2", &wifi_settings("Home", None)).unwrap(),
            parse_saved_wifi("/Settings/3", &wifi_settings("Lab", Some("wlan1"))).unwrap(),
        ];

        let profiles = profiles_for(&saved, &wlan0);

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "Home");
        assert_eq!(profiles[0].ssid, "Home SSID");
        assert_eq!(profiles[0].handle.as_deref(), Some("/Settings/1"));
        assert_eq!(profiles[1].handle.as_deref(), Some("/Settings/2"));
    }

    #[test]
    fn test_find_by_id_respects_binding() {
        let wlan0 = Interface::new("/org/freedesktop/NetworkManager/Devices/3", "wlan0");
        let saved = vec![
            parse_saved_wifi("/Settings/1", &wifi_settings("Lab", Some("wlan1"))).unwrap(),
            parse_saved_wifi("/Settings/2", &wifi_settings("Lab", None)).unwrap(),
        ];

        assert_eq!(find_by_id(&saved, &wlan0, "Lab").map(|w| w.path.as_str()), Some("/Settings/2"));
        assert!(find_by_id(&saved, &wlan0, "Home").is_none());
    }

    #[test]
    fn test_read_connection_skips_undecodable_reply() {
        let bad = read_connection("/Settings/9", Err(zbus::Error::Failure("bad signature".into())));
        assert_eq!(bad, None);

        let good = read_connection("/Settings/1", Ok(wifi_settings("Home", None)));
        assert_eq!(good.map(|w| w.path), Some("/Settings/1".to_string()));
    }

    #[test]
    fn test_wifi_interface_skips_unreadable_name() {
        let path = "/org/freedesktop/NetworkManager/Devices/3";
        assert_eq!(
            wifi_interface(path, Err(zbus::Error::Failure("no such property".into()))),
            None
        );
        assert_eq!(
            wifi_interface(path, Ok("wlan0".into())),
            Some(Interface::new(path, "wlan0"))
        );
    }

    #[test]
    fn test_secrets_document_keeps_strings() {
        let mut secrets = HashMap::new();
        secrets.insert(
            "802-11-wireless-security".to_string(),
            section(vec![
                ("psk", Value::from("hunter22")),
                ("psk-flags", Value::from(0u32)),
            ]),
        );

        let doc = secrets_document(&secrets);
        assert_eq!(doc.key_material().unwrap(), "hunter22");
        match doc {
            ProfileDocument::Settings(sections) => {
                assert_eq!(sections["802-11-wireless-security"].len(), 1);
            }
            other => panic!("unexpected document: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ssid() {
        assert_eq!(decode_ssid(b"").as_deref(), None);
        assert_eq!(decode_ssid("café".as_bytes()).as_deref(), Some("café"));
        assert_eq!(decode_ssid(&[0xff, 0xfe]).as_deref(), None);
    }
}
