//! Windows WLAN API profile store.
//!
//! All unsafe wlanapi.dll calls live in this module. The client handle is
//! owned by [`WlanSession`] and closed on drop; every buffer the service
//! allocates is wrapped in a [`WlanBuffer`] that frees it on drop, so no
//! exit path leaks either.
#![allow(unsafe_code)]

use async_trait::async_trait;
use log::debug;
use std::ffi::c_void;
use windows::core::{GUID, PCWSTR, PWSTR};
use windows::Win32::Foundation::{ERROR_SUCCESS, HANDLE};
use windows::Win32::Globalization::{CP_OEMCP, MULTI_BYTE_TO_WIDE_CHAR_FLAGS, MultiByteToWideChar};
use windows::Win32::NetworkManagement::WiFi::{
    WLAN_INTERFACE_INFO_LIST, WLAN_PROFILE_GET_PLAINTEXT_KEY, WLAN_PROFILE_INFO_LIST,
    WlanCloseHandle, WlanEnumInterfaces, WlanFreeMemory, WlanGetProfile, WlanGetProfileList,
    WlanOpenHandle,
};

use crate::api::models::{Interface, Profile, ProfileDocument};
use crate::core::store::ProfileStore;
use crate::types::constants::wlan_xml;
use crate::{KeyError, Result};

/// Decodes bytes in the console OEM code page.
///
/// Falls back to lossy UTF-8 if the conversion fails.
pub(crate) fn decode_oem(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    // SAFETY: `bytes` is a valid slice; a `None` output buffer only queries the length.
    let len = unsafe { MultiByteToWideChar(CP_OEMCP, MULTI_BYTE_TO_WIDE_CHAR_FLAGS(0), bytes, None) };
    if len <= 0 {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    let mut wide = vec![0u16; len as usize];
    // SAFETY: `wide` holds exactly `len` elements as reported above.
    let written = unsafe {
        MultiByteToWideChar(CP_OEMCP, MULTI_BYTE_TO_WIDE_CHAR_FLAGS(0), bytes, Some(&mut wide))
    };
    if written <= 0 {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    String::from_utf16_lossy(&wide[..written as usize])
}

/// Converts a NUL-terminated fixed-size UTF-16 buffer.
fn from_wide_buf(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn interface_id(guid: &GUID) -> String {
    format!("{:032x}", guid.to_u128())
}

fn parse_interface_id(id: &str) -> Result<GUID> {
    u128::from_str_radix(id, 16)
        .map(GUID::from_u128)
        .map_err(|e| KeyError::StoreQueryFailed {
            profile: String::new(),
            reason: format!("invalid interface id '{id}': {e}"),
        })
}

/// Memory owned by the WLAN service, released with `WlanFreeMemory`.
struct WlanBuffer<T>(*mut T);

impl<T> WlanBuffer<T> {
    fn get(&self) -> Option<&T> {
        // SAFETY: the pointer came from a successful WLAN call and stays valid until drop.
        unsafe { self.0.as_ref() }
    }
}

impl<T> Drop for WlanBuffer<T> {
    fn drop(&mut self) {
        if !self.0.is_null() {
            // SAFETY: allocated by the WLAN service and not freed elsewhere.
            unsafe { WlanFreeMemory(self.0 as *const c_void) };
        }
    }
}

/// An open WLAN client handle.
struct WlanSession(HANDLE);

// The WLAN client handle may be used from any thread.
unsafe impl Send for WlanSession {}
unsafe impl Sync for WlanSession {}

impl WlanSession {
    fn open() -> Result<Self> {
        let mut negotiated = 0u32;
        let mut handle = HANDLE::default();
        // SAFETY: both out-pointers reference live locals.
        let ret = unsafe {
            WlanOpenHandle(wlan_xml::CLIENT_VERSION, None, &mut negotiated, &mut handle)
        };
        if ret != ERROR_SUCCESS.0 {
            return Err(KeyError::StoreUnavailable(format!(
                "WlanOpenHandle failed: {ret}"
            )));
        }
        debug!("Opened WLAN client handle (version {negotiated})");
        Ok(Self(handle))
    }
}

impl Drop for WlanSession {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by WlanOpenHandle and is closed once.
        let ret = unsafe { WlanCloseHandle(self.0, None) };
        if ret != ERROR_SUCCESS.0 {
            debug!("WlanCloseHandle returned {ret}");
        }
    }
}

/// Profile store backed by the Windows WLAN service.
pub struct WlanStore {
    session: WlanSession,
}

impl WlanStore {
    /// Opens a WLAN client session.
    pub fn open() -> Result<Self> {
        Ok(Self {
            session: WlanSession::open()?,
        })
    }

    fn interfaces_sync(&self) -> Result<Vec<Interface>> {
        let mut list: *mut WLAN_INTERFACE_INFO_LIST = std::ptr::null_mut();
        // SAFETY: session handle is open; `list` receives a service-allocated buffer.
        let ret = unsafe { WlanEnumInterfaces(self.session.0, None, &mut list) };
        let list = WlanBuffer(list);
        if ret != ERROR_SUCCESS.0 {
            return Err(KeyError::InterfaceEnumFailed(format!(
                "WlanEnumInterfaces failed: {ret}"
            )));
        }

        let Some(info) = list.get() else {
            return Err(KeyError::InterfaceEnumFailed(
                "WlanEnumInterfaces returned no list".into(),
            ));
        };
        // SAFETY: the service allocates `dwNumberOfItems` trailing entries.
        let items = unsafe {
            std::slice::from_raw_parts(info.InterfaceInfo.as_ptr(), info.dwNumberOfItems as usize)
        };

        Ok(items
            .iter()
            .map(|i| {
                Interface::new(
                    interface_id(&i.InterfaceGuid),
                    from_wide_buf(&i.strInterfaceDescription),
                )
            })
            .collect())
    }

    fn profiles_sync(&self, interface: &Interface) -> Result<Vec<Profile>> {
        let list_failed = |reason: String| KeyError::ProfileListFailed {
            interface: interface.description.clone(),
            reason,
        };
        let guid = parse_interface_id(&interface.id).map_err(|e| list_failed(e.to_string()))?;

        let mut list: *mut WLAN_PROFILE_INFO_LIST = std::ptr::null_mut();
        // SAFETY: session handle is open; `guid` outlives the call.
        let ret = unsafe { WlanGetProfileList(self.session.0, &guid, None, &mut list) };
        let list = WlanBuffer(list);
        if ret != ERROR_SUCCESS.0 {
            return Err(list_failed(format!("WlanGetProfileList failed: {ret}")));
        }

        let Some(info) = list.get() else {
            return Err(list_failed("WlanGetProfileList returned no list".into()));
        };
        // SAFETY: the service allocates `dwNumberOfItems` trailing entries.
        let items = unsafe {
            std::slice::from_raw_parts(info.ProfileInfo.as_ptr(), info.dwNumberOfItems as usize)
        };

        Ok(items
            .iter()
            .map(|p| Profile::named(from_wide_buf(&p.strProfileName)))
            .collect())
    }

    fn profile_document_sync(&self, interface: &Interface, profile: &str) -> Result<ProfileDocument> {
        let query_failed = |reason: String| KeyError::StoreQueryFailed {
            profile: profile.to_string(),
            reason,
        };
        let guid = parse_interface_id(&interface.id).map_err(|e| query_failed(e.to_string()))?;
        let name = to_wide(profile);

        let mut xml = PWSTR::null();
        let mut flags = WLAN_PROFILE_GET_PLAINTEXT_KEY;
        let mut granted = 0u32;
        // SAFETY: `name` is NUL-terminated and outlives the call; out-pointers reference locals.
        let ret = unsafe {
            WlanGetProfile(
                self.session.0,
                &guid,
                PCWSTR(name.as_ptr()),
                None,
                &mut xml,
                Some(&mut flags),
                Some(&mut granted),
            )
        };
        let buffer = WlanBuffer(xml.0);
        if ret != ERROR_SUCCESS.0 || buffer.0.is_null() {
            return Err(query_failed(format!("WlanGetProfile failed: {ret}")));
        }

        // SAFETY: `xml` points to a NUL-terminated string owned by `buffer`.
        let text = unsafe { xml.to_string() }
            .map_err(|e| query_failed(format!("profile XML is not valid UTF-16: {e}")))?;
        debug!("Fetched profile XML for '{profile}' (flags {flags:#x}, access {granted:#x})");

        Ok(ProfileDocument::Xml(text))
    }
}

#[async_trait]
impl ProfileStore for WlanStore {
    async fn interfaces(&self) -> Result<Vec<Interface>> {
        self.interfaces_sync()
    }

    async fn profiles(&self, interface: &Interface) -> Result<Vec<Profile>> {
        self.profiles_sync(interface)
    }

    async fn profile_document(
        &self,
        interface: &Interface,
        profile: &Profile,
    ) -> Result<ProfileDocument> {
        self.profile_document_sync(interface, &profile.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_id_round_trip() {
        let guid = GUID::from_u128(0x3f2a_1b00_0000_4c5d_8e9f_0011_2233_4455);
        let id = interface_id(&guid);
        assert_eq!(id.len(), 32);
        assert_eq!(parse_interface_id(&id).unwrap(), guid);
        assert!(parse_interface_id("not-hex").is_err());
    }

    #[test]
    fn test_from_wide_buf_stops_at_nul() {
        let mut buf = [0u16; 8];
        for (i, c) in "Wi-Fi".encode_utf16().enumerate() {
            buf[i] = c;
        }
        assert_eq!(from_wide_buf(&buf), "Wi-Fi");
    }

    #[test]
    fn test_decode_oem_ascii() {
        assert_eq!(decode_oem(b"Key Content : abc"), "Key Content : abc");
        assert_eq!(decode_oem(b""), "");
    }
}
