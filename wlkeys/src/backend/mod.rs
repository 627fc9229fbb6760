//! Platform profile store backends.
//!
//! - Linux: NetworkManager over the system D-Bus.
//! - Windows: the WLAN service via wlanapi.dll.

#[cfg(target_os = "linux")]
pub mod networkmanager;
#[cfg(windows)]
pub mod wlan;

use crate::core::store::ProfileStore;
use crate::Result;

/// Opens the profile store for the current platform.
pub async fn open_platform_store() -> Result<Box<dyn ProfileStore>> {
    #[cfg(target_os = "linux")]
    {
        let store = networkmanager::NetworkManagerStore::connect().await?;
        Ok(Box::new(store))
    }

    #[cfg(windows)]
    {
        let store = wlan::WlanStore::open()?;
        Ok(Box::new(store))
    }

    #[cfg(not(any(target_os = "linux", windows)))]
    {
        Err(crate::KeyError::Unsupported(std::env::consts::OS.to_string()))
    }
}
