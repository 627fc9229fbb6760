//! D-Bus proxy interfaces for NetworkManager.
//!
//! Only the parts of the NetworkManager API needed to find Wi-Fi devices are
//! declared as typed proxies. Saved connection objects are reached through
//! untyped proxies built with [`crate::backend::networkmanager`] helpers.

mod device;
mod main_nm;

pub(crate) use device::NMDeviceProxy;
pub(crate) use main_nm::NMProxy;
