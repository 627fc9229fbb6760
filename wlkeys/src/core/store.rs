//! Profile store abstraction.
//!
//! A store is an open session with the platform's wireless profile service.
//! It is acquired once per enumeration run and released when dropped.

use async_trait::async_trait;

use crate::api::models::{Interface, Profile, ProfileDocument};
use crate::Result;

/// Read-only access to saved wireless profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Lists wireless interfaces.
    async fn interfaces(&self) -> Result<Vec<Interface>>;

    /// Lists saved profiles on one interface.
    async fn profiles(&self, interface: &Interface) -> Result<Vec<Profile>>;

    /// Fetches a profile's stored document with plaintext key disclosure
    /// requested.
    ///
    /// `profile` is either one returned by [`ProfileStore::profiles`], whose
    /// `handle` the store may rely on, or one built from a bare name.
    /// Any failure here is treated by the resolver as "no structured result".
    async fn profile_document(
        &self,
        interface: &Interface,
        profile: &Profile,
    ) -> Result<ProfileDocument>;
}
