//! Public API module.
//!
//! This module contains the high-level user-facing API for the `wlkeys` crate.

pub mod config;
pub mod key_finder;
pub mod models;
