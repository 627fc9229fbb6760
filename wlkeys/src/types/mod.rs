//! Constants shared across backends.

pub mod constants;
