//! Core key resolution logic.
//!
//! This module contains text matching, document extraction, the fallback
//! tool scanner, the two-strategy resolver and the enumeration loop.

pub(crate) mod enumerate;
pub mod extract;
pub mod resolver;
pub mod scanner;
pub mod store;
pub mod text;
