//! Wire types and domain vocabulary shared by the gallery client crates.

pub mod domain;
pub mod error;
pub mod protocol;
