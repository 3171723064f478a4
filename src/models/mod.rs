//! Data models for the MDM console.
//!
//! Descriptors are declared once at startup; records and sessions mirror the backend's
//! JSON contract.

pub mod catalog;
mod descriptor;
mod record;
mod session;

pub use descriptor::*;
pub use record::*;
pub use session::*;
