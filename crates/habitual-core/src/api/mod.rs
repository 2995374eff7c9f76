//! Backend access.

mod client;
pub mod csrf;

pub use client::{ApiClient, SESSION_PATH, TAP_PATH};
