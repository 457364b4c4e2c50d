//! Disaster report intake page.
//!
//! A small axum service: the visitor can pre-fill their approximate position
//! from an IP geolocation lookup, then submit a short disaster report whose
//! values are echoed back. Nothing is persisted beyond the in-memory session.

pub mod location;
pub mod report;
pub mod server;
