//! Location subsystem for the report page.
//!
//! Resolves the caller's approximate position from their public IP: ipinfo.io
//! first, ipapi.co as a fallback that also reports city/region/country/IP.

pub mod providers;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use providers::{IpApiProvider, IpInfoProvider, LocationProvider, FALLBACK_URL, PRIMARY_URL};
pub use resolver::{provider_budget, resolve_with_deadline, LocationResolver};
pub use types::{
    Coordinate, Located, LocationDetails, LocationError, LocationSource, Notice, Resolution,
    ResolveFailure,
};

/// Format a coordinate pair the way the report form expects it.
pub fn format_coords(lat: f64, lon: f64) -> String {
    format!("Latitude: {:.4}, Longitude: {:.4}", lat, lon)
}
