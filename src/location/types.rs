//! Core types for the location subsystem.

use std::fmt;
use thiserror::Error;

/// A resolved point. Absence is expressed as `Option<Coordinate>`, so a
/// half-resolved pair cannot exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::format_coords(self.lat, self.lon))
    }
}

/// Extra metadata reported by the fallback provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDetails {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub ip: Option<String>,
}

/// Which provider produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Primary,
    Fallback,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "ipinfo.io"),
            Self::Fallback => write!(f, "ipapi.co"),
        }
    }
}

/// What a single provider returns when it succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub coordinate: Coordinate,
    pub details: Option<LocationDetails>,
}

/// Informational messages produced while walking the provider chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PrimaryFellBack,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryFellBack => {
                write!(f, "Primary geolocation method unsuccessful, trying alternative...")
            }
        }
    }
}

/// A successful walk of the provider chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coordinate: Coordinate,
    /// Only present when the fallback provider answered.
    pub details: Option<LocationDetails>,
    pub source: LocationSource,
    pub notices: Vec<Notice>,
}

/// Errors from a single provider or from the async wrapper.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    #[error("primary provider unavailable: {0}")]
    PrimaryUnavailable(String),
    #[error("{0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("invalid provider response: {0}")]
    Data(String),
    #[error("location lookup timed out")]
    TimedOut,
    #[error("location lookup cancelled")]
    Cancelled,
}

impl LocationError {
    /// Network-level failures keep their message for display; everything else
    /// is reported generically.
    pub fn transport_message(&self) -> Option<&str> {
        match self {
            Self::Transport(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Both providers failed: the location is unresolvable.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("location unresolvable (primary: {primary}; fallback: {fallback})")]
pub struct ResolveFailure {
    pub primary: LocationError,
    pub fallback: LocationError,
    pub notices: Vec<Notice>,
}

impl ResolveFailure {
    /// Failure with no provider attempt behind it (timeout or cancellation).
    pub fn aborted(err: LocationError) -> Self {
        Self {
            primary: err.clone(),
            fallback: err,
            notices: Vec::new(),
        }
    }
}
