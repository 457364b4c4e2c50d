//! Location providers: ipinfo.io (primary) and ipapi.co (fallback).

use super::types::{Coordinate, Located, LocationDetails, LocationError};
use serde::Deserialize;
use std::time::Duration;

pub const PRIMARY_URL: &str = "https://ipinfo.io/json";
pub const FALLBACK_URL: &str = "https://ipapi.co/json/";

const USER_AGENT: &str = concat!("DisasterReport/", env!("CARGO_PKG_VERSION"));

/// A source of the caller's approximate position.
pub trait LocationProvider: Send + Sync {
    fn name(&self) -> &str;
    fn locate(&self) -> Result<Located, LocationError>;
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// GET `url` and return the status and body text. Non-2xx statuses come back
/// as `LocationError::Status`.
fn fetch(agent: &ureq::Agent, url: &str) -> Result<(u16, String), LocationError> {
    match agent.get(url).call() {
        Ok(response) => {
            let status = response.status();
            let body = response
                .into_string()
                .map_err(|e| LocationError::Transport(e.to_string()))?;
            Ok((status, body))
        }
        Err(ureq::Error::Status(code, _)) => Err(LocationError::Status(code)),
        Err(ureq::Error::Transport(t)) => Err(LocationError::Transport(t.to_string())),
    }
}

// ─── ipinfo.io ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct IpInfoResult {
    loc: Option<String>,
}

/// Primary provider. Reports "not ok" on any transport, status or body problem.
pub struct IpInfoProvider {
    agent: ureq::Agent,
    url: String,
}

impl IpInfoProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
            url: url.into(),
        }
    }
}

impl LocationProvider for IpInfoProvider {
    fn name(&self) -> &str {
        "ipinfo.io"
    }

    fn locate(&self) -> Result<Located, LocationError> {
        let (status, body) = fetch(&self.agent, &self.url)?;
        parse_ipinfo(status, &body)
    }
}

/// Interpret an ipinfo.io response. `loc` is `"lat,lon"`.
pub fn parse_ipinfo(status: u16, body: &str) -> Result<Located, LocationError> {
    if status != 200 {
        return Err(LocationError::Status(status));
    }
    let r: IpInfoResult =
        serde_json::from_str(body).map_err(|e| LocationError::Data(e.to_string()))?;
    let loc = r
        .loc
        .ok_or_else(|| LocationError::Data("no loc field".into()))?;

    let (lat, lon) = loc
        .split_once(',')
        .ok_or_else(|| LocationError::Data(format!("malformed loc '{}'", loc)))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| LocationError::Data(format!("bad latitude in '{}'", loc)))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| LocationError::Data(format!("bad longitude in '{}'", loc)))?;

    let coordinate = Coordinate::new(lat, lon)
        .ok_or_else(|| LocationError::Data(format!("out of range loc '{}'", loc)))?;

    Ok(Located {
        coordinate,
        details: None,
    })
}

// ─── ipapi.co ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    ip: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Fallback provider, also the only one that reports city/region/country/IP.
pub struct IpApiProvider {
    agent: ureq::Agent,
    url: String,
}

impl IpApiProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: build_agent(timeout),
            url: url.into(),
        }
    }
}

impl LocationProvider for IpApiProvider {
    fn name(&self) -> &str {
        "ipapi.co"
    }

    fn locate(&self) -> Result<Located, LocationError> {
        let (status, body) = fetch(&self.agent, &self.url)?;
        parse_ipapi(status, &body)
    }
}

/// Interpret an ipapi.co response. Only an exact 200 with both coordinates counts.
pub fn parse_ipapi(status: u16, body: &str) -> Result<Located, LocationError> {
    if status != 200 {
        return Err(LocationError::Status(status));
    }
    let r: IpApiResult =
        serde_json::from_str(body).map_err(|e| LocationError::Data(e.to_string()))?;

    // Rate limiting is reported in-band with a 200.
    if r.error {
        return Err(LocationError::Data(
            r.reason.unwrap_or_else(|| "provider reported an error".into()),
        ));
    }

    let (lat, lon) = match (r.latitude, r.longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(LocationError::Data("missing latitude/longitude".into())),
    };
    let coordinate = Coordinate::new(lat, lon)
        .ok_or_else(|| LocationError::Data(format!("out of range coordinate {}, {}", lat, lon)))?;

    Ok(Located {
        coordinate,
        details: Some(LocationDetails {
            city: r.city,
            region: r.region,
            country: r.country_name,
            ip: r.ip,
        }),
    })
}
