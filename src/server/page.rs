//! Server-side HTML for the report page, rendered from `templates/page.html`.

use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use crate::location::{Coordinate, LocationDetails, Resolution, ResolveFailure};
use crate::report::{DisasterType, ReportSubmission};

use super::session::SessionState;

/// Map zoom level for the resolved-location marker.
pub const MAP_ZOOM: u8 = 10;

const MAP_WIDTH_PX: f64 = 640.0;
const MAP_HEIGHT_PX: f64 = 320.0;

const PAGE_TEMPLATE: &str = include_str!("../../templates/page.html");

/// Everything one render needs.
pub struct PageView<'a> {
    pub session: &'a SessionState,
    /// Set only on the response to the location button.
    pub lookup: Option<&'a Result<Resolution, ResolveFailure>>,
    /// Set only on the response to a form submission.
    pub submission: Option<&'a ReportSubmission>,
}

#[derive(Serialize)]
struct LookupContext {
    resolved: bool,
    notices: Vec<String>,
    lat: String,
    lon: String,
    details: Option<DetailsContext>,
    map_embed: String,
    map_link: String,
    transport_error: Option<String>,
}

#[derive(Serialize)]
struct DetailsContext {
    city: String,
    region: String,
    country: String,
    ip: String,
}

#[derive(Serialize)]
struct FormContext<'a> {
    name: &'a str,
    contact: &'a str,
    location: &'a str,
    note: &'a str,
    options: Vec<OptionContext>,
}

#[derive(Serialize)]
struct OptionContext {
    label: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    label: &'static str,
    value: &'a str,
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env
}

pub fn render(view: &PageView<'_>) -> Result<String, minijinja::Error> {
    let lookup = view.lookup.map(lookup_context);

    let default_location = view.session.default_location();
    let form = match view.submission {
        Some(s) => form_context(
            &s.name,
            &s.contact,
            s.disaster_type.known(),
            &s.location,
            &s.note,
        ),
        None => form_context("", "", Some(DisasterType::default()), &default_location, ""),
    };

    let summary: Option<Vec<SummaryRow<'_>>> = view.submission.map(|s| {
        s.summary()
            .into_iter()
            .map(|(label, value)| SummaryRow { label, value })
            .collect()
    });

    let env = environment();
    let template = env.template_from_named_str("page.html", PAGE_TEMPLATE)?;
    template.render(context! { lookup, form, summary })
}

fn lookup_context(outcome: &Result<Resolution, ResolveFailure>) -> LookupContext {
    match outcome {
        Ok(r) => LookupContext {
            resolved: true,
            notices: r.notices.iter().map(|n| n.to_string()).collect(),
            lat: format!("{:.4}", r.coordinate.lat),
            lon: format!("{:.4}", r.coordinate.lon),
            details: r.details.as_ref().map(details_context),
            map_embed: map_embed_url(r.coordinate, MAP_ZOOM),
            map_link: map_link_url(r.coordinate, MAP_ZOOM),
            transport_error: None,
        },
        Err(failure) => LookupContext {
            resolved: false,
            notices: failure.notices.iter().map(|n| n.to_string()).collect(),
            lat: String::new(),
            lon: String::new(),
            details: None,
            map_embed: String::new(),
            map_link: String::new(),
            transport_error: failure.fallback.transport_message().map(str::to_string),
        },
    }
}

fn details_context(d: &LocationDetails) -> DetailsContext {
    let shown = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".into());
    DetailsContext {
        city: shown(&d.city),
        region: shown(&d.region),
        country: shown(&d.country),
        ip: shown(&d.ip),
    }
}

fn form_context<'a>(
    name: &'a str,
    contact: &'a str,
    selected: Option<DisasterType>,
    location: &'a str,
    note: &'a str,
) -> FormContext<'a> {
    FormContext {
        name,
        contact,
        location,
        note,
        options: DisasterType::ALL
            .iter()
            .map(|t| OptionContext {
                label: t.as_str(),
                selected: selected == Some(*t),
            })
            .collect(),
    }
}

/// OpenStreetMap embed centred on `c` with a marker, sized for the page's map frame.
pub fn map_embed_url(c: Coordinate, zoom: u8) -> String {
    // Web Mercator: degrees of longitude per pixel at this zoom on 256px tiles.
    let deg_per_px = 360.0 / (256.0 * f64::from(1u32 << zoom));
    let half_lon = deg_per_px * MAP_WIDTH_PX / 2.0;
    let half_lat = deg_per_px * MAP_HEIGHT_PX / 2.0 * c.lat.to_radians().cos();

    let west = (c.lon - half_lon).max(-180.0);
    let east = (c.lon + half_lon).min(180.0);
    let south = (c.lat - half_lat).max(-90.0);
    let north = (c.lat + half_lat).min(90.0);

    format!(
        "https://www.openstreetmap.org/export/embed.html?bbox={:.5},{:.5},{:.5},{:.5}&layer=mapnik&marker={:.5},{:.5}",
        west, south, east, north, c.lat, c.lon
    )
}

pub fn map_link_url(c: Coordinate, zoom: u8) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={:.5}&mlon={:.5}#map={}/{:.5}/{:.5}",
        c.lat, c.lon, zoom, c.lat, c.lon
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationError, LocationSource, Notice};
    use crate::report::{DisasterField, ReportForm};

    fn at(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn page(session: &SessionState, lookup: Option<&Result<Resolution, ResolveFailure>>) -> String {
        render(&PageView { session, lookup, submission: None }).unwrap()
    }

    fn submitted(form: ReportForm) -> String {
        let submission = ReportSubmission::from_form(form);
        render(&PageView {
            session: &SessionState::default(),
            lookup: None,
            submission: Some(&submission),
        })
        .unwrap()
    }

    #[test]
    fn test_location_field_prefilled_from_session() {
        let session = SessionState {
            coordinate: Some(at(37.7749, -122.4194)),
            ..Default::default()
        };
        let html = page(&session, None);
        assert!(html.contains("value=\"Latitude: 37.7749, Longitude: -122.4194\""));
        assert!(html.contains("<details class=\"retrieval\">"));
        assert!(html.contains("<option value=\"Flood\" selected>Flood</option>"));
    }

    #[test]
    fn test_fallback_result_shows_details_and_map() {
        let lookup = Ok(Resolution {
            coordinate: at(12.34, 56.78),
            details: Some(LocationDetails {
                city: Some("X".into()),
                region: None,
                country: Some("Z".into()),
                ip: Some("1.2.3.4".into()),
            }),
            source: LocationSource::Fallback,
            notices: vec![Notice::PrimaryFellBack],
        });
        let html = page(&SessionState::default(), Some(&lookup));
        assert!(html.contains("<details class=\"retrieval\" open>"));
        assert!(html.contains("Primary geolocation method unsuccessful, trying alternative..."));
        assert!(html.contains("Location retrieved successfully!"));
        assert!(html.contains("<strong>Latitude:</strong> 12.3400"));
        assert!(html.contains("<strong>Longitude:</strong> 56.7800"));
        assert!(html.contains("City: X"));
        assert!(html.contains("Region: None"));
        assert!(html.contains("IP: 1.2.3.4"));
        assert!(html.contains("View larger map"));
    }

    #[test]
    fn test_primary_result_has_no_detail_panel() {
        let lookup = Ok(Resolution {
            coordinate: at(1.0, 2.0),
            details: None,
            source: LocationSource::Primary,
            notices: vec![],
        });
        let html = page(&SessionState::default(), Some(&lookup));
        assert!(!html.contains("Location Details"));
        assert!(!html.contains("trying alternative"));
        assert!(html.contains("Location on Map"));
    }

    #[test]
    fn test_transport_failure_shows_message() {
        let lookup = Err(ResolveFailure {
            primary: LocationError::PrimaryUnavailable("x".into()),
            fallback: LocationError::Transport("connection refused".into()),
            notices: vec![Notice::PrimaryFellBack],
        });
        let html = page(&SessionState::default(), Some(&lookup));
        assert!(html.contains("Error retrieving location from ipapi.co: connection refused"));
        assert!(html.contains("Could not determine your location. Please try again."));
        assert!(!html.contains("Location on Map"));
    }

    #[test]
    fn test_data_failure_is_generic() {
        let lookup = Err(ResolveFailure {
            primary: LocationError::PrimaryUnavailable("x".into()),
            fallback: LocationError::Status(429),
            notices: vec![Notice::PrimaryFellBack],
        });
        let html = page(&SessionState::default(), Some(&lookup));
        assert!(!html.contains("Error retrieving location"));
        assert!(!html.contains("429"));
        assert!(html.contains("Could not determine your location. Please try again."));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let html = submitted(ReportForm {
            name: "<b>Eve</b>".into(),
            note: "\"quoted\" & more".into(),
            ..Default::default()
        });
        assert!(!html.contains("<b>Eve</b>"));
        assert!(html.contains("&lt;b&gt;Eve"));
        assert!(html.contains("&quot;quoted&quot; &amp; more"));
    }

    #[test]
    fn test_unlisted_type_echoed_without_selection() {
        let html = submitted(ReportForm {
            disaster_type: DisasterField::Unlisted(String::new()),
            ..Default::default()
        });
        assert!(html.contains("<li><strong>Disaster Type:</strong> </li>"));
        assert!(!html.contains(" selected>"));
    }

    #[test]
    fn test_map_link_zoom() {
        let url = map_link_url(at(12.34, 56.78), MAP_ZOOM);
        assert!(url.ends_with("#map=10/12.34000/56.78000"));
    }

    #[test]
    fn test_map_bbox_contains_point() {
        let url = map_embed_url(at(59.3293, 18.0686), MAP_ZOOM);
        assert!(url.contains("marker=59.32930,18.06860"));
        let bbox = url.split("bbox=").nth(1).unwrap().split('&').next().unwrap();
        let v: Vec<f64> = bbox.split(',').map(|p| p.parse().unwrap()).collect();
        assert!(v[0] < 18.0686 && 18.0686 < v[2]);
        assert!(v[1] < 59.3293 && 59.3293 < v[3]);
    }
}
