//! Disaster report form values and the confirmation summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Kind of disaster being reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisasterType {
    #[default]
    Flood,
    Earthquake,
    Wildfire,
    Hurricane,
    Tornado,
    Other,
}

impl DisasterType {
    /// Selector order.
    pub const ALL: [DisasterType; 6] = [
        Self::Flood,
        Self::Earthquake,
        Self::Wildfire,
        Self::Hurricane,
        Self::Tornado,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flood => "Flood",
            Self::Earthquake => "Earthquake",
            Self::Wildfire => "Wildfire",
            Self::Hurricane => "Hurricane",
            Self::Tornado => "Tornado",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisasterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown disaster type '{}'", s))
    }
}

/// The disaster type as submitted. Text matching none of the options is kept
/// verbatim so it can be echoed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisasterField {
    Known(DisasterType),
    Unlisted(String),
}

impl DisasterField {
    pub fn parse(raw: &str) -> Self {
        raw.parse()
            .map(Self::Known)
            .unwrap_or_else(|_| Self::Unlisted(raw.to_string()))
    }

    pub fn known(&self) -> Option<DisasterType> {
        match self {
            Self::Known(t) => Some(*t),
            Self::Unlisted(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(t) => t.as_str(),
            Self::Unlisted(raw) => raw,
        }
    }
}

impl Default for DisasterField {
    fn default() -> Self {
        Self::Known(DisasterType::default())
    }
}

impl fmt::Display for DisasterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn disaster_field<'de, D>(deserializer: D) -> Result<DisasterField, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(DisasterField::parse(&raw))
}

/// Raw form body. Missing fields arrive as empty strings; an absent disaster
/// type is the selector's first option.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    pub name: String,
    pub contact: String,
    #[serde(deserialize_with = "disaster_field")]
    pub disaster_type: DisasterField,
    pub location: String,
    pub note: String,
}

/// A submitted report. Lives only long enough to render the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSubmission {
    pub name: String,
    pub contact: String,
    pub disaster_type: DisasterField,
    pub location: String,
    pub note: String,
    pub submitted_at: DateTime<Utc>,
}

impl ReportSubmission {
    /// Accept the form as-is; there is no validation.
    pub fn from_form(form: ReportForm) -> Self {
        Self {
            name: form.name,
            contact: form.contact,
            disaster_type: form.disaster_type,
            location: form.location,
            note: form.note,
            submitted_at: Utc::now(),
        }
    }

    /// Label/value rows for the confirmation view, in display order.
    pub fn summary(&self) -> [(&'static str, &str); 5] {
        [
            ("Name", self.name.as_str()),
            ("Contact", self.contact.as_str()),
            ("Disaster Type", self.disaster_type.as_str()),
            ("Location", self.location.as_str()),
            ("Further Note", self.note.as_str()),
        ]
    }
}
