use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Geometry;

/// Lifecycle status shared by projects and products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Planned,
    Ongoing,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Planned => "PLANNED",
            Status::Ongoing => "ONGOING",
            Status::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => Ok(Status::Planned),
            "ONGOING" => Ok(Status::Ongoing),
            "COMPLETED" => Ok(Status::Completed),
            other => Err(format!(
                "invalid status `{}` (expected PLANNED, ONGOING or COMPLETED)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Theme names; every entry should name a declared [`Theme`].
    #[serde(default)]
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EoMission {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(rename = "e-mail")]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Slug of the project short name; unique across all projects.
    pub id: String,
    pub status: Status,
    pub name: String,
    pub title: String,
    pub description: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eo4society_link: Option<String>,
    #[serde(default)]
    pub consortium: Vec<String>,
    pub start: DateTime<Utc>,
    /// Inclusive end, normalized to 23:59:59 of the end date.
    pub end: DateTime<Utc>,
    pub technical_officer: Contact,
    #[serde(default)]
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub status: Status,
    pub title: String,
    pub description: String,
    /// Raw reference to the owning project, resolved through the slug policy.
    pub project: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<Released>,
    #[serde(default)]
    pub eo_missions: Vec<String>,
}

/// The `Released` column: a publication date or the literal `Planned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    Date(NaiveDate),
    Planned,
}

pub const RELEASED_PLANNED: &str = "Planned";

impl Serialize for Released {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Released::Date(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            Released::Planned => serializer.serialize_str(RELEASED_PLANNED),
        }
    }
}

impl<'de> Deserialize<'de> for Released {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == RELEASED_PLANNED {
            return Ok(Released::Planned);
        }
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Released::Date)
            .map_err(serde::de::Error::custom)
    }
}
