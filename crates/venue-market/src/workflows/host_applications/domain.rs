use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Primary key of a `host_applications` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub i64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the applicant intends to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferingType {
    Space,
    Event,
    Both,
}

impl OfferingType {
    pub const fn label(self) -> &'static str {
        match self {
            OfferingType::Space => "space",
            OfferingType::Event => "event",
            OfferingType::Both => "both",
        }
    }
}

impl FromStr for OfferingType {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "space" => Ok(OfferingType::Space),
            "event" => Ok(OfferingType::Event),
            "both" => Ok(OfferingType::Both),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Review state of an application. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Outcome an administrator may record for a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub const fn status(self) -> ApplicationStatus {
        match self {
            ReviewDecision::Approved => ApplicationStatus::Approved,
            ReviewDecision::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = UnknownLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approved" => Ok(ReviewDecision::Approved),
            "rejected" => Ok(ReviewDecision::Rejected),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised value '{0}'")]
pub struct UnknownLabel(pub String);

/// Wire payload for `POST /host-applications`, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostApplicationSubmission {
    pub offering_type: String,
    #[serde(default)]
    pub space_types: Option<Vec<String>>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "integral_capacity")]
    pub capacity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Accepts `10`, `10.0` and `"10"`; fractional or non-numeric values fail.
fn integral_capacity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let integral = |value: f64| {
        (value.is_finite() && value.fract() == 0.0)
            .then_some(value as i64)
            .ok_or_else(|| D::Error::custom(format!("capacity must be an integer (found {value})")))
    };

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(value) => Ok(value),
            None => integral(number.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(raw) => {
            let raw = raw.trim();
            match raw.parse::<i64>() {
                Ok(value) => Ok(value),
                Err(_) => raw
                    .parse::<f64>()
                    .map_err(|_| D::Error::custom(format!("capacity must be a number (found '{raw}')")))
                    .and_then(integral),
            }
        }
        other => Err(D::Error::custom(format!("capacity must be a number (found {other})"))),
    }
}

/// Wire payload for `PATCH /host-applications/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(alias = "decision")]
    pub status: String,
    #[serde(default)]
    pub review_notes: Option<String>,
}

/// Query string for the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// Validated submission fields, ready to be persisted for an applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHostApplication {
    pub offering_type: OfferingType,
    pub space_types: Vec<String>,
    pub categories: Vec<String>,
    pub capacity: u32,
    pub notes: String,
}

/// Validated review command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCommand {
    pub decision: ReviewDecision,
    pub review_notes: String,
}

/// One host application as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub offering_type: OfferingType,
    pub space_types: Vec<String>,
    pub categories: Vec<String>,
    pub capacity: u32,
    pub notes: String,
    pub status: ApplicationStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HostApplication {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}
