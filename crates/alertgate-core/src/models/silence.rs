//! Silence data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label matcher used by silences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    /// Label name
    pub name: String,
    /// Value or regular expression to match
    pub value: String,
    /// Whether `value` is a regular expression
    pub is_regex: bool,
    /// Equality (`true`) or negated (`false`) match
    #[serde(default = "default_is_equal")]
    pub is_equal: bool,
}

fn default_is_equal() -> bool {
    true
}

impl Matcher {
    /// Exact `name="value"` matcher
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_regex: false,
            is_equal: true,
        }
    }
}

/// State of a silence as reported by the remote Alertmanager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SilenceState {
    /// Silence has ended
    Expired,
    /// Silence is suppressing alerts
    #[default]
    Active,
    /// Silence starts in the future
    Pending,
}

/// Silence status wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SilenceStatus {
    /// Current state
    pub state: SilenceState,
}

/// Silence to create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostableSilence {
    /// Existing silence to update, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Alerts muted by the silence
    pub matchers: Vec<Matcher>,
    /// Start of the silence
    pub starts_at: DateTime<Utc>,
    /// End of the silence
    pub ends_at: DateTime<Utc>,
    /// Author
    pub created_by: String,
    /// Reason for the silence
    pub comment: String,
}

/// Silence as returned by the remote Alertmanager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GettableSilence {
    /// Silence ID
    pub id: String,
    /// Current status
    pub status: SilenceStatus,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
    /// Alerts muted by the silence
    pub matchers: Vec<Matcher>,
    /// Start of the silence
    pub starts_at: DateTime<Utc>,
    /// End of the silence
    pub ends_at: DateTime<Utc>,
    /// Author
    pub created_by: String,
    /// Reason for the silence
    pub comment: String,
}

/// List of silences
pub type GettableSilences = Vec<GettableSilence>;

/// Response to a silence creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSilenceResponse {
    /// ID of the created silence
    #[serde(rename = "silenceID")]
    pub silence_id: String,
}
