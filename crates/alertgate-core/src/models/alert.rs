//! Alert data models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Receiver;

/// Label or annotation set
pub type LabelSet = BTreeMap<String, String>;

/// Alert sent to the remote Alertmanager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostableAlert {
    /// Identifying labels
    pub labels: LabelSet,
    /// Descriptive annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: LabelSet,
    /// When the alert started firing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// When the alert resolves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Link back to the alert source
    #[serde(
        default,
        rename = "generatorURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub generator_url: Option<String>,
}

/// Batch of alerts forwarded to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PostableAlerts {
    /// Alerts in send order
    pub alerts: Vec<PostableAlert>,
}

impl PostableAlerts {
    /// Number of alerts in the batch
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl From<Vec<PostableAlert>> for PostableAlerts {
    fn from(alerts: Vec<PostableAlert>) -> Self {
        Self { alerts }
    }
}

/// Processing state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    /// Received but not yet processed
    Unprocessed,
    /// Alert is firing and not suppressed
    #[default]
    Active,
    /// Alert is silenced or inhibited
    Suppressed,
}

/// Status of an alert as seen by the remote Alertmanager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlertStatus {
    /// Processing state
    pub state: AlertState,
    /// IDs of silences muting the alert
    #[serde(default)]
    pub silenced_by: Vec<String>,
    /// Fingerprints of inhibiting alerts
    #[serde(default)]
    pub inhibited_by: Vec<String>,
}

/// Alert as returned by the remote Alertmanager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GettableAlert {
    /// Identifying labels
    pub labels: LabelSet,
    /// Descriptive annotations
    #[serde(default)]
    pub annotations: LabelSet,
    /// Receivers the alert is routed to
    #[serde(default)]
    pub receivers: Vec<Receiver>,
    /// Hash of the label set
    pub fingerprint: String,
    /// When the alert started firing
    pub starts_at: DateTime<Utc>,
    /// Last update seen by the Alertmanager
    pub updated_at: DateTime<Utc>,
    /// When the alert resolves
    pub ends_at: DateTime<Utc>,
    /// Current status
    pub status: AlertStatus,
    /// Link back to the alert source
    #[serde(default, rename = "generatorURL", skip_serializing_if = "Option::is_none")]
    pub generator_url: Option<String>,
}

/// List of alerts
pub type GettableAlerts = Vec<GettableAlert>;

/// Alerts grouped by routing labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertGroup {
    /// Group-by labels shared by the group
    pub labels: LabelSet,
    /// Receiver the group is routed to
    pub receiver: Receiver,
    /// Alerts in the group
    pub alerts: Vec<GettableAlert>,
}

/// List of alert groups
pub type AlertGroups = Vec<AlertGroup>;

/// Query parameters for alert and alert group reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertQuery {
    /// Include active alerts
    pub active: bool,
    /// Include silenced alerts
    pub silenced: bool,
    /// Include inhibited alerts
    pub inhibited: bool,
    /// Matchers in `name="value"` form
    pub filter: Vec<String>,
    /// Regular expression restricting receivers; empty means all
    pub receiver: String,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            active: true,
            silenced: true,
            inhibited: true,
            filter: Vec::new(),
            receiver: String::new(),
        }
    }
}

impl AlertQuery {
    /// Query string pairs in the order the v2 API documents them.
    ///
    /// Booleans are always sent, `filter` repeats per matcher and an empty
    /// receiver is omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("active", self.active.to_string()),
            ("silenced", self.silenced.to_string()),
            ("inhibited", self.inhibited.to_string()),
        ];
        pairs.extend(self.filter.iter().map(|f| ("filter", f.clone())));
        if !self.receiver.is_empty() {
            pairs.push(("receiver", self.receiver.clone()));
        }
        pairs
    }
}
