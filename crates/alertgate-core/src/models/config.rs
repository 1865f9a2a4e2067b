//! Alerting configuration document models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Template name to template content
pub type TemplateFiles = BTreeMap<String, String>;

/// Complete alerting configuration document: templates plus routing config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostableUserConfig {
    /// Notification templates keyed by file name
    #[serde(default)]
    pub template_files: TemplateFiles,

    /// Structured Alertmanager configuration
    pub alertmanager_config: PostableApiAlertingConfig,
}

/// Structured Alertmanager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostableApiAlertingConfig {
    /// Global settings (SMTP, resolve timeout, ...), kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<serde_json::Value>,

    /// Root of the notification policy tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,

    /// Inhibition rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inhibit_rules: Vec<InhibitRule>,

    /// Named mute time intervals
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mute_time_intervals: Vec<MuteTimeInterval>,

    /// Template file names referenced by the configuration
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<String>,

    /// Notification receivers
    #[serde(default)]
    pub receivers: Vec<PostableApiReceiver>,
}

impl PostableApiAlertingConfig {
    /// Names of all configured receivers
    pub fn receiver_names(&self) -> Vec<&str> {
        self.receivers.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Label match operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// `=`
    #[serde(rename = "=")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
    /// `=~`
    #[serde(rename = "=~")]
    Regexp,
    /// `!~`
    #[serde(rename = "!~")]
    NotRegexp,
}

/// Matcher encoded as a `[name, operator, value]` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMatcher(pub String, pub MatchType, pub String);

/// Node of the notification policy tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Route {
    /// Receiver for alerts matching this node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,

    /// Labels used to group alerts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,

    /// Matchers selecting alerts for this node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_matchers: Vec<ObjectMatcher>,

    /// Names of intervals during which notifications are muted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mute_time_intervals: Vec<String>,

    /// Keep matching sibling nodes after a match
    #[serde(default, rename = "continue", skip_serializing_if = "std::ops::Not::not")]
    pub continue_matching: bool,

    /// Wait before the first notification of a group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_wait: Option<String>,

    /// Wait between notifications for a changed group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_interval: Option<String>,

    /// Wait before repeating an unchanged notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<String>,

    /// Child nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

/// Rule muting target alerts while source alerts fire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InhibitRule {
    /// Matchers for alerts that inhibit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_matchers: Vec<String>,
    /// Matchers for alerts that get inhibited
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_matchers: Vec<String>,
    /// Labels that must be equal on source and target
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equal: Vec<String>,
}

/// Named set of time intervals referenced by routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MuteTimeInterval {
    /// Name referenced by routes
    pub name: String,
    /// Time ranges, kept verbatim
    #[serde(default)]
    pub time_intervals: Vec<serde_json::Value>,
}

/// Receiver with its notification integrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostableApiReceiver {
    /// Receiver name
    pub name: String,
    /// Integrations notified by this receiver
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grafana_managed_receiver_configs: Vec<PostableGrafanaReceiver>,
}

/// Single notification integration (email, slack, webhook, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PostableGrafanaReceiver {
    /// Integration UID
    #[serde(default)]
    pub uid: String,
    /// Integration name
    pub name: String,
    /// Integration type, e.g. `email`
    #[serde(rename = "type")]
    pub kind: String,
    /// Skip the notification sent on resolve
    #[serde(default, rename = "disableResolveMessage")]
    pub disable_resolve_message: bool,
    /// Integration settings, kept verbatim
    #[serde(default)]
    pub settings: serde_json::Value,
    /// Secret settings
    #[serde(
        default,
        rename = "secureSettings",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub secure_settings: BTreeMap<String, String>,
}
