//! Receiver, status and test request models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LabelSet, PostableAlert, PostableApiAlertingConfig, PostableApiReceiver};

/// Notification receiver reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Receiver {
    /// Receiver name
    pub name: String,
}

/// Status of the Alertmanager.
///
/// The remote gateway does not expose the backend status; an empty value is
/// returned instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GettableStatus {
    /// Cluster peer status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<serde_json::Value>,
    /// Applied configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PostableApiAlertingConfig>,
    /// Start time of the Alertmanager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<DateTime<Utc>>,
    /// Build information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_info: Option<serde_json::Value>,
}

/// Alert used when testing receivers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestReceiversConfigAlertParams {
    /// Annotations of the test alert
    #[serde(default)]
    pub annotations: LabelSet,
    /// Labels of the test alert
    #[serde(default)]
    pub labels: LabelSet,
}

/// Request to send a test notification through receivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TestReceiversConfigBodyParams {
    /// Test alert, a default one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<TestReceiversConfigAlertParams>,
    /// Receivers to test
    #[serde(default)]
    pub receivers: Vec<PostableApiReceiver>,
}

/// Outcome of testing one integration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestIntegrationResult {
    /// Integration name
    pub name: String,
    /// Integration UID
    pub uid: String,
    /// Outcome, e.g. `ok` or `failed`
    pub status: String,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of testing one receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestReceiverResult {
    /// Receiver name
    pub name: String,
    /// Per-integration outcomes
    #[serde(default)]
    pub configs: Vec<TestIntegrationResult>,
}

/// Result of a receivers test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestReceiversResult {
    /// Alert that was sent
    pub alert: TestReceiversConfigAlertParams,
    /// Per-receiver outcomes
    pub receivers: Vec<TestReceiverResult>,
    /// When the notifications were sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
}

/// Request to render a notification template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestTemplatesConfigBodyParams {
    /// Alerts the template is rendered with
    #[serde(default)]
    pub alerts: Vec<PostableAlert>,
    /// Template source
    pub template: String,
    /// Template name
    pub name: String,
}

/// Rendered template output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestTemplatesResult {
    /// Template name
    pub name: String,
    /// Rendered output
    pub text: String,
}

/// Template rendering failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestTemplatesErrorResult {
    /// Template name
    pub name: String,
    /// Error kind
    pub kind: String,
    /// Error message
    pub message: String,
}

/// Result of a templates test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TestTemplatesResults {
    /// Successfully rendered templates
    #[serde(default)]
    pub results: Vec<TestTemplatesResult>,
    /// Templates that failed to render
    #[serde(default)]
    pub errors: Vec<TestTemplatesErrorResult>,
}
