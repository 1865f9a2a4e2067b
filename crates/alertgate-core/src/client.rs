//! Alertmanager v2 API binding
//!
//! [`AlertmanagerApi`] is the seam between the gateway and the wire protocol.
//! [`V2Client`] implements it over HTTP against `{base}/api/v2`.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::models::{
    AlertGroups, AlertQuery, GettableAlerts, GettableSilence, GettableSilences, PostSilenceResponse,
    PostableSilence, Receiver,
};
use crate::transport::TenantTransport;

/// Base path of the v2 API relative to the Alertmanager URL
pub const API_V2_BASE_PATH: &str = "/api/v2";

/// Operations of the remote Alertmanager v2 API used by the gateway
#[async_trait]
pub trait AlertmanagerApi: Send + Sync {
    /// `POST /silences`, returns the silence id
    async fn post_silence(&self, silence: &PostableSilence) -> Result<String>;

    /// `GET /silence/{id}`
    async fn get_silence(&self, silence_id: &str) -> Result<GettableSilence>;

    /// `GET /silences`
    async fn get_silences(&self, filter: &[String]) -> Result<GettableSilences>;

    /// `DELETE /silence/{id}`
    async fn delete_silence(&self, silence_id: &str) -> Result<()>;

    /// `GET /alerts`
    async fn get_alerts(&self, query: &AlertQuery) -> Result<GettableAlerts>;

    /// `GET /alerts/groups`
    async fn get_alert_groups(&self, query: &AlertQuery) -> Result<AlertGroups>;

    /// `GET /receivers`
    async fn get_receivers(&self) -> Result<Vec<Receiver>>;
}

/// HTTP implementation of [`AlertmanagerApi`]
#[derive(Clone)]
pub struct V2Client {
    transport: TenantTransport,
    base: Url,
}

impl V2Client {
    /// Create a client for the Alertmanager at `url`
    pub fn new(url: &Url, transport: TenantTransport) -> Result<Self> {
        if url.cannot_be_a_base() {
            return Err(Error::config(format!("invalid Alertmanager URL: {url}")));
        }

        let mut base = url.clone();
        let path = format!("{}{}", base.path().trim_end_matches('/'), API_V2_BASE_PATH);
        base.set_path(&path);

        Ok(Self { transport, base })
    }

    /// Base URL of the v2 API
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(operation, status.as_u16(), body));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, operation: &str) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(operation, e))?;

        serde_json::from_slice(&bytes).map_err(|e| Error::serialization(operation, e))
    }
}

#[async_trait]
impl AlertmanagerApi for V2Client {
    async fn post_silence(&self, silence: &PostableSilence) -> Result<String> {
        const OP: &str = "creating silence";
        let url = self.endpoint(&["silences"]);
        debug!(url = %url, "Posting silence");

        let response = self.send(self.transport.post(url).json(silence), OP).await?;
        let payload: PostSilenceResponse = Self::decode(response, OP).await?;
        Ok(payload.silence_id)
    }

    async fn get_silence(&self, silence_id: &str) -> Result<GettableSilence> {
        const OP: &str = "getting silence";
        let url = self.endpoint(&["silence", silence_id]);

        let response = self.send(self.transport.get(url), OP).await?;
        Self::decode(response, OP).await
    }

    async fn get_silences(&self, filter: &[String]) -> Result<GettableSilences> {
        const OP: &str = "listing silences";
        let url = self.endpoint(&["silences"]);
        let query: Vec<(&str, &str)> = filter.iter().map(|f| ("filter", f.as_str())).collect();

        let response = self.send(self.transport.get(url).query(&query), OP).await?;
        Self::decode(response, OP).await
    }

    async fn delete_silence(&self, silence_id: &str) -> Result<()> {
        const OP: &str = "deleting silence";
        let url = self.endpoint(&["silence", silence_id]);

        self.send(self.transport.delete(url), OP).await?;
        Ok(())
    }

    async fn get_alerts(&self, query: &AlertQuery) -> Result<GettableAlerts> {
        const OP: &str = "getting alerts";
        let url = self.endpoint(&["alerts"]);

        let response = self
            .send(self.transport.get(url).query(&query.to_pairs()), OP)
            .await?;
        Self::decode(response, OP).await
    }

    async fn get_alert_groups(&self, query: &AlertQuery) -> Result<AlertGroups> {
        const OP: &str = "getting alert groups";
        let url = self.endpoint(&["alerts", "groups"]);

        let response = self
            .send(self.transport.get(url).query(&query.to_pairs()), OP)
            .await?;
        Self::decode(response, OP).await
    }

    async fn get_receivers(&self) -> Result<Vec<Receiver>> {
        const OP: &str = "getting receivers";
        let url = self.endpoint(&["receivers"]);

        let response = self.send(self.transport.get(url), OP).await?;
        Self::decode(response, OP).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Matcher, SilenceState};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, suffix: &str) -> V2Client {
        let url = Url::parse(&format!("{}{}", server.uri(), suffix)).unwrap();
        V2Client::new(&url, TenantTransport::new("t1", "p1").unwrap()).unwrap()
    }

    fn silence_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "status": {"state": "pending"},
            "updatedAt": "2024-03-01T09:00:00Z",
            "matchers": [{"name": "alertname", "value": "HighCPU", "isRegex": false, "isEqual": true}],
            "startsAt": "2024-03-02T00:00:00Z",
            "endsAt": "2024-03-02T02:00:00Z",
            "createdBy": "ops",
            "comment": "window"
        })
    }

    #[test]
    fn test_base_path_joins_v2() {
        let url = Url::parse("http://mimir:8080/alertmanager/").unwrap();
        let client = V2Client::new(&url, TenantTransport::new("", "").unwrap()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://mimir:8080/alertmanager/api/v2");
        assert_eq!(
            client.endpoint(&["silence", "abc"]).as_str(),
            "http://mimir:8080/alertmanager/api/v2/silence/abc"
        );
    }

    #[tokio::test]
    async fn test_post_silence_returns_id() {
        let server = MockServer::start().await;
        let silence = PostableSilence {
            id: None,
            matchers: vec![Matcher::equal("alertname", "HighCPU")],
            starts_at: "2024-03-02T00:00:00Z".parse().unwrap(),
            ends_at: "2024-03-02T02:00:00Z".parse().unwrap(),
            created_by: "ops".to_string(),
            comment: "window".to_string(),
        };

        Mock::given(method("POST"))
            .and(path("/alertmanager/api/v2/silences"))
            .and(body_json(&silence))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"silenceID": "s-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client_for(&server, "/alertmanager").post_silence(&silence).await.unwrap();
        assert_eq!(id, "s-1");
    }

    #[tokio::test]
    async fn test_get_silence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/silence/s-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(silence_json("s-1")))
            .mount(&server)
            .await;

        let silence = client_for(&server, "").get_silence("s-1").await.unwrap();
        assert_eq!(silence.id, "s-1");
        assert_eq!(silence.status.state, SilenceState::Pending);
    }

    #[tokio::test]
    async fn test_get_silences_sends_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/silences"))
            .and(query_param("filter", "alertname=\"HighCPU\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([silence_json("s-1"), silence_json("s-2")])),
            )
            .mount(&server)
            .await;

        let silences = client_for(&server, "")
            .get_silences(&["alertname=\"HighCPU\"".to_string()])
            .await
            .unwrap();
        assert_eq!(silences.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_silence_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/silence/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("silence not found"))
            .mount(&server)
            .await;

        let err = client_for(&server, "").delete_silence("missing").await.unwrap_err();
        match err {
            Error::Backend { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "silence not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_alerts_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/alerts"))
            .and(query_param("active", "true"))
            .and(query_param("silenced", "false"))
            .and(query_param("inhibited", "false"))
            .and(query_param("receiver", "email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let query = AlertQuery {
            active: true,
            silenced: false,
            inhibited: false,
            filter: vec![],
            receiver: "email".to_string(),
        };
        let alerts = client_for(&server, "").get_alerts(&query).await.unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_get_alert_groups_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/alerts/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "labels": {},
                "receiver": {"name": "default"},
                "alerts": []
            }])))
            .mount(&server)
            .await;

        let groups = client_for(&server, "")
            .get_alert_groups(&AlertQuery::default())
            .await
            .unwrap();
        assert_eq!(groups[0].receiver.name, "default");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_serialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/receivers"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = client_for(&server, "").get_receivers().await.unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[tokio::test]
    async fn test_get_receivers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/receivers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"name": "email"}, {"name": "slack"}])),
            )
            .mount(&server)
            .await;

        let receivers = client_for(&server, "").get_receivers().await.unwrap();
        assert_eq!(
            receivers,
            vec![
                Receiver { name: "email".to_string() },
                Receiver { name: "slack".to_string() }
            ]
        );
    }
}
