//! Tenant-scoped HTTP transport
//!
//! Every request to the remote Alertmanager goes through [`TenantTransport`],
//! which stamps the tenant header and, when both tenant and password are
//! set, basic auth credentials. Transport errors are returned unchanged.

use reqwest::{Client, IntoUrl, Method, RequestBuilder};

use crate::error::{Error, Result};

/// Header carrying the tenant id
pub const SCOPE_ORG_ID_HEADER: &str = "X-Scope-OrgID";

/// HTTP client decorating every request with tenant scope and credentials
#[derive(Clone)]
pub struct TenantTransport {
    client: Client,
    tenant_id: String,
    basic_auth_password: String,
}

impl TenantTransport {
    /// Create a transport with a default HTTP client
    pub fn new(tenant_id: impl Into<String>, basic_auth_password: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("alertgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, tenant_id, basic_auth_password))
    }

    /// Create a transport around an existing client
    pub fn with_client(
        client: Client,
        tenant_id: impl Into<String>,
        basic_auth_password: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tenant_id: tenant_id.into(),
            basic_auth_password: basic_auth_password.into(),
        }
    }

    /// Tenant this transport is scoped to
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Whether requests carry basic auth credentials
    pub fn uses_basic_auth(&self) -> bool {
        !self.tenant_id.is_empty() && !self.basic_auth_password.is_empty()
    }

    /// Start a decorated request
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(SCOPE_ORG_ID_HEADER, &self.tenant_id);

        if self.uses_basic_auth() {
            builder.basic_auth(&self.tenant_id, Some(&self.basic_auth_password))
        } else {
            builder
        }
    }

    /// Start a decorated GET request
    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a decorated POST request
    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a decorated DELETE request
    pub fn delete<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, header, method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    struct NoAuthorization;

    /// Exact tenant header match, including the empty tenant
    struct Tenant(&'static str);

    impl Match for Tenant {
        fn matches(&self, request: &Request) -> bool {
            request
                .headers
                .get(SCOPE_ORG_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                == Some(self.0)
        }
    }

    impl Match for NoAuthorization {
        fn matches(&self, request: &Request) -> bool {
            !request.headers.contains_key("authorization")
        }
    }

    #[tokio::test]
    async fn test_tenant_and_password_attach_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/probe"))
            .and(header(SCOPE_ORG_ID_HEADER, "t1"))
            .and(basic_auth("t1", "p1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = TenantTransport::new("t1", "p1").unwrap();
        let res = transport
            .get(format!("{}/probe", server.uri()))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn test_empty_tenant_skips_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(Tenant(""))
            .and(NoAuthorization)
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let transport = TenantTransport::new("", "p1").unwrap();
        assert!(!transport.uses_basic_auth());

        let res = transport.post(server.uri()).send().await.unwrap();
        assert_eq!(res.status(), 201);
    }

    #[tokio::test]
    async fn test_empty_password_skips_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(header(SCOPE_ORG_ID_HEADER, "t1"))
            .and(NoAuthorization)
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = TenantTransport::new("t1", "").unwrap();
        transport.delete(server.uri()).send().await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through() {
        let transport = TenantTransport::new("t1", "p1").unwrap();
        let err = transport
            .get("http://127.0.0.1:1/unreachable")
            .send()
            .await
            .unwrap_err();
        assert!(err.is_connect() || err.is_request());
    }
}
