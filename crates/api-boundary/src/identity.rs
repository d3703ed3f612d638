//! Identity gateway: credential exchange with the provider.

use crate::types::{AuthResponse, LoginRequest, RegisterRequest};
use crate::{ApiClient, ApiResult, RequestOptions};

/// Stateless wrapper over the `/auth/*` endpoints.
#[derive(Clone)]
pub struct IdentityGateway {
    client: ApiClient,
}

impl IdentityGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange email and password for a token pair.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let options = RequestOptions::post().with_json(&LoginRequest { email, password })?;
        self.client.request_json("/auth/login", options).await
    }

    /// Create an account. Provider messages such as "email already taken" are
    /// carried unchanged in the error.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthResponse> {
        let options = RequestOptions::post().with_json(&RegisterRequest {
            name,
            email,
            password,
        })?;
        self.client.request_json("/auth/register", options).await
    }

    /// Trade a still-valid token for a fresh pair.
    pub async fn refresh(&self, token: &str) -> ApiResult<AuthResponse> {
        let options = RequestOptions::post().with_auth(token);
        self.client.request_json("/auth/refresh", options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_body(token: &str) -> serde_json::Value {
        json!({
            "accessToken": token,
            "refreshToken": "R",
            "user": {"id": "u1", "email": "a@b.com", "name": "Ada"}
        })
    }

    async fn gateway(server: &MockServer) -> IdentityGateway {
        IdentityGateway::new(ApiClient::new(server.uri()).unwrap())
    }

    #[tokio::test]
    async fn test_login_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "a@b.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T")))
            .expect(1)
            .mount(&server)
            .await;

        let response = gateway(&server).await.login("a@b.com", "pw").await.unwrap();

        assert_eq!(response.access_token, "T");
        assert_eq!(response.refresh_token.as_deref(), Some("R"));
        assert_eq!(response.user.id, "u1");
    }

    #[tokio::test]
    async fn test_login_sends_no_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("T")))
            .mount(&server)
            .await;

        gateway(&server).await.login("a@b.com", "pw").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_register_surfaces_conflict_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({"name": "Ada", "email": "a@b.com", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "email already taken"})),
            )
            .mount(&server)
            .await;

        let err = gateway(&server)
            .await
            .register("Ada", "a@b.com", "pw")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(err.to_string(), "email already taken");
    }

    #[tokio::test]
    async fn test_refresh_uses_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(header("authorization", "Bearer OLD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("NEW")))
            .expect(1)
            .mount(&server)
            .await;

        let response = gateway(&server).await.refresh("OLD").await.unwrap();
        assert_eq!(response.access_token, "NEW");
    }
}
