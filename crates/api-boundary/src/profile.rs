//! Profile gateway: the signed-in user's own record.

use crate::types::{UpdateProfile, User};
use crate::{ApiClient, ApiResult, RequestOptions};

const CURRENT_USER_PATH: &str = "/users/me";

#[derive(Clone)]
pub struct ProfileGateway {
    client: ApiClient,
}

impl ProfileGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the user the token belongs to. Also serves as token validation.
    pub async fn get_current(&self, token: &str) -> ApiResult<User> {
        let options = RequestOptions::get().with_auth(token);
        self.client.request_json(CURRENT_USER_PATH, options).await
    }

    pub async fn update_profile(&self, token: &str, update: &UpdateProfile) -> ApiResult<User> {
        let options = RequestOptions::put().with_auth(token).with_json(update)?;
        self.client.request_json(CURRENT_USER_PATH, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_current_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("authorization", "Bearer T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "a@b.com", "name": "Ada", "bio": "hi"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(format!("{}/api/", server.uri())).unwrap();
        let user = ProfileGateway::new(client).get_current("T").await.unwrap();

        assert_eq!(user.name, "Ada");
        assert_eq!(user.bio.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_get_current_rejected_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "expired"})))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let err = ProfileGateway::new(client).get_current("T").await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(err.to_string(), "expired");
    }

    #[tokio::test]
    async fn test_update_profile_sends_only_present_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer T"))
            .and(body_json(json!({"name": "Ada L."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1", "email": "a@b.com", "name": "Ada L."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let update = UpdateProfile {
            name: Some("Ada L.".to_string()),
            bio: None,
        };
        let user = ProfileGateway::new(client)
            .update_profile("T", &update)
            .await
            .unwrap();

        assert_eq!(user.name, "Ada L.");
    }
}
