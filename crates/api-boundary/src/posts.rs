//! Posts gateway: the public feed and publishing.

use crate::types::{CreatePost, Post};
use crate::{ApiClient, ApiResult, RequestOptions};

const POSTS_PATH: &str = "/posts";

#[derive(Clone)]
pub struct PostsGateway {
    client: ApiClient,
}

impl PostsGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the feed, newest first as ordered by the provider. Anonymous
    /// callers pass `None`.
    pub async fn feed(&self, token: Option<&str>) -> ApiResult<Vec<Post>> {
        let mut options = RequestOptions::get();
        if let Some(token) = token {
            options = options.with_auth(token);
        }
        self.client.request_json(POSTS_PATH, options).await
    }

    pub async fn create(&self, token: &str, content: impl Into<String>) -> ApiResult<Post> {
        let body = CreatePost {
            content: content.into(),
        };
        let options = RequestOptions::post().with_auth(token).with_json(&body)?;
        self.client.request_json(POSTS_PATH, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post_json(id: &str, content: &str) -> serde_json::Value {
        json!({
            "id": id,
            "authorId": "u1",
            "authorName": "Ada",
            "content": content,
            "createdAt": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_anonymous_feed_has_no_auth_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([post_json("p2", "second"), post_json("p1", "first")])),
            )
            .mount(&server)
            .await;

        let gateway = PostsGateway::new(ApiClient::new(server.uri()).unwrap());
        let posts = gateway.feed(None).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "p2");

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_feed_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(header("authorization", "Bearer T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = PostsGateway::new(ApiClient::new(server.uri()).unwrap());
        assert!(gateway.feed(Some("T")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header("authorization", "Bearer T"))
            .and(body_json(json!({"content": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(post_json("p9", "hello")))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = PostsGateway::new(ApiClient::new(server.uri()).unwrap());
        let post = gateway.create("T", "hello").await.unwrap();

        assert_eq!(post.id, "p9");
        assert_eq!(post.content, "hello");
    }
}
