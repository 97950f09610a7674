use amity::api;
use amity::application_impl::FakeIdentityProvider;
use amity::server::Server;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

struct Client {
    server: Arc<Server>,
}

impl Client {
    fn new() -> Self {
        Client {
            server: Arc::new(Server::in_memory()),
        }
    }

    async fn call(
        &self,
        method: &str,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let filter = warp::path("api")
            .and(warp::path("v1"))
            .and(api::v1::routes(self.server.clone()))
            .recover(api::v1::recover_error);

        let mut request = warp::test::request()
            .method(method)
            .path(&format!("/api/v1{path}"));
        if let Some(user) = user {
            request = request.header(
                "authorization",
                format!("Bearer {}", FakeIdentityProvider::token_for(user)),
            );
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.reply(&filter).await;
        let value = serde_json::from_slice(response.body()).unwrap();
        (response.status(), value)
    }

    async fn sign_in(&self, user: &str) {
        let (status, _) = self.call("PUT", "/me", Some(user), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn send(&self, from: &str, to: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/friends/requests",
            Some(from),
            Some(json!({ "username": to })),
        )
        .await
    }
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

#[tokio::test]
async fn health_needs_no_token() {
    let client = Client::new();
    let (status, body) = client.call("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn me_requires_sync_first() {
    let client = Client::new();

    let (status, body) = client.call("GET", "/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");

    client.sign_in("Alice").await;
    let (status, body) = client.call("GET", "/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "Alice");
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() {
    let client = Client::new();

    let (status, body) = client.call("GET", "/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");

    let filter = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(client.server.clone()))
        .recover(api::v1::recover_error);
    let response = warp::test::request()
        .path("/api/v1/friends")
        .header("authorization", "Bearer not-a-token")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn friend_request_lifecycle() {
    let client = Client::new();
    client.sign_in("alice").await;
    client.sign_in("bob").await;

    let (status, body) = client.send("alice", "BOB").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    let request_id = body["data"]["request_id"].as_str().unwrap().to_string();

    let (_, incoming) = client
        .call("GET", "/friends/requests/incoming", Some("bob"), None)
        .await;
    let incoming = incoming["data"].as_array().unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["friend"]["username"], "alice");
    assert_eq!(incoming[0]["direction"], "incoming");

    let (_, alice_incoming) = client
        .call("GET", "/friends/requests/incoming", Some("alice"), None)
        .await;
    assert!(alice_incoming["data"].as_array().unwrap().is_empty());

    let (_, outgoing) = client
        .call("GET", "/friends/requests/outgoing", Some("alice"), None)
        .await;
    assert_eq!(outgoing["data"][0]["friend"]["username"], "bob");

    let (status, body) = client.send("bob", "alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "Conflict");

    let (status, body) = client
        .call(
            "POST",
            &format!("/friends/requests/{request_id}/accept"),
            Some("bob"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    for user in ["alice", "bob"] {
        let (_, friends) = client.call("GET", "/friends", Some(user), None).await;
        let friends = friends["data"].as_array().unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0]["request_id"], request_id.as_str());
    }

    let path = format!("/friends/{request_id}/conversation");
    let (status, from_alice) = client.call("POST", &path, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, from_bob) = client.call("POST", &path, Some("bob"), None).await;
    assert_eq!(
        from_alice["data"]["conversation_id"],
        from_bob["data"]["conversation_id"]
    );

    let path = format!("/friends/{request_id}");
    let (status, body) = client.call("DELETE", &path, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "removed");

    let (status, body) = client.call("DELETE", &path, Some("alice"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "InvalidState");

    let (_, friends) = client.call("GET", "/friends", Some("alice"), None).await;
    assert!(friends["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rejected_request_can_be_sent_again() {
    let client = Client::new();
    client.sign_in("alice").await;
    client.sign_in("bob").await;

    let (_, body) = client.send("alice", "bob").await;
    let request_id = body["data"]["request_id"].as_str().unwrap().to_string();

    let reject = format!("/friends/requests/{request_id}/reject");
    let (status, _) = client.call("POST", &reject, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = client.call("POST", &reject, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "rejected");

    let accept = format!("/friends/requests/{request_id}/accept");
    let (status, body) = client.call("POST", &accept, Some("bob"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "InvalidState");

    let (status, _) = client.send("alice", "bob").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn bad_send_requests() {
    let client = Client::new();
    client.sign_in("alice").await;

    let (status, body) = client.send("alice", "ALICE").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "InvalidArgument");

    let (status, body) = client.send("alice", "nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");

    let (status, body) = client.send("alice", "no spaces allowed").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "InvalidArgument");

    let (status, body) = client
        .call(
            "POST",
            "/friends/requests",
            Some("alice"),
            Some(json!({ "name": "bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "InvalidArgument");
}

#[tokio::test]
async fn unknown_routes_and_ids_are_not_found() {
    let client = Client::new();
    client.sign_in("alice").await;

    let (status, _) = client.call("GET", "/nope", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = client
        .call("POST", "/friends/requests/not-a-uuid/accept", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = uuid::Uuid::new_v4();
    let (status, body) = client
        .call(
            "POST",
            &format!("/friends/requests/{missing}/accept"),
            Some("alice"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");
}
