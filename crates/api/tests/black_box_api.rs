use reqwest::StatusCode;
use serde_json::{json, Value};

use splitledger_api::config::AppConfig;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod (in-memory stores), bound to an ephemeral port.
        let app = splitledger_api::app::build_app(&AppConfig::default())
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn register(&self, name: &str) -> Value {
        let email = format!("{}@example.com", name.to_lowercase());
        let (status, body) = self.post("/users", json!({ "name": name, "email": email })).await;
        assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
        body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn cents(v: &Value) -> i64 {
    (v.as_f64().expect("amount is a number") * 100.0).round() as i64
}

#[tokio::test]
async fn health_reports_backend() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(format!("{}/health", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["backend"], "in_memory");
}

#[tokio::test]
async fn caller_request_id_is_echoed() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(format!("{}/health", srv.base_url))
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn user_lifecycle_create_fetch_conflict() {
    let srv = TestServer::spawn().await;

    let alice = srv.register("Alice").await;
    assert_eq!(alice["email"], "alice@example.com");
    let id = alice["id"].as_i64().unwrap();

    let (status, by_id) = srv.get(&format!("/users/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["name"], "Alice");

    let (status, by_email) = srv.get("/users/by-email?email=ALICE@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_email["id"], id);

    let (status, body) = srv
        .post("/users", json!({ "name": "Alice Again", "email": "alice@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = srv.get("/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = srv.get("/users/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn invalid_user_is_rejected() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.post("/users", json!({ "name": "NoAt", "email": "not-an-email" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn equal_expense_updates_both_sides_of_the_balance() {
    let srv = TestServer::spawn().await;
    srv.register("Alice").await;
    srv.register("Bob").await;
    srv.register("Carol").await;

    let (status, expense) = srv
        .post(
            "/expenses",
            json!({
                "description": "Dinner",
                "tag": "food",
                "total_amount": 100.0,
                "created_by_email": "alice@example.com",
                "split_method": "equal",
                "participants": [
                    { "email": "alice@example.com", "amount_paid": 100.0 },
                    { "email": "bob@example.com" },
                    { "email": "carol@example.com" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{expense}");
    assert_eq!(expense["tag"], "food");
    let owed = expense["splits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| cents(&s["amount_owed"]))
        .collect::<Vec<_>>();
    assert_eq!(owed, vec![3334, 3333, 3333]);

    let (status, bob) = srv.get("/balances/by-user/bob@example.com").await;
    assert_eq!(status, StatusCode::OK);
    let items = bob["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["counterparty"]["email"], "alice@example.com");
    assert_eq!(cents(&items[0]["amount"]), 3333);

    let (_, alice) = srv.get("/balances/by-user/alice@example.com").await;
    let items = alice["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| cents(&item["amount"]) == -3333));

    let (status, history) = srv.get("/expenses/by-user/bob@example.com").await;
    assert_eq!(status, StatusCode::OK);
    let items = history["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["description"], "Dinner");
    assert_eq!(cents(&items[0]["share"]), -3333);
}

#[tokio::test]
async fn manual_mismatch_names_both_sums() {
    let srv = TestServer::spawn().await;
    srv.register("Alice").await;
    srv.register("Bob").await;

    let (status, body) = srv
        .post(
            "/expenses",
            json!({
                "description": "Rent",
                "total_amount": 100.0,
                "created_by_email": "alice@example.com",
                "split_method": "manual",
                "participants": [
                    { "email": "alice@example.com", "amount_paid": 100.0, "amount_owed": 60.0 },
                    { "email": "bob@example.com", "amount_owed": 30.0 }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(
        body["message"],
        "manual split amounts (90.00) must sum up to total amount (100.00)"
    );

    let (_, balances) = srv.get("/balances/by-user/bob@example.com").await;
    assert!(balances["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_split_method_and_participant_are_validation_errors() {
    let srv = TestServer::spawn().await;
    srv.register("Alice").await;

    let mut request = json!({
        "description": "Taxi",
        "total_amount": 20.0,
        "created_by_email": "alice@example.com",
        "split_method": "shares",
        "participants": [
            { "email": "alice@example.com", "amount_paid": 20.0 },
            { "email": "ghost@example.com" }
        ]
    });

    let (status, body) = srv.post("/expenses", request.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid split method: shares");

    request["split_method"] = json!("equal");
    let (status, body) = srv.post("/expenses", request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "participant not found: ghost@example.com");
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(format!("{}/expenses", srv.base_url))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
}

#[tokio::test]
async fn reads_for_unknown_users_are_not_found() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/balances/by-user/nobody@example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = srv.get("/expenses/by-user/nobody@example.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
