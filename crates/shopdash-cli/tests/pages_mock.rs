//! Integration tests for the page commands against a mock API.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a stored session the way `shopdash login` leaves it.
fn write_session(home: &Path) {
    let user = json!({"email": "a@b.com", "storeName": "Acme"}).to_string();
    let session = json!({"token": "t1", "user": user});
    fs::write(home.join("session.json"), session.to_string()).unwrap();
}

fn read_session(home: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(home.join("session.json")).unwrap()).unwrap()
}

fn plain_theme(home: &Path) {
    fs::write(home.join("config.toml"), "theme = \"plain\"\n").unwrap();
}

async fn mount_dashboard(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCustomers": 41,
            "totalOrders": 1250,
            "totalProducts": 12,
            "totalRevenue": 98765.4,
            "revenueToday": 120
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/top-customers"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Ada Lovelace", "email": "ada@x.test", "ordersCount": 30, "totalSpent": 7200}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/orders-by-date"))
        .and(query_param("startDate", "2024-01-01"))
        .and(query_param("endDate", "2024-01-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2024-01-15", "orders": 4}
        ])))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dashboard_renders_with_stored_session() {
    let server = MockServer::start().await;
    mount_dashboard(&server).await;
    let home = TempDir::new().unwrap();
    write_session(home.path());
    plain_theme(home.path());

    cargo_bin_cmd!("shopdash")
        .env("SHOPDASH_HOME", home.path())
        .env("SHOPDASH_API_URL", format!("{}/api", server.uri()))
        .args(["dashboard", "--start", "2024-01-01", "--end", "2024-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$98,765.40"))
        .stdout(predicate::str::contains("Ada Lovelace"))
        .stdout(predicate::str::contains("High Value"))
        .stdout(predicate::str::contains("2024-01-15"));
}

#[test]
fn test_page_without_session_asks_for_login() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("shopdash")
        .env("SHOPDASH_HOME", home.path())
        .env("SHOPDASH_API_URL", "http://127.0.0.1:1/api")
        .arg("products")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_is_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products/inventory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    write_session(home.path());

    cargo_bin_cmd!("shopdash")
        .env("SHOPDASH_HOME", home.path())
        .env("SHOPDASH_API_URL", format!("{}/api", server.uri()))
        .arg("products")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session expired"));

    let stored = read_session(home.path());
    assert!(stored.get("token").is_none());
    assert!(stored.get("user").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_customers_passes_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/segments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "highValue": 3, "mediumValue": 10, "lowValue": 28, "total": 41
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .and(query_param("page", "1"))
        .and(query_param("size", "20"))
        .and(query_param("sortBy", "totalSpent"))
        .and(query_param("sortDir", "desc"))
        .and(query_param("segment", "high"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customers": [
                {"id": 9, "name": "Grace Hopper", "email": "grace@x.test", "ordersCount": 12, "totalSpent": 6100}
            ],
            "totalPages": 2,
            "totalItems": 21
        })))
        .expect(1)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    write_session(home.path());
    plain_theme(home.path());

    cargo_bin_cmd!("shopdash")
        .env("SHOPDASH_HOME", home.path())
        .env("SHOPDASH_API_URL", format!("{}/api", server.uri()))
        .args(["customers", "--segment", "high", "--page", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grace Hopper"))
        .stdout(predicate::str::contains("Page 2 of 2 (21 customers, segment: high)"));

    let requests = server.received_requests().await.unwrap();
    let list = requests
        .iter()
        .find(|r| r.url.path() == "/api/customers")
        .unwrap();
    assert!(list.url.query_pairs().all(|(k, _)| k != "search"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sync_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/shopify/sync"))
        .respond_with(
            ResponseTemplate::new(502).set_body_json(json!({"message": "Shopify unreachable"})),
        )
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    write_session(home.path());

    cargo_bin_cmd!("shopdash")
        .env("SHOPDASH_HOME", home.path())
        .env("SHOPDASH_API_URL", format!("{}/api", server.uri()))
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Sync failed: HTTP 502: Shopify unreachable",
        ));

    assert_eq!(read_session(home.path())["token"], "t1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_not_an_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customers/segments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    write_session(home.path());

    cargo_bin_cmd!("shopdash")
        .env("SHOPDASH_HOME", home.path())
        .env("SHOPDASH_API_URL", format!("{}/api", server.uri()))
        .arg("customers")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load customers: HTTP 500"));

    assert_eq!(read_session(home.path())["token"], "t1");
}
