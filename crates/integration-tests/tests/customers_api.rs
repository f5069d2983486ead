//! Integration tests for the customers API.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - The server running (cargo run -p clientele-server)
//! - Valid Shopify credentials in the server environment (create pushes
//!   the new customer to the directory)
//!
//! Run with: cargo test -p clientele-integration-tests -- --ignored

use clientele_integration_tests::base_url;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Create a customer and return its JSON representation.
async fn create_test_customer(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/api/v1/customers", base_url()))
        .json(&json!({
            "first_name": "Integration",
            "last_name": "Test",
            "email": email,
        }))
        .send()
        .await
        .expect("Failed to create test customer");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse created customer")
}

#[tokio::test]
#[ignore = "Requires running server, database, and Shopify credentials"]
async fn test_customer_crud_roundtrip() {
    let client = Client::new();
    let email = format!("integration-test-{}@example.com", Uuid::new_v4());

    // Create
    let created = create_test_customer(&client, &email).await;
    let id = created["id"].as_i64().expect("created customer has id");
    assert_eq!(created["email"], email.as_str());
    assert!(created["external_id"].is_null());

    // Read
    let resp = client
        .get(format!("{}/api/v1/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to get customer");
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Value = resp.json().await.expect("Failed to parse customer");
    assert_eq!(fetched["first_name"], "Integration");
    assert_eq!(fetched["companies"], json!([]));

    // Update
    let resp = client
        .put(format!("{}/api/v1/customers/{id}", base_url()))
        .json(&json!({ "first_name": "Updated" }))
        .send()
        .await
        .expect("Failed to update customer");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Failed to parse customer");
    assert_eq!(updated["first_name"], "Updated");
    // Absent fields keep their value
    assert_eq!(updated["last_name"], "Test");

    // Delete
    let resp = client
        .delete(format!("{}/api/v1/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to delete customer");
    assert_eq!(resp.status(), StatusCode::OK);

    // Gone
    let resp = client
        .get(format!("{}/api/v1/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to get customer");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_customer_list_and_search() {
    let client = Client::new();

    let resp = client
        .get(format!("{}/api/v1/customers", base_url()))
        .send()
        .await
        .expect("Failed to list customers");
    assert_eq!(resp.status(), StatusCode::OK);
    let all: Value = resp.json().await.expect("Failed to parse list");
    assert!(all.is_array());

    // A search that cannot match anything returns an empty list, not an error
    let resp = client
        .get(format!(
            "{}/api/v1/customers?search=no-such-customer-{}",
            base_url(),
            Uuid::new_v4()
        ))
        .send()
        .await
        .expect("Failed to search customers");
    assert_eq!(resp.status(), StatusCode::OK);
    let matches: Value = resp.json().await.expect("Failed to parse search result");
    assert_eq!(matches, json!([]));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_customer_create_rejects_invalid_email() {
    let client = Client::new();

    let resp = client
        .post(format!("{}/api/v1/customers", base_url()))
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .expect("Failed to post customer");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error body");
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running server, database, and Shopify credentials"]
async fn test_manual_company_association() {
    let client = Client::new();

    // Create a company and a customer
    let resp = client
        .post(format!("{}/api/v1/companies", base_url()))
        .json(&json!({ "name": format!("Assoc Test {}", Uuid::new_v4()), "city": "Springfield" }))
        .send()
        .await
        .expect("Failed to create company");
    assert_eq!(resp.status(), StatusCode::OK);
    let company: Value = resp.json().await.expect("Failed to parse company");
    let company_id = company["id"].as_i64().expect("company has id");

    let email = format!("assoc-test-{}@example.com", Uuid::new_v4());
    let customer = create_test_customer(&client, &email).await;
    let customer_id = customer["id"].as_i64().expect("customer has id");

    // Connect them
    let resp = client
        .post(format!(
            "{}/api/v1/customers/{customer_id}/company/{company_id}",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to connect company");
    assert_eq!(resp.status(), StatusCode::OK);
    let connected: Value = resp.json().await.expect("Failed to parse customer");
    let companies = connected["companies"].as_array().expect("companies array");
    assert!(
        companies
            .iter()
            .any(|c| c["id"].as_i64() == Some(company_id))
    );

    // Connecting to a missing company is a 404
    let resp = client
        .post(format!(
            "{}/api/v1/customers/{customer_id}/company/999999999",
            base_url()
        ))
        .send()
        .await
        .expect("Failed to post connect");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
