use reqwest::StatusCode;

use serde_json::{json, Value};

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{entry_body, TestApp};

#[tokio::test]
async fn entry_creates_a_customer_when_none_exists() {
    let app = TestApp::spawn().await;

    let customer_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/customer"))
        .and(query_param("q", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "customers": [] })))
        .expect(1)
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": customer_id,
            "firstName": "Jane",
            "lastName": "Doe",
        })))
        .expect(1)
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/profiles/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.marketing_server)
        .await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!(customer_id), body["customerId"]);
    assert_eq!(json!(true), body["integrations"]["commerce7"]);
    assert_eq!(json!(true), body["integrations"]["klaviyo"]);

    let create_bodies = app.commerce_request_bodies("POST").await;
    assert_eq!(1, create_bodies.len());

    let create = &create_bodies[0];
    assert_eq!(json!([{ "email": "jane@example.com" }]), create["emails"]);
    assert_eq!(json!([{ "phone": "+15551234567" }]), create["phones"]);
    assert_eq!(json!([{ "id": app.contest_tag_id }]), create["tags"]);
    assert_eq!(json!("Subscribed"), create["emailMarketingStatus"]);
    assert_eq!(json!("US"), create["countryCode"]);
    assert_eq!(json!({ "source": "wine-festival-contest" }), create["metaData"]);
}

#[tokio::test]
async fn repeat_entry_updates_the_existing_customer() {
    let app = TestApp::spawn().await;

    let customer_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customers": [{
                "id": customer_id,
                "firstName": "Jane",
                "lastName": "Doe",
                "tags": [{ "id": app.contest_tag_id }],
                "metaData": {
                    "source": "an-earlier-campaign",
                    "contest_prize": "A prize that should not persist",
                },
            }],
        })))
        .expect(1)
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/customer/{}", customer_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": customer_id })))
        .expect(1)
        .mount(&app.commerce_server)
        .await;
    // A hit on the search must never fall through to a second create
    Mock::given(method("POST"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/profiles/"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&app.marketing_server)
        .await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(customer_id), body["customerId"]);

    let update_bodies = app.commerce_request_bodies("PUT").await;
    assert_eq!(1, update_bodies.len());

    let update = &update_bodies[0];
    // Tag identity is by id: entering again must not duplicate it
    assert_eq!(json!([{ "id": app.contest_tag_id }]), update["tags"]);
    assert_eq!(json!({ "source": "wine-festival-contest" }), update["metaData"]);
    assert_eq!(json!("Subscribed"), update["emailMarketingStatus"]);
    assert_eq!(json!([{ "phone": "+15551234567" }]), update["phones"]);
    assert!(update.get("emails").is_none());
}

#[tokio::test]
async fn missing_fields_are_rejected_without_outbound_calls() {
    let app = TestApp::spawn().await;

    let test_cases = vec![
        ("missing first name", json!({ "lastName": "Doe", "email": "jane@example.com" })),
        ("missing last name", json!({ "firstName": "Jane", "email": "jane@example.com" })),
        ("missing email", json!({ "firstName": "Jane", "lastName": "Doe" })),
        (
            "blank first name",
            json!({ "firstName": "  ", "lastName": "Doe", "email": "jane@example.com" }),
        ),
        ("empty body", json!({})),
    ];

    for (desc, entry) in test_cases {
        let res = app
            .entry_create(&entry)
            .await
            .expect("Failed to execute request");

        assert_eq!(
            StatusCode::BAD_REQUEST,
            res.status(),
            "API did not fail when payload was {}",
            desc
        );

        let body: Value = res.json().await.expect("Failed to parse response body");
        assert_eq!(
            json!("First name, last name, and email are required"),
            body["error"]
        );
    }

    assert!(app
        .commerce_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
    assert!(app
        .marketing_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn marketing_failure_does_not_fail_the_entry() {
    let app = TestApp::spawn().await;

    let customer_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "customers": [] })))
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": customer_id })))
        .mount(&app.commerce_server)
        .await;
    // Ensure that the profile mirror fails
    Mock::given(method("POST"))
        .and(path("/profiles/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.marketing_server)
        .await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!(true), body["integrations"]["commerce7"]);
    assert_eq!(json!(false), body["integrations"]["klaviyo"]);
}

#[tokio::test]
async fn search_failure_still_creates_the_customer() {
    let app = TestApp::spawn().await;

    let customer_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": customer_id })))
        .expect(1)
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/profiles/"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&app.marketing_server)
        .await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!(customer_id), body["customerId"]);
}

#[tokio::test]
async fn entry_succeeds_without_commerce_configuration() {
    let app = TestApp::spawn_without_commerce().await;

    Mock::given(method("POST"))
        .and(path("/profiles/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.marketing_server)
        .await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::OK, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(true), body["success"]);
    assert_eq!(json!(false), body["integrations"]["commerce7"]);
    assert_eq!(json!(true), body["integrations"]["klaviyo"]);
    assert!(body.get("customerId").is_none());

    assert!(app
        .commerce_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn missing_tag_configuration_is_a_server_error() {
    let app = TestApp::spawn_without_tag().await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(false), body["debug"]["hasTagId"]);
    assert_eq!(json!(true), body["debug"]["hasAppId"]);
    assert_eq!(json!(true), body["debug"]["hasSecretKey"]);
    assert_eq!(json!("test-tenant"), body["debug"]["tenantId"]);

    // The precondition fails before any network call is attempted
    assert!(app
        .commerce_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn platform_validation_errors_surface_in_details() {
    let app = TestApp::spawn().await;

    Mock::given(method("GET"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "customers": [] })))
        .mount(&app.commerce_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/customer"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation failed",
            "errors": [{ "field": "phones", "message": "Invalid phone number" }],
        })))
        .mount(&app.commerce_server)
        .await;

    let res = app
        .entry_create(&entry_body())
        .await
        .expect("Failed to execute request");

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, res.status());

    let body: Value = res.json().await.expect("Failed to parse response body");
    assert_eq!(json!(422), body["status"]);
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("phones: Invalid phone number"));
    assert_eq!(json!(true), body["debug"]["hasTagId"]);
}
