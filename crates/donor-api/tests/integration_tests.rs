//! Integration tests for donor-api against a mocked backend.

use chrono::{TimeZone, Utc};
use donor_api::{
    ApiClient, ApiConfig, ApiError, NewPledge, PledgeQuery, PledgeUpdate, RequestQuery, UserQuery,
};
use donor_core::{BloodType, CancellationReason, EvolutionStatus, ProfilePatch};
use httpmock::prelude::*;
use secrecy::SecretString;
use serde_json::json;

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig::new(server.url("/api"))).unwrap()
}

#[tokio::test]
async fn test_login_normalizes_response() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/auth/login")
            .json_body(json!({"email": "amina@example.com", "password": "Secret#123"}));
        then.status(200).json_body(json!({
            "token": "tok-1",
            "userId": 42,
            "user": {"email": "amina@example.com", "donorNIN": "123456789012345"}
        }));
    });

    let password = SecretString::from("Secret#123".to_string());
    let login = client(&server)
        .login(" amina@example.com ", &password)
        .await
        .unwrap();

    mock.assert_calls(1);
    assert_eq!(login.token, "tok-1");
    assert_eq!(login.user_id.as_deref(), Some("42"));
    assert_eq!(login.national_id.as_deref(), Some("123456789012345"));
}

#[tokio::test]
async fn test_login_rejected_carries_server_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/auth/login");
        then.status(401).json_body(json!({"message": "Invalid email or password"}));
    });

    let password = SecretString::from("nope".to_string());
    let err = client(&server).login("x@y.dz", &password).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid email or password");
}

#[tokio::test]
async fn test_list_users_sends_token_and_skips_bad_records() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/users")
            .header("authorization", "Bearer tok-1")
            .header("cookie", "token=tok-1");
        then.status(200).json_body(json!({
            "items": [
                {"id": 1, "email": "a@example.com", "bloodType": 8},
                {"email": "no-id@example.com"},
                {"userId": "2", "email": "b@example.com", "bloodType": "A+"}
            ]
        }));
    });

    let api = client(&server);
    let users = api
        .authorized("tok-1")
        .list_users(&UserQuery::default())
        .await
        .unwrap();

    mock.assert_calls(1);
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].blood_type, Some(BloodType::ONegative));
    assert_eq!(users[1].id, "2");
}

#[tokio::test]
async fn test_update_profile_sends_patch_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/donor/profile")
            .json_body(json!({"bloodType": 8, "communeId": 3101}));
        then.status(204);
    });

    let patch = ProfilePatch {
        blood_type: Some(BloodType::ONegative),
        commune_id: Some(3101),
        ..Default::default()
    };
    let api = client(&server);
    api.authorized("tok").update_profile(&patch).await.unwrap();

    mock.assert_calls(1);
}

#[tokio::test]
async fn test_pledges_with_status_filter() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/Pledges")
            .query_param("evolutionStatus", "0");
        then.status(200).json_body(json!([
            {"id": "p1", "requestId": "r1", "evolutionStatus": 0, "pledgeDate": "2024-04-01T10:00:00"},
            {"id": "p2", "requestId": "r2", "evolutionStatus": 7}
        ]));
    });

    let query = PledgeQuery {
        evolution_status: Some(EvolutionStatus::Initiated),
        ..Default::default()
    };
    let api = client(&server);
    let pledges = api.authorized("tok").pledges(&query).await.unwrap();

    mock.assert_calls(1);
    assert_eq!(pledges.len(), 1);
    assert_eq!(pledges[0].id, "p1");
    assert!(pledges[0].is_active());
}

#[tokio::test]
async fn test_create_pledge_without_echo() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/Pledges")
            .json_body(json!({"requestId": "r1", "pledgeDate": "2030-01-15T09:00:00Z"}));
        then.status(201).body("");
    });

    let pledge = NewPledge {
        request_id: "r1".to_string(),
        pledge_date: Utc.with_ymd_and_hms(2030, 1, 15, 9, 0, 0).unwrap(),
        notes: None,
    };
    let api = client(&server);
    let created = api.authorized("tok").create_pledge(&pledge).await.unwrap();

    mock.assert_calls(1);
    assert!(created.is_none());
}

#[tokio::test]
async fn test_update_pledge_error_uses_first_server_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/api/Pledges/p1")
            .json_body(json!({"evolutionStatus": 2, "cancellationReason": "illness"}));
        then.status(409).json_body(json!({
            "errors": [{"message": "Pledge already closed"}, {"message": "second"}]
        }));
    });

    let reason = CancellationReason::parse("illness").unwrap();
    let api = client(&server);
    let err = api
        .authorized("tok")
        .update_pledge("p1", &PledgeUpdate::cancel(&reason))
        .await
        .unwrap_err();

    mock.assert_calls(1);
    assert!(matches!(err, ApiError::Status { status: 409, ref message } if message == "Pledge already closed"));
}

#[tokio::test]
async fn test_requests_with_query_and_envelope() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/bloodDonationRequests")
            .query_param("wilayaId", "16");
        then.status(200).json_body(json!({
            "data": [
                {"id": 1, "bloodGroup": 8, "wilayaId": 16, "evolutionStatus": 0},
                {"id": 2, "bloodGroup": "A+", "wilayaId": 16, "evolutionStatus": 1}
            ]
        }));
    });

    let query = RequestQuery {
        wilaya_id: Some(16),
        ..Default::default()
    };
    let api = client(&server);
    let requests = api
        .authorized("tok")
        .blood_donation_requests(&query)
        .await
        .unwrap();

    mock.assert_calls(1);
    assert_eq!(requests.len(), 2);
    assert!(requests[0].is_open());
    assert!(!requests[1].is_open());
}

#[tokio::test]
async fn test_wilayas_and_commune_details_are_unauthenticated() {
    let server = MockServer::start();
    let wilayas = server.mock(|when, then| {
        when.method(GET).path("/api/wilayas");
        then.status(200)
            .json_body(json!([{"id": 16, "name": "Alger"}, {"id": 31, "name": "Oran"}]));
    });
    let details = server.mock(|when, then| {
        when.method(GET).path("/api/communes/details/3101");
        then.status(200)
            .json_body(json!({"id": 3101, "name": "Oran", "wilayaId": 31}));
    });

    let api = client(&server);
    let list = api.wilayas().await.unwrap();
    let commune = api.commune_details(3101).await.unwrap();

    wilayas.assert_calls(1);
    details.assert_calls(1);
    assert_eq!(list.len(), 2);
    assert_eq!(commune.wilaya_id, 31);
}

#[tokio::test]
async fn test_subscribe_posts_center_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/subscriptions")
            .json_body(json!({"btcId": "btc-1"}));
        then.status(201).json_body(json!({"id": "s1", "btcId": "btc-1"}));
    });

    let api = client(&server);
    api.authorized("tok").subscribe("btc-1").await.unwrap();

    mock.assert_calls(1);
}
