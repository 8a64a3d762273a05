mod common;

use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secmgr::error::ApiError;
use secmgr::security_manager::SecurityManagerClient;
use secmgr::session::{ApiRequest, Session, AUTH_TOKEN_HEADER};

#[tokio::test]
async fn test_token_sent_on_every_request() {
    let server = MockServer::start().await;
    let session = common::login(&server).await;

    Mock::given(method("GET"))
        .and(path("/securitymanager/api/domain/1/device"))
        .and(header(AUTH_TOKEN_HEADER, common::TOKEN))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 0, "results": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = SecurityManagerClient::new(session, "1");
    client.get_devices().await.unwrap();
    let devices = client.get_devices().await.unwrap();
    assert_eq!(devices["total"], 0);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::LOGIN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = Session::login(&common::config(&server)).await.err().unwrap();
    assert!(matches!(err, ApiError::Authentication(_)));
    assert!(!err.to_string().contains(common::PASSWORD));
}

#[tokio::test]
async fn test_login_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authorized": true})))
        .mount(&server)
        .await;

    let err = Session::login(&common::config(&server)).await.err().unwrap();
    assert!(matches!(err, ApiError::Authentication(_)));
}

#[tokio::test]
async fn test_error_body_is_sanitized() {
    let server = MockServer::start().await;
    let session = common::login(&server).await;

    Mock::given(method("GET"))
        .and(path("/securitymanager/api/domain/1/device/5"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(format!("session {} is broken", common::TOKEN)),
        )
        .mount(&server)
        .await;

    let client = SecurityManagerClient::new(session, "1");
    let err = client.get_device("5").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    let message = err.to_string();
    assert!(!message.contains(common::TOKEN));
    assert!(message.contains("[REDACTED]"));
}

#[tokio::test]
async fn test_logout_posts_to_logout_endpoint() {
    let server = MockServer::start().await;
    let session = common::login(&server).await;

    Mock::given(method("POST"))
        .and(path("/securitymanager/api/authentication/logout"))
        .and(header(AUTH_TOKEN_HEADER, common::TOKEN))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = session.logout().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_plain_text_body_sets_content_type() {
    let server = MockServer::start().await;
    let session = common::login(&server).await;

    Mock::given(method("PUT"))
        .and(path("/echo"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/echo", session.host());
    session.execute(ApiRequest::put(url).text("7")).await.unwrap();
}
