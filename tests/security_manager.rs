mod common;

use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secmgr::error::ApiError;
use secmgr::models::{FirewallObjectType, SiqlTarget, SupplementalRoute};
use secmgr::orchestration::OrchestrationClient;
use secmgr::security_manager::SecurityManagerClient;

const ROUTES_CSV: &str = r#"deviceId,interfaceName,destination,gateway,virtualRouter,nextVirtualRouter,metric,drop
12,"eth0","10.0.0.0/8",192.168.1.1,,,5,false
12,eth0,10.1.0.0/16,192.168.1.1,vr1,vr2,,false

13,,0.0.0.0/0,10.1.1.1,vr-trust,vr-untrust,,TRUE
"#;

#[tokio::test]
async fn test_invalid_route_is_never_sent() {
    let server = MockServer::start().await;
    let client = SecurityManagerClient::new(common::login(&server).await, "1");

    Mock::given(method("POST"))
        .and(path_regex("supplementalroute$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let route = SupplementalRoute {
        destination: "10.0.0.0/8".to_string(),
        device_id: "12".to_string(),
        drop: false,
        gateway: "192.168.1.1".to_string(),
        interface_name: Some("eth0".to_string()),
        metric: None,
        next_virtual_router: Some("vr2".to_string()),
        virtual_router: Some("vr1".to_string()),
    };
    let err = client.add_supplemental_route(&route).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn test_bulk_import_unquotes_fields_and_reports_every_line() {
    let server = MockServer::start().await;
    let client = SecurityManagerClient::new(common::login(&server).await, "1");

    Mock::given(method("POST"))
        .and(path("/securitymanager/api/device/12/supplementalroute"))
        .and(body_json(json!({
            "destination": "10.0.0.0/8",
            "deviceId": "12",
            "drop": false,
            "gateway": "192.168.1.1",
            "interfaceName": "eth0",
            "metric": 5
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/securitymanager/api/device/13/supplementalroute"))
        .respond_with(ResponseTemplate::new(500).set_body_string("device locked"))
        .expect(1)
        .mount(&server)
        .await;

    let report = client.bulk_add_supplemental_routes(ROUTES_CSV).await;

    let keys: Vec<&str> = report.outcomes().iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["line 2", "line 3", "line 5"]);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.status_of("line 2"), Some(StatusCode::OK));
    assert!(matches!(
        report.outcomes()[1].result,
        Err(ApiError::Validation(_))
    ));
    assert_eq!(report.status_of("line 5"), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(report.summary(), "1 succeeded, 2 failed");
}

#[tokio::test]
async fn test_siql_and_object_lookups() {
    let server = MockServer::start().await;
    let client = SecurityManagerClient::new(common::login(&server).await, "1");

    Mock::given(method("GET"))
        .and(path("/securitymanager/api/siql/secrule/paged-search"))
        .and(query_param("q", "device { id = 5 }"))
        .and(query_param("pageSize", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/securitymanager/api/firewallobject/NETWORK/device/5/match/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "web-servers"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/securitymanager/api/domain/1/user"))
        .and(query_param("search", "jdoe"))
        .and(query_param("pageSize", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let rules = client
        .siql_query(SiqlTarget::SecurityRule, "device { id = 5 }", 50)
        .await
        .unwrap();
    assert_eq!(rules["total"], 2);

    let object = client
        .get_firewall_object(FirewallObjectType::Network, "5", "abc-123")
        .await
        .unwrap();
    assert_eq!(object["name"], "web-servers");

    client.get_user_by_username("jdoe", 20).await.unwrap();
}

#[tokio::test]
async fn test_create_device_group_body() {
    let server = MockServer::start().await;
    let client = SecurityManagerClient::new(common::login(&server).await, "1");

    Mock::given(method("POST"))
        .and(path("/securitymanager/api/domain/1/devicegroup"))
        .and(body_json(json!({"name": "DMZ Firewalls", "domainId": "1"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let response = client.create_device_group("DMZ Firewalls").await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_device_pca_sends_fixed_controls() {
    let server = MockServer::start().await;
    let client = OrchestrationClient::new(common::login(&server).await, "1");

    let changes = json!([{"action": "ADD", "rule": {"name": "allow-web"}}]);
    let mut mock = Mock::given(method("POST"))
        .and(path("/orchestration/api/domain/1/change/device/5/pca"))
        .and(body_json(changes.clone()));
    for control in [
        "RULE_SEARCH",
        "ALLOWED_SERVICES",
        "SERVICE_RISK_ANALYSIS",
        "DEVICE_ACCESS_ANALYSIS",
        "NETWORK_ACCESS_ANALYSIS",
    ] {
        mock = mock.and(query_param("controlType", control));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let results = client.device_pca("5", changes).await.unwrap();
    assert_eq!(results["results"], json!([]));
}
