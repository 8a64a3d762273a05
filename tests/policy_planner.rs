mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secmgr::error::ApiError;
use secmgr::models::{ControlType, RequirementBehavior, TaskAction};
use secmgr::policy_planner::PolicyPlannerClient;

const BASE: &str = "/policyplanner/api/domain/1/workflow/7";

async fn planner(server: &MockServer) -> PolicyPlannerClient {
    let session = common::login(server).await;
    PolicyPlannerClient::with_workflow_id(session, "1", "ChangeRequests", "7")
}

#[tokio::test]
async fn test_resolve_then_create_ticket() {
    let server = MockServer::start().await;
    let session = common::login(&server).await;

    let names: Vec<String> = (0..15).map(|i| format!("Workflow {}", i)).collect();
    let mut all: Vec<(u64, &str)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (100 + i as u64, name.as_str()))
        .collect();
    all[7] = (107, "ChangeRequests");

    Mock::given(method("GET"))
        .and(path(common::PLANNER_WORKFLOWS))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::workflow_page(15, &all[..10])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(common::PLANNER_WORKFLOWS))
        .and(query_param("pageSize", "15"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::workflow_page(15, &all)))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let body = json!({"variables": {"summary": "Allow HTTPS to web tier"}});
    Mock::given(method("POST"))
        .and(path("/policyplanner/api/domain/1/workflow/107/packet"))
        .and(body_json(body.clone()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 501, "status": "Request"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = PolicyPlannerClient::connect(session, "1", "ChangeRequests")
        .await
        .unwrap();
    let ticket = client.create_ticket(body).await.unwrap();
    assert_eq!(ticket["id"], 501);
}

#[tokio::test]
async fn test_assign_uses_ids_of_the_target_ticket() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    common::mount_ticket(
        &server,
        &format!("{}/packet/41", BASE),
        common::ticket_at_stage(41, "Review", 3, 30),
        1,
    )
    .await;
    common::mount_ticket(
        &server,
        &format!("{}/packet/42", BASE),
        common::ticket_at_stage(42, "Implement", 4, 40),
        1,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/task/4/packet/42/packettask/40/assign", BASE)))
        .and(header("content-type", "text/plain"))
        .and(body_string("7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.pull_ticket("41").await.unwrap();
    assert_eq!(client.desk().stage().workflow_task_id(), Some("3"));

    let response = client.assign("42", "7").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.desk().stage().workflow_packet_task_id(), Some("40"));
}

#[tokio::test]
async fn test_every_stage_action_refetches_the_ticket() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    common::mount_ticket(
        &server,
        &format!("{}/packet/42", BASE),
        common::ticket_at_stage(42, "Review", 4, 40),
        2,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/task/4/packet/42/packettask/40/approved", BASE)))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/task/4/packet/42/packettask/40/unassign", BASE)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.unassign("42").await.unwrap();
    client
        .complete_task("42", TaskAction::Approved, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stage_without_open_task_is_an_error() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    common::mount_ticket(
        &server,
        &format!("{}/packet/42", BASE),
        json!({
            "id": 42,
            "status": "Approve",
            "workflowPacketTasks": [
                {"id": 40, "workflowTask": {"id": 4, "name": "Approve"}, "completed": null}
            ]
        }),
        1,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path_regex("/packettask/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .complete_task("42", TaskAction::Submit, None)
        .await
        .unwrap_err();
    match err {
        ApiError::StageTaskNotFound { ticket_id, status } => {
            assert_eq!(ticket_id, "42");
            assert_eq!(status, "Approve");
        }
        other => panic!("expected StageTaskNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_complete_task_timeout() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    common::mount_ticket(
        &server,
        &format!("{}/packet/42", BASE),
        common::ticket_at_stage(42, "Review", 4, 40),
        1,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/task/4/packet/42/packettask/40/submit", BASE)))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = client
        .complete_task("42", TaskAction::Submit, Some(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Timeout { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_delete_all_requirements_continues_past_failures() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    common::mount_ticket(
        &server,
        &format!("{}/packet/42", BASE),
        common::ticket_at_stage(42, "Review", 4, 40),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/task/4/packet/42/requirements", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "results": [{"id": 1}, {"id": 2}, {"id": "3"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    for (id, status) in [(1, 200), (2, 500), (3, 204)] {
        Mock::given(method("DELETE"))
            .and(path(format!("{}/task/4/packet/42/requirement/{}", BASE, id)))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;
    }

    let report = client.delete_all_requirements("42").await.unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.status_of("1"), Some(StatusCode::OK));
    assert_eq!(report.status_of("2"), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(report.status_of("3"), Some(StatusCode::NO_CONTENT));

    match report.ensure_complete() {
        Err(ApiError::PartialFailure { failed, total }) => assert_eq!((failed, total), (1, 3)),
        other => panic!("expected PartialFailure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pca_sends_each_control() {
    let server = MockServer::start().await;
    let client = planner(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{}/packet/42/pca", BASE)))
        .and(query_param("controlTypes", "RULE_SEARCH"))
        .and(query_param("controlTypes", "ZONE_MATRIX"))
        .and(query_param("enableRiskSa", "true"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/packet/42/pca", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "COMPLETE"})))
        .expect(1)
        .mount(&server)
        .await;

    let results = client
        .run_pca("42", &[ControlType::RuleSearch, ControlType::ZoneMatrix], true)
        .await
        .unwrap();
    assert_eq!(results["status"], "COMPLETE");
}

#[tokio::test]
async fn test_csv_upload_submits_and_reattaches() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{}/requirements/csv/parse", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "policyPlanRequirementErrorDTOs": [
                {"policyPlanRequirementDTO": {"sources": ["10.0.0.1"]}, "errors": []}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    common::mount_ticket(
        &server,
        &format!("{}/packet/42", BASE),
        common::ticket_at_stage(42, "Review", 4, 40),
        1,
    )
    .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/task/4/packet/42/requirements/replace", BASE)))
        .and(body_json(json!({"requirements": [{"sources": ["10.0.0.1"]}]})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/attachment/stage", BASE)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"attachments": [{"fileName": "reqs.csv"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/packet/42/attachment", BASE)))
        .and(body_json(json!({"attachments": [{
            "fileName": "reqs.csv",
            "description": "Attached original CSV file"
        }]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"attached": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let csv = b"sources,destinations,services\n10.0.0.1,10.1.1.1,tcp/443\n".to_vec();
    let response = client
        .upload_requirements_csv("42", "reqs.csv", csv, RequirementBehavior::Replace)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_comments() {
    let server = MockServer::start().await;
    let client = planner(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{}/packet/42/comment", BASE)))
        .and(body_json(json!({"comment": "Scheduled for Friday"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/packet/42/comment/9", BASE)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.add_comment("42", "Scheduled for Friday").await.unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    client.delete_comment("42", "9").await.unwrap();
}

#[tokio::test]
async fn test_invalid_ticket_id_sends_nothing() {
    let server = MockServer::start().await;
    let mut client = planner(&server).await;

    Mock::given(path_regex("^/policyplanner/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        client.pull_ticket("42/../1").await.unwrap_err(),
        ApiError::Validation(_)
    ));
}
