//! Shared fixtures for the HTTP tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secmgr::config::Config;
use secmgr::session::Session;

pub const TOKEN: &str = "tok-3f9a2c71";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "s3cr3t-Pa55";

pub const LOGIN_PATH: &str = "/securitymanager/api/authentication/login";
pub const PLANNER_WORKFLOWS: &str = "/policyplanner/api/domain/1/workflow/version/latest/all";
pub const OPTIMIZER_WORKFLOWS: &str = "/policyoptimizer/api/domain/1/workflow/version/latest/all";

pub fn config(server: &MockServer) -> Config {
    Config::new(server.uri(), USERNAME, PASSWORD).unwrap()
}

/// Mounts a login endpoint that accepts the test credentials.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({"username": USERNAME, "password": PASSWORD})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": TOKEN})))
        .mount(server)
        .await;
}

pub async fn login(server: &MockServer) -> Session {
    mount_login(server).await;
    Session::login(&config(server)).await.unwrap()
}

/// Workflow listing body with the given `(id, name)` entries.
pub fn workflow_page(total: u64, workflows: &[(u64, &str)]) -> Value {
    let results: Vec<Value> = workflows
        .iter()
        .map(|(id, name)| json!({"workflow": {"id": id, "name": name}}))
        .collect();
    json!({"total": total, "results": results})
}

/// Mounts a single-page workflow listing at `listing_path`.
pub async fn mount_workflows(server: &MockServer, listing_path: &str, workflows: &[(u64, &str)]) {
    Mock::given(method("GET"))
        .and(path(listing_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(workflow_page(workflows.len() as u64, workflows)),
        )
        .mount(server)
        .await;
}

/// A ticket whose request stage is completed and whose current stage is open.
pub fn ticket_at_stage(id: u64, stage: &str, task_id: u64, packet_task_id: u64) -> Value {
    json!({
        "id": id,
        "status": stage,
        "workflowPacketTasks": [
            {"id": packet_task_id - 1, "workflowTask": {"id": 1, "name": "Request"}, "completed": "2024-03-01T10:00:00Z"},
            {"id": packet_task_id, "workflowTask": {"id": task_id, "name": stage}}
        ]
    })
}

/// Mounts a ticket fetch expected exactly `times` times.
pub async fn mount_ticket(server: &MockServer, ticket_path: &str, ticket: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(ticket_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(ticket))
        .expect(times)
        .mount(server)
        .await;
}
