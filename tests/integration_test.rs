//! Tests de integración para el servidor de recursos
//! tests/integration_test.rs
//!
//! Cada test levanta un servidor real en un puerto efímero, con directorio de
//! usuarios y log de recursos en un directorio temporal.

use resource_server::auth::basic::encode_basic_auth;
use resource_server::auth::{FileUserDirectory, Role, UserRecord};
use resource_server::config::Config;
use resource_server::resources::{accept, ApiInfo, FileResourceLog, ResourceContext, StoredResponse};
use resource_server::server::{AppState, Server};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct TestServer {
    addr: SocketAddr,
    log: FileResourceLog,
    config: Arc<Config>,
    _dir: tempfile::TempDir,
}

fn start_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(Config {
        port: 0,
        users_path: dir.path().join("users.json"),
        resource_log_path: dir.path().join("resource_log.json"),
        resource_storage_path: dir.path().join("resources"),
        resource_expiration_secs: 0,
        ..Config::default()
    });

    let users = FileUserDirectory::open(&config.users_path).unwrap();
    for (user, group, role) in [
        ("alice", "research", Role::User),
        ("bob", "g1", Role::Admin),
        ("carol", "g2", Role::User),
        ("dave", "g1", Role::User),
        ("root", "admins", Role::Superadmin),
    ] {
        users.upsert(UserRecord::new(user, group, role, "pw")).unwrap();
    }
    let log = FileResourceLog::open(&config.resource_log_path).unwrap();

    let mut server = Server::with_state(AppState::new(Arc::clone(&config), users, log.clone()));
    let addr = server.bind().unwrap();
    thread::spawn(move || {
        let _ = server.run();
    });

    TestServer {
        addr,
        log,
        config,
        _dir: dir,
    }
}

/// Envía un request y retorna (código, body JSON)
fn send(server: &TestServer, method: &str, path: &str, user: &str) -> (u16, Value) {
    let mut stream = TcpStream::connect(server.addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let request = format!(
        "{} {} HTTP/1.0\r\nAuthorization: {}\r\n\r\n",
        method,
        path,
        encode_basic_auth(user, "pw")
    );
    stream.write_all(request.as_bytes()).unwrap();
    stream.flush().unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    let code = response
        .split_whitespace()
        .nth(1)
        .and_then(|c| c.parse().ok())
        .expect("status line");
    let body = response.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("");
    (code, serde_json::from_str(body).unwrap_or(Value::Null))
}

fn put(server: &TestServer, user: &str, resource_id: &str, status: &str) {
    server
        .log
        .put(user, resource_id, StoredResponse::new(200, json!({"status": status, "resource_id": resource_id})))
        .unwrap();
}

#[test]
fn test_owner_reads_status() {
    let server = start_server();
    put(&server, "alice", "job-42", "finished");

    let (code, body) = send(&server, "GET", "/resources/alice/job-42", "alice");
    assert_eq!(code, 200);
    assert_eq!(body, json!({"status": "finished", "resource_id": "job-42"}));
}

#[test]
fn test_admin_of_other_group_cannot_terminate() {
    let server = start_server();
    put(&server, "carol", "r7", "running");

    let (code, body) = send(&server, "DELETE", "/resources/carol/r7", "bob");
    assert_eq!(code, 401);
    assert_eq!(
        body["message"],
        "You do not have the permission to access this resource. Wrong user group."
    );
    assert!(!server.log.is_termination_requested("carol", "r7"));
}

#[test]
fn test_terminate_all_counts_active_resources() {
    let server = start_server();
    put(&server, "dave", "r1", "accepted");
    put(&server, "dave", "r2", "running");
    put(&server, "dave", "r3", "finished");

    let (code, body) = send(&server, "DELETE", "/resources/dave", "dave");
    assert_eq!(code, 200);
    assert_eq!(
        body,
        json!({"status": "finished", "message": "Successfully send 2 termination requests"})
    );
    assert!(server.log.is_termination_requested("dave", "r1"));
    assert!(server.log.is_termination_requested("dave", "r2"));
    assert!(!server.log.is_termination_requested("dave", "r3"));
}

#[test]
fn test_same_group_admin_lists_resources() {
    let server = start_server();
    put(&server, "dave", "r1", "running");
    put(&server, "dave", "r2", "error");

    let (code, body) = send(&server, "GET", "/resources/dave", "bob");
    assert_eq!(code, 200);
    let ids: Vec<&str> = body["resource_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["resource_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[test]
fn test_user_cannot_read_other_user() {
    let server = start_server();
    put(&server, "carol", "r7", "running");

    let (code, body) = send(&server, "GET", "/resources/carol/r7", "alice");
    assert_eq!(code, 401);
    assert_eq!(body["message"], "You do not have the permission to access this resource. Wrong user.");
}

#[test]
fn test_superadmin_unknown_resource() {
    let server = start_server();

    let (code, body) = send(&server, "GET", "/resources/ghost/r1", "root");
    assert_eq!(code, 400);
    assert_eq!(body["message"], "Resource does not exist");

    let (code, _) = send(&server, "GET", "/resources/ghost", "bob");
    assert_eq!(code, 400);
}

#[test]
fn test_submitted_resource_is_visible() {
    let server = start_server();
    let user = resource_server::auth::AuthenticatedUser {
        principal: resource_server::auth::Principal::new("alice", "research", Role::User),
        credentials: json!({}),
    };
    let ctx = ResourceContext::for_submission(
        Arc::clone(&server.config),
        &user,
        ApiInfo {
            endpoint: "asyncprocessingresource".to_string(),
            method: "POST".to_string(),
            path: "/locations/nc/processing_async".to_string(),
            request_url: "http://127.0.0.1/locations/nc/processing_async".to_string(),
        },
        json!({"list": []}),
        Some("nc".to_string()),
        None,
        None,
    );
    accept(&ctx, &server.log).unwrap();

    let path = format!("/resources/alice/{}", ctx.resource_id);
    let (code, body) = send(&server, "GET", &path, "alice");
    assert_eq!(code, 200);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["urls"]["status"], json!(ctx.status_url));

    let (code, body) = send(&server, "DELETE", &path, "alice");
    assert_eq!(code, 200);
    assert_eq!(body["message"], "Termination request committed");
    assert!(server.log.is_termination_requested("alice", &ctx.resource_id));
}

#[test]
fn test_unknown_route_and_bad_credentials() {
    let server = start_server();

    let (code, _) = send(&server, "GET", "/jobs/status", "alice");
    assert_eq!(code, 404);

    let (code, _) = send(&server, "GET", "/resources/alice", "mallory");
    assert_eq!(code, 401);
}
