//! # Handlers HTTP para Recursos
//! src/resources/handlers.rs
//!
//! Implementa los endpoints de estado y terminación:
//! - `GET    /resources/{user_id}/{resource_id}`
//! - `DELETE /resources/{user_id}/{resource_id}`
//! - `GET    /resources/{user_id}`
//! - `DELETE /resources/{user_id}`
//!
//! El usuario que llama ya viene autenticado en [`ResourceScope`].

use super::service::{ResourceError, ResourceStatusService};
use super::types::SimpleResponse;
use crate::auth::Principal;
use crate::http::{Method, Request, Response, StatusCode};
use crate::identifier::is_valid_identifier;
use crate::router::{PathParams, Router};

/// Estado por request: usuario autenticado y servicio
#[derive(Clone)]
pub struct ResourceScope {
    pub caller: Principal,
    pub service: ResourceStatusService,
}

/// Router con las cuatro rutas de recursos
pub fn resource_router() -> Router<ResourceScope> {
    let mut router = Router::new();
    router.register(Method::GET, "/resources/{user_id}/{resource_id}", status_handler);
    router.register(Method::DELETE, "/resources/{user_id}/{resource_id}", terminate_handler);
    router.register(Method::GET, "/resources/{user_id}", list_handler);
    router.register(Method::DELETE, "/resources/{user_id}", terminate_all_handler);
    router
}

fn error_response(error: &ResourceError) -> Response {
    Response::error(error.status_code(), &error.message())
}

/// Extrae un parámetro validado; `Err` es la respuesta 400 lista
fn identifier<'a>(params: &'a PathParams, name: &str) -> Result<&'a str, Response> {
    match params.get(name) {
        Some(value) if is_valid_identifier(value) => Ok(value),
        _ => Err(Response::error(StatusCode::BadRequest, "Invalid identifier")),
    }
}

/// Handler para GET /resources/{user_id}/{resource_id}
///
/// Retorna el modelo guardado con su código HTTP original.
pub fn status_handler(_req: &Request, params: &PathParams, scope: &ResourceScope) -> Response {
    let (user_id, resource_id) = match (identifier(params, "user_id"), identifier(params, "resource_id")) {
        (Ok(u), Ok(r)) => (u, r),
        (Err(response), _) | (_, Err(response)) => return response,
    };

    match scope.service.get_status(&scope.caller, user_id, resource_id) {
        Ok(stored) => Response::json_value(stored.http_code, &stored.response_model),
        Err(e) => error_response(&e),
    }
}

/// Handler para DELETE /resources/{user_id}/{resource_id}
///
/// # Ejemplo de response
/// ```json
/// {"status": "accepted", "message": "Termination request committed"}
/// ```
pub fn terminate_handler(_req: &Request, params: &PathParams, scope: &ResourceScope) -> Response {
    let (user_id, resource_id) = match (identifier(params, "user_id"), identifier(params, "resource_id")) {
        (Ok(u), Ok(r)) => (u, r),
        (Err(response), _) | (_, Err(response)) => return response,
    };

    match scope.service.request_termination(&scope.caller, user_id, resource_id) {
        Ok(body) => Response::json_value(StatusCode::Ok.as_u16(), &body),
        Err(e) => error_response(&e),
    }
}

/// Handler para GET /resources/{user_id}
pub fn list_handler(_req: &Request, params: &PathParams, scope: &ResourceScope) -> Response {
    let user_id = match identifier(params, "user_id") {
        Ok(u) => u,
        Err(response) => return response,
    };

    match scope.service.list_resources(&scope.caller, user_id) {
        Ok(list) => Response::json_value(StatusCode::Ok.as_u16(), &list),
        Err(e) => error_response(&e),
    }
}

/// Handler para DELETE /resources/{user_id}
///
/// # Ejemplo de response
/// ```json
/// {"status": "finished", "message": "Successfully send 2 termination requests"}
/// ```
pub fn terminate_all_handler(_req: &Request, params: &PathParams, scope: &ResourceScope) -> Response {
    let user_id = match identifier(params, "user_id") {
        Ok(u) => u,
        Err(response) => return response,
    };

    match scope.service.terminate_all(&scope.caller, user_id) {
        Ok(count) => {
            let body = SimpleResponse::new("finished", format!("Successfully send {} termination requests", count));
            Response::json_value(StatusCode::Ok.as_u16(), &body)
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permission::tests::CountingDirectory;
    use crate::auth::{PermissionEvaluator, Role};
    use crate::resources::log::{FileResourceLog, ResourceLogStore};
    use crate::resources::types::StoredResponse;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        _dir: tempfile::TempDir,
        log: FileResourceLog,
        router: Router<ResourceScope>,
        service: ResourceStatusService,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let log = FileResourceLog::open(dir.path().join("log.json")).unwrap();
            let directory = Arc::new(CountingDirectory::with_users(&[
                Principal::new("alice", "research", Role::User),
                Principal::new("bob", "g1", Role::Admin),
                Principal::new("carol", "g2", Role::User),
            ]));
            let service = ResourceStatusService::new(PermissionEvaluator::new(directory), Arc::new(log.clone()));
            Self {
                _dir: dir,
                log,
                router: resource_router(),
                service,
            }
        }

        fn call(&self, caller: Principal, raw: &str) -> Response {
            let scope = ResourceScope {
                caller,
                service: self.service.clone(),
            };
            self.router.route(&Request::parse(raw.as_bytes()).unwrap(), &scope)
        }
    }

    fn alice() -> Principal {
        Principal::new("alice", "research", Role::User)
    }

    #[test]
    fn test_status_returns_stored_code_and_body() {
        let fx = Fixture::new();
        let model = json!({"status": "error", "resource_id": "job-1", "message": "GRASS failed"});
        fx.log.put("alice", "job-1", StoredResponse::new(400, model.clone())).unwrap();

        let response = fx.call(alice(), "GET /resources/alice/job-1 HTTP/1.0\r\n\r\n");
        assert_eq!(response.code(), 400);
        assert_eq!(response.body_json().unwrap(), model);
    }

    #[test]
    fn test_missing_resource() {
        let fx = Fixture::new();

        let response = fx.call(alice(), "GET /resources/alice/nope HTTP/1.0\r\n\r\n");
        assert_eq!(response.code(), 400);
        assert_eq!(response.body_json().unwrap()["message"], "Resource does not exist");
    }

    #[test]
    fn test_terminate_marks_log() {
        let fx = Fixture::new();
        fx.log.put("alice", "job-1", StoredResponse::new(200, json!({"status": "running", "resource_id": "job-1"}))).unwrap();

        let response = fx.call(alice(), "DELETE /resources/alice/job-1 HTTP/1.0\r\n\r\n");
        assert_eq!(response.code(), 200);
        assert_eq!(
            response.body_json().unwrap(),
            json!({"status": "accepted", "message": "Termination request committed"})
        );
        assert!(fx.log.is_termination_requested("alice", "job-1"));
    }

    #[test]
    fn test_cross_group_denied() {
        let fx = Fixture::new();
        fx.log.put("carol", "r7", StoredResponse::new(200, json!({"status": "running", "resource_id": "r7"}))).unwrap();

        let response = fx.call(Principal::new("bob", "g1", Role::Admin), "DELETE /resources/carol/r7 HTTP/1.0\r\n\r\n");
        assert_eq!(response.code(), 401);
        assert_eq!(
            response.body_json().unwrap()["message"],
            "You do not have the permission to access this resource. Wrong user group."
        );
        assert!(!fx.log.is_termination_requested("carol", "r7"));
    }

    #[test]
    fn test_list_and_terminate_all() {
        let fx = Fixture::new();
        for (id, status) in [("r1", "accepted"), ("r2", "running"), ("r3", "finished")] {
            fx.log.put("alice", id, StoredResponse::new(200, json!({"status": status, "resource_id": id}))).unwrap();
        }

        let list = fx.call(alice(), "GET /resources/alice HTTP/1.0\r\n\r\n");
        assert_eq!(list.code(), 200);
        assert_eq!(list.body_json().unwrap()["resource_list"].as_array().unwrap().len(), 3);

        let response = fx.call(alice(), "DELETE /resources/alice HTTP/1.0\r\n\r\n");
        assert_eq!(
            response.body_json().unwrap(),
            json!({"status": "finished", "message": "Successfully send 2 termination requests"})
        );
        assert!(fx.log.is_termination_requested("alice", "r1"));
        assert!(!fx.log.is_termination_requested("alice", "r3"));
        assert_eq!(fx.log.get_user_resources("alice").unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_identifier() {
        let fx = Fixture::new();

        for raw in [
            "GET /resources/alice/bad%20id HTTP/1.0\r\n\r\n",
            "DELETE /resources/alice/%2E%2E HTTP/1.0\r\n\r\n",
            "GET /resources/al%21ce HTTP/1.0\r\n\r\n",
        ] {
            let response = fx.call(alice(), raw);
            assert_eq!(response.code(), 400);
            assert_eq!(response.body_json().unwrap()["message"], "Invalid identifier");
        }
    }

    #[test]
    fn test_encoded_slash_does_not_change_route() {
        let fx = Fixture::new();
        fx.log.put("alice", "r1", StoredResponse::new(200, json!({"status": "running", "resource_id": "r1"}))).unwrap();
        fx.log.put("alice", "r2", StoredResponse::new(200, json!({"status": "accepted", "resource_id": "r2"}))).unwrap();

        for raw in [
            "DELETE /resources/alice%2F HTTP/1.0\r\n\r\n",
            "GET /resources/alice%2Fr1 HTTP/1.0\r\n\r\n",
            "DELETE /resources/alice/r1%2F.. HTTP/1.0\r\n\r\n",
            "GET /resources/alice/%2Fr1 HTTP/1.0\r\n\r\n",
        ] {
            let response = fx.call(alice(), raw);
            assert_eq!(response.code(), 400, "{}", raw);
            assert_eq!(response.body_json().unwrap()["message"], "Invalid identifier");
        }
        assert!(!fx.log.is_termination_requested("alice", "r1"));
        assert!(!fx.log.is_termination_requested("alice", "r2"));
    }
}
