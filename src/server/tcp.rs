//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Cada conexión se procesa en su propio thread. El estado compartido
//! (directorio de usuarios, log de recursos, router) vive en un
//! `Arc<AppState>`; ningún lock se mantiene entre requests.

use crate::auth::basic::parse_basic_auth;
use crate::auth::{FileUserDirectory, PermissionEvaluator};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{Method, Request, Response, StatusCode};
use crate::resources::{resource_router, FileResourceLog, ResourceScope, ResourceStatusService};
use crate::router::Router;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

const MAX_REQUEST_SIZE: usize = 8192;
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Estado compartido por todas las conexiones
pub struct AppState {
    config: Arc<Config>,
    users: FileUserDirectory,
    log: FileResourceLog,
    service: ResourceStatusService,
    router: Router<ResourceScope>,
}

impl AppState {
    /// Arma el estado sobre un directorio y un log ya abiertos
    pub fn new(config: Arc<Config>, users: FileUserDirectory, log: FileResourceLog) -> Self {
        let evaluator = PermissionEvaluator::new(Arc::new(users.clone()));
        let service = ResourceStatusService::new(evaluator, Arc::new(log.clone()));
        Self {
            config,
            users,
            log,
            service,
            router: resource_router(),
        }
    }

    /// Abre los archivos indicados en la configuración
    pub fn open(config: Arc<Config>) -> Result<Self> {
        let users = FileUserDirectory::open(&config.users_path)?;
        let log = FileResourceLog::open(&config.resource_log_path)?;
        tracing::info!(users = users.count(), resources = log.count(), "state loaded");
        Ok(Self::new(config, users, log))
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn users(&self) -> &FileUserDirectory {
        &self.users
    }

    pub fn log(&self) -> &FileResourceLog {
        &self.log
    }

    /// Procesa un request crudo y produce la respuesta completa
    pub fn handle(&self, raw: &[u8], request_id: &str) -> Response {
        let mut response = match Request::parse(raw) {
            Ok(request) => {
                tracing::debug!(method = request.method().as_str(), path = request.path(), "request");
                let response = self.dispatch(&request);
                if request.method() == Method::HEAD {
                    response.without_body()
                } else {
                    response
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "parse error");
                Response::error(StatusCode::BadRequest, &format!("Invalid: {}", e))
            }
        };

        response.add_header("Connection", "close");
        response.add_header("X-Request-Id", request_id);
        response
    }

    fn dispatch(&self, request: &Request) -> Response {
        let credentials = match parse_basic_auth(request.header("Authorization")) {
            Some(credentials) => credentials,
            None => return unauthorized("Authentication required"),
        };

        let user = match self.users.authenticate(&credentials.user_id, &credentials.password) {
            Some(user) => user,
            None => {
                tracing::info!(user_id = %credentials.user_id, "authentication failed");
                return unauthorized("Wrong user name or password");
            }
        };

        let scope = ResourceScope {
            caller: user.principal,
            service: self.service.clone(),
        };
        self.router.route(request, &scope)
    }
}

fn unauthorized(message: &str) -> Response {
    Response::error(StatusCode::Unauthorized, message).with_header("WWW-Authenticate", "Basic realm=\"resources\"")
}

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    state: Arc<AppState>,
    listener: Option<TcpListener>,
}

impl Server {
    /// Abre el directorio de usuarios y el log de recursos
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        let state = AppState::open(Arc::new(config))?;
        Ok(Self::with_state(state))
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
            listener: None,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Hace bind en `config.address()`; con puerto 0 el SO elige uno libre
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(self.state.config.address())?;
        let address = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(address)
    }

    /// Acepta conexiones indefinidamente
    pub fn run(&mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => TcpListener::bind(self.state.config.address())?,
        };
        tracing::info!(address = %listener.local_addr()?, "server listening (one thread per connection)");

        spawn_expiry(self.state.log.clone(), self.state.config.resource_expiration_secs);

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let state = Arc::clone(&self.state);
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &state) {
                            tracing::warn!(error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }
}

/// Expira periódicamente las entradas viejas del log (0 = nunca)
fn spawn_expiry(log: FileResourceLog, max_age_secs: u64) {
    if max_age_secs == 0 {
        return;
    }

    let interval = Duration::from_secs((max_age_secs / 10).clamp(1, 3600));
    thread::spawn(move || loop {
        if let Err(e) = log.expire_older_than(max_age_secs) {
            tracing::error!(error = %e, "resource log expiration failed");
        }
        thread::sleep(interval);
    });
}

/// Lee hasta el fin de los headers, EOF o `MAX_REQUEST_SIZE`
fn read_request(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while buffer.len() < MAX_REQUEST_SIZE {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    buffer.truncate(MAX_REQUEST_SIZE);
    Ok(buffer)
}

fn handle_connection(mut stream: TcpStream, state: &AppState) -> std::io::Result<()> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("request", request_id = %request_id);
    let _guard = span.enter();

    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let raw = read_request(&mut stream)?;
    if raw.is_empty() {
        tracing::debug!("connection closed without data");
        return Ok(());
    }

    let response = state.handle(&raw, &request_id);
    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    tracing::info!(
        status = response.code(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "response sent"
    );
    Ok(())
}
