//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, patrón de path) a handlers.
//!
//! ```text
//! Request → Router → Handler(request, params, scope) → Response
//! ```
//!
//! Los patrones usan segmentos `{nombre}` que se capturan en [`PathParams`].
//! Si el path coincide pero el método no, retorna 405 con header `Allow`;
//! si ningún patrón coincide, 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Parámetros capturados del path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: Vec<(String, String)>,
}

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Handler: recibe el request, los parámetros del path y el estado `S`
pub type Handler<S> = fn(&Request, &PathParams, &S) -> Response;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

struct Route<S> {
    method: Method,
    segments: Vec<Segment>,
    handler: Handler<S>,
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => Segment::Param(name.to_string()),
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

fn match_segments(segments: &[Segment], path: &[String]) -> Option<PathParams> {
    if segments.len() != path.len() {
        return None;
    }

    let mut params = PathParams::default();
    for (segment, value) in segments.iter().zip(path) {
        match segment {
            Segment::Literal(literal) if literal == value => {}
            Segment::Literal(_) => return None,
            Segment::Param(name) => params.values.push((name.clone(), value.clone())),
        }
    }
    Some(params)
}

/// Router sobre un estado por request `S`
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Router<S> {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta
    ///
    /// # Ejemplo
    /// ```
    /// use resource_server::router::{PathParams, Router};
    /// use resource_server::http::{Method, Request, Response};
    ///
    /// fn hello(_req: &Request, params: &PathParams, _state: &()) -> Response {
    ///     Response::json(&format!(r#"{{"hello": "{}"}}"#, params.get("name").unwrap_or("")))
    /// }
    ///
    /// let mut router: Router<()> = Router::new();
    /// router.register(Method::GET, "/hello/{name}", hello);
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler<S>) {
        self.routes.push(Route {
            method,
            segments: parse_pattern(pattern),
            handler,
        });
    }

    /// Número de rutas registradas
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Ejecuta el handler que corresponde al request
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = request.path_segments();
        let mut allowed: Vec<&'static str> = Vec::new();

        for route in &self.routes {
            let Some(params) = match_segments(&route.segments, &path) else {
                continue;
            };

            // HEAD se atiende con el handler de GET
            let method_matches = route.method == request.method()
                || (request.method() == Method::HEAD && route.method == Method::GET);
            if method_matches {
                let mut response = (route.handler)(request, &params, state);
                self.add_common_headers(&mut response);
                return response;
            }
            allowed.push(route.method.as_str());
        }

        let mut response = if allowed.is_empty() {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", request.path()))
        } else {
            let mut response = Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method {} not allowed on {}", request.method().as_str(), request.path()),
            );
            response.add_header("Allow", &allowed.join(", "));
            response
        };
        self.add_common_headers(&mut response);
        response
    }

    /// Agrega headers comunes a todas las respuestas
    fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Server", concat!("resource_server/", env!("CARGO_PKG_VERSION")));
        response.add_header("Connection", "close");
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}
