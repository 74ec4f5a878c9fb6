//! # Resource Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, instala el logging y levanta el servidor.

use resource_server::config::Config;
use resource_server::server::Server;
use resource_server::Error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Server::new valida la configuración
    let mut server = match Server::new(Config::new()) {
        Ok(server) => server,
        Err(Error::Config(e)) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };
    server.state().config().print_summary();

    if let Err(e) = server.run() {
        tracing::error!(error = %e, "fatal server error");
        std::process::exit(1);
    }
}
