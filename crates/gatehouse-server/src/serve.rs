//! HTTP server glue.
//!
//! Binds a TCP listener and feeds each connection's requests through a
//! [`ContractService`](crate::ContractService). One tokio task per
//! connection; the dispatcher itself never errors, so the only
//! failures here are I/O.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::dispatch::ContractService;

/// A server-level I/O failure.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Binding the listener failed.
    #[error("failed to bind {addr}")]
    Bind {
        /// The address that could not be bound.
        addr: std::net::SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Accepting a connection failed.
    #[error("failed to accept connection")]
    Accept(#[source] std::io::Error),
}

/// Serves the contract service on the configured address until the
/// task is dropped or an accept error occurs.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use gatehouse_server::{serve, ContractService, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = Arc::new(build_service()?);
///     serve(service, ServerConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn serve(service: Arc<ContractService>, config: ServerConfig) -> Result<(), ServeError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!(%addr, "gatehouse listening");

    loop {
        let (stream, remote) = listener.accept().await.map_err(ServeError::Accept)?;
        let service = Arc::clone(&service);

        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let connection_service = service_fn(move |req: http::Request<Incoming>| {
                let service = Arc::clone(&service);
                async move { Ok::<_, Infallible>(service.handle(req).await) }
            });

            if let Err(error) = http1::Builder::new()
                .serve_connection(io, connection_service)
                .await
            {
                debug!(%remote, error = %error, "connection closed with error");
            }
        });
    }
}
