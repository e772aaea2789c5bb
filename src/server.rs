use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::http::{self, handlers::SharedStore};

/// Default listening address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:6379";

/// HTTP server owning the listener and the shared store handle
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    store: SharedStore,
}

impl Server {
    /// Bind the listener; the store is shared by every request
    pub async fn bind(addr: &str, store: SharedStore) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("HTTP server bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            store,
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Server started, listening on {}", self.local_addr);

        axum::serve(self.listener, http::router(self.store))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}
