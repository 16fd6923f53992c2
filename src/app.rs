use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::template::DailyTemplate;

/// Running web front end for the report generator
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
    pub local_addr: std::net::SocketAddr,
}

impl Application {
    /// Load the document skeleton, bind the listener and spawn the server.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");
        info!("Daily reports are written under {}", config.output_dir.display());

        let state = AppState {
            template: Arc::new(DailyTemplate::default()),
            output_dir: config.output_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        };
        let app = create_router(state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Starting HTTP server on {}", local_addr);

        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            server_handle,
            local_addr,
        })
    }

    /// Run until the server stops.
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
