//! Server startup and management

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use jsonrpsee::server::{Server, ServerHandle};
use serde::{Deserialize, Serialize};
use taskdeck_rpc::TaskdeckApiServer;
use taskdeck_session::{
    CachedSource, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SearchSession,
    SessionConfig,
};
use tracing::info;

use crate::handler::RpcHandler;
use crate::{Result, ServerError};

/// Configuration for the Taskdeck server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,

    /// Where recent searches are kept; in memory when unset
    pub data_dir: Option<PathBuf>,

    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 9877)),
            data_dir: None,
            session: SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `TASKDECK_ADDR` and `TASKDECK_DATA_DIR`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("TASKDECK_ADDR") {
            config.addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("Invalid TASKDECK_ADDR '{}': {}", addr, e)))?;
        }
        if let Ok(dir) = std::env::var("TASKDECK_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }
}

/// The Taskdeck server
pub struct TaskdeckServer {
    config: ServerConfig,
    session: Arc<SearchSession>,
    source: Arc<CachedSource>,
    handle: Option<ServerHandle>,
    local_addr: Option<SocketAddr>,
}

impl TaskdeckServer {
    /// Create a server and its search session
    pub async fn open(config: ServerConfig) -> Result<Self> {
        config.session.validate()?;
        let storage: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileKeyValueStore::open(dir).await?),
            None => Arc::new(MemoryKeyValueStore::new()),
        };
        let source = Arc::new(CachedSource::new());
        let session = SearchSession::new(config.session.clone(), source.clone(), storage).await;

        Ok(Self {
            config,
            session: Arc::new(session),
            source,
            handle: None,
            local_addr: None,
        })
    }

    /// Get a reference to the search session
    pub fn session(&self) -> Arc<SearchSession> {
        Arc::clone(&self.session)
    }

    /// Start the server
    pub async fn start(&mut self) -> Result<()> {
        let server = Server::builder()
            .build(&self.config.addr)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;
        self.local_addr = Some(server.local_addr()?);

        let handler = RpcHandler::new(Arc::clone(&self.session), Arc::clone(&self.source));
        let methods = handler.into_rpc();

        info!("Starting Taskdeck server on {}", self.addr());
        let handle = server.start(methods);
        self.handle = Some(handle);

        Ok(())
    }

    /// Stop the server
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.stop().map_err(|e| ServerError::Server(e.to_string()))?;
            info!("Taskdeck server stopped");
        }
        Ok(())
    }

    /// Wait for the server to finish
    pub async fn wait(&self) {
        if let Some(ref handle) = self.handle {
            handle.clone().stopped().await;
        }
    }

    /// The bound address once started, the configured one before
    pub fn addr(&self) -> SocketAddr {
        self.local_addr.unwrap_or(self.config.addr)
    }
}

/// Start a server and run it until shutdown
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let mut server = TaskdeckServer::open(config).await?;
    server.start().await?;

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    server.stop().await?;
    server.session().shutdown();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::http_client::HttpClientBuilder;
    use taskdeck_core::{Page, Workspace, WorkspaceSnapshot};
    use taskdeck_rpc::{IndexWorkspaceRequest, QuickSearchRequest, TaskdeckApiClient};
    use taskdeck_session::SessionError;
    use tempfile::tempdir;

    fn local_config() -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_config_defaults() {
        let config: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.addr.port(), 9877);
        assert!(config.data_dir.is_none());
        assert_eq!(config.session.quick_search_limit, 8);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_session_limits() {
        let mut config = local_config();
        config.session.quick_search_limit = 0;
        assert!(matches!(
            TaskdeckServer::open(config).await,
            Err(ServerError::Session(SessionError::InvalidConfig(_)))
        ));
    }

    #[tokio::test]
    async fn test_serves_over_http() {
        let mut server = TaskdeckServer::open(local_config()).await.unwrap();
        server.start().await.unwrap();

        let url = format!("http://{}", server.addr());
        let client = HttpClientBuilder::default().build(&url).unwrap();

        let snapshot = WorkspaceSnapshot::new(Workspace::with_id("ws", "Docs"))
            .with_pages(vec![Page::new("p1", "Onboarding handbook")]);
        client
            .index_workspace(IndexWorkspaceRequest { snapshot })
            .await
            .unwrap();

        let response = client
            .quick_search(QuickSearchRequest {
                text: "onboard".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.results[0].title, "Onboarding handbook");

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_recent_searches_survive_restart() {
        let dir = tempdir().unwrap();
        let config = ServerConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..local_config()
        };

        let server = TaskdeckServer::open(config.clone()).await.unwrap();
        server
            .session()
            .add_recent_search("handbook")
            .await
            .unwrap();
        drop(server);

        let server = TaskdeckServer::open(config).await.unwrap();
        assert_eq!(server.session().recent_searches(), vec!["handbook"]);
    }
}
