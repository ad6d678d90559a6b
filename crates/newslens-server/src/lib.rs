//! Newslens Server
//!
//! HTTP front end of the news analyzer: accepts article text or an
//! uploaded `.txt`/`.docx` file, runs the analysis, and optionally stores
//! the upload and persists the result.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use handlers::{create_router, AppState};
use newslens_analyzer::Analyzer;
use newslens_domain::{AnalysisRepository, ObjectStore};
use newslens_llm::{LlmError, OpenAiClient};
use newslens_store::{FilesystemObjectStore, SqliteRecordStore, StoreError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Completion client could not be built
    #[error("Completion client error: {0}")]
    Llm(#[from] LlmError),

    /// Database could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the shared state from configuration
///
/// A missing API key is not an error: the server still starts and every
/// analysis degrades until a key is supplied.
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    config.validate()?;

    if !config.llm.has_api_key() {
        warn!(
            "No API key configured (set {}); analyses will return empty results",
            config::ENV_API_KEY
        );
    }
    let client = OpenAiClient::new(config.llm.clone())?;
    let analyzer = Arc::new(Analyzer::new(Arc::new(client), config.analyzer.clone()));

    let object_store = config.storage.as_ref().map(|storage| {
        info!("Object storage enabled at {}", storage.root_dir.display());
        Arc::new(FilesystemObjectStore::new(&storage.root_dir)) as Arc<dyn ObjectStore>
    });
    if object_store.is_none() {
        info!("Object storage not configured, uploads will not be stored");
    }

    let repository = match &config.database {
        Some(database) => {
            let store = SqliteRecordStore::new(&database.path)?;
            Some(Arc::new(store) as Arc<dyn AnalysisRepository>)
        }
        None => {
            info!("Database not configured, results will not be persisted");
            None
        }
    };

    Ok(AppState {
        analyzer,
        object_store,
        repository,
        max_upload_bytes: config.max_upload_bytes,
    })
}

/// Start the analysis HTTP server
///
/// Builds the collaborators from `config` and serves until the process
/// exits. Tracing is expected to be initialized by the caller.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting Newslens server");
    info!("Bind address: {}", config.bind_addr());
    info!(
        "Model: {}, max text length: {} chars, completion timeout: {}s",
        config.analyzer.model,
        config.analyzer.max_text_length,
        config.analyzer.completion_timeout_secs
    );

    let state = build_state(&config)?;
    let app = create_router(state);

    // Bind and serve
    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{DatabaseConfig, StorageConfig};

    #[test]
    fn test_build_state_defaults() {
        let mut config = ServerConfig::default_test_config();
        config.llm.api_key = None;

        let state = build_state(&config).unwrap();
        assert!(!state.analyzer.is_configured());
        assert!(state.object_store.is_none());
        assert!(state.repository.is_none());
    }

    #[test]
    fn test_build_state_with_collaborators() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default_test_config();
        config.llm.api_key = Some("sk-test".to_string());
        config.storage = Some(StorageConfig {
            root_dir: dir.path().join("objects"),
        });
        config.database = Some(DatabaseConfig {
            path: dir.path().join("records.db"),
        });

        let state = build_state(&config).unwrap();
        assert!(state.analyzer.is_configured());
        assert!(state.object_store.is_some());
        assert!(state.repository.is_some());
    }

    #[test]
    fn test_build_state_rejects_invalid_config() {
        let mut config = ServerConfig::default_test_config();
        config.max_upload_bytes = 0;
        assert!(matches!(build_state(&config), Err(ServerError::Config(_))));
    }

    #[test]
    fn test_build_state_unopenable_database() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the database directory should be
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut config = ServerConfig::default_test_config();
        config.database = Some(DatabaseConfig {
            path: blocker.join("records.db"),
        });
        assert!(matches!(build_state(&config), Err(ServerError::Store(_))));
    }
}
