use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::agents::{Agent, AgentCatalog, CatalogError};
use crate::chat::ChatController;
use crate::config::{Config, ConfigError};
use crate::db::{Database, DbError, DATABASE_FILE};
use crate::gateway::{AgentGateway, CompletionGateway, GatewayError, HttpGateway};

/// Install the global subscriber. Honors `RUST_LOG`, defaulting to `info`.
/// Output goes to stderr so it never mixes with chat output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
}

/// Wired-up application: database, configuration and the gateway chats use.
pub struct App {
    pub config: Config,
    pub database: Arc<Database>,
    pub gateway: Arc<dyn CompletionGateway>,
}

impl App {
    pub fn bootstrap(config: Config) -> Result<Self, AppError> {
        let path = config
            .database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE));
        let database = Database::open(&path)?;
        tracing::debug!(path = %path.display(), "database opened");
        Self::with_database(config, database)
    }

    pub fn with_database(mut config: Config, database: Database) -> Result<Self, AppError> {
        config.overlay_settings(&database)?;
        let database = Arc::new(database);

        let gateway: Arc<dyn CompletionGateway> = match &config.completion_url {
            Some(url) => {
                tracing::info!(endpoint = %url, "using remote completion endpoint");
                Arc::new(HttpGateway::new(url.as_str(), config.request_timeout)?)
            }
            None => {
                let provider = config.build_provider();
                if let Some(provider) = &provider {
                    tracing::info!(provider = provider.name(), "using upstream provider");
                }
                Arc::new(AgentGateway::new(
                    database.clone(),
                    provider,
                    config.completion_options(),
                ))
            }
        };

        Ok(Self {
            config,
            database,
            gateway,
        })
    }

    pub fn agents(&self) -> Result<Vec<Agent>, AppError> {
        Ok(self.database.list_agents()?)
    }

    pub fn find_agent(&self, agent_id: &str) -> Result<Agent, AppError> {
        self.database
            .get_agent(agent_id)?
            .filter(|agent| agent.is_active)
            .ok_or_else(|| AppError::UnknownAgent(agent_id.to_string()))
    }

    /// Open `user_id`'s conversation with an agent, restoring its history.
    pub fn open_session(&self, user_id: &str, agent_id: &str) -> Result<ChatController, AppError> {
        let agent = self.find_agent(agent_id)?;
        let conversation = self.database.get_or_create_conversation(user_id, agent_id)?;
        let controller = ChatController::resume(
            agent,
            Arc::clone(&self.gateway),
            self.database.clone(),
            conversation.id,
        )?;
        Ok(controller)
    }
}
