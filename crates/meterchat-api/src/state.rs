//! Application state wiring all services together.
//!
//! Services are generic over store/provider/hasher traits; AppState pins
//! them to the concrete infra implementations.

use std::path::Path;
use std::sync::Arc;

use meterchat_core::chat::budget::BudgetGate;
use meterchat_core::chat::service::{ChatTurnService, TurnPolicy};
use meterchat_core::llm::box_provider::BoxCompletionProvider;
use meterchat_core::service::auth::AuthService;
use meterchat_infra::crypto::password::Argon2PasswordHasher;
use meterchat_infra::sqlite::pool::DatabasePool;
use meterchat_infra::sqlite::session::SqliteSessionStore;
use meterchat_infra::sqlite::user::SqliteCredentialStore;
use meterchat_types::config::RelayConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService =
    AuthService<SqliteCredentialStore, SqliteSessionStore, Argon2PasswordHasher>;

pub type ConcreteChatService =
    ChatTurnService<SqliteCredentialStore, SqliteSessionStore, BoxCompletionProvider>;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Wire services over an open database and an already-built provider.
    pub fn from_parts(
        db_pool: DatabasePool,
        config: RelayConfig,
        provider: BoxCompletionProvider,
    ) -> Self {
        let users = Arc::new(SqliteCredentialStore::new(db_pool.clone()));
        let sessions = Arc::new(SqliteSessionStore::new(db_pool));

        let auth_service = build_auth_service(users.clone(), sessions.clone(), &config);
        let chat_service = ChatTurnService::new(
            users,
            sessions,
            Arc::new(provider),
            BudgetGate::from_config(&config.budget),
            TurnPolicy::from_config(&config),
        );

        Self {
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            config: Arc::new(config),
        }
    }
}

/// Open (and migrate) `{data_dir}/meterchat.db`, creating the directory.
pub async fn open_database(data_dir: &Path) -> anyhow::Result<DatabasePool> {
    tokio::fs::create_dir_all(data_dir).await?;
    let db_url = format!(
        "{}?mode=rwc",
        meterchat_infra::sqlite::pool::database_url(data_dir)
    );
    Ok(DatabasePool::new(&db_url).await?)
}

pub fn build_auth_service(
    users: Arc<SqliteCredentialStore>,
    sessions: Arc<SqliteSessionStore>,
    config: &RelayConfig,
) -> ConcreteAuthService {
    AuthService::new(
        users,
        sessions,
        Argon2PasswordHasher::new(),
        config.budget.default_balance,
        config.session.ttl(),
    )
}

/// Auth service alone, for operator commands that never call the provider.
pub fn operator_auth_service(db_pool: DatabasePool, config: &RelayConfig) -> ConcreteAuthService {
    build_auth_service(
        Arc::new(SqliteCredentialStore::new(db_pool.clone())),
        Arc::new(SqliteSessionStore::new(db_pool)),
        config,
    )
}
