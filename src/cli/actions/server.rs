use crate::{
    accounts::{AccountStore, Hasher},
    api::{self, AuthConfig, AuthState},
    sessions::SessionStore,
    store::{MemoryStore, PgStore},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub apply_schema: bool,
    pub frontend_base_url: String,
    pub landing_path: String,
    pub login_path: String,
    pub session_ttl_seconds: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be
/// applied, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let (accounts, sessions): (Arc<dyn AccountStore>, Arc<dyn SessionStore>) =
        if let Some(dsn) = &args.dsn {
            info!("Connecting to {}", redact_dsn(dsn));
            let store = PgStore::connect(dsn).await?;
            if args.apply_schema {
                store.apply_schema().await?;
                info!("Database schema applied");
            }
            let store = Arc::new(store);
            let accounts: Arc<dyn AccountStore> = store.clone();
            let sessions: Arc<dyn SessionStore> = store;
            (accounts, sessions)
        } else {
            warn!("No DSN configured, accounts and sessions are kept in memory");
            let store = Arc::new(MemoryStore::new());
            let accounts: Arc<dyn AccountStore> = store.clone();
            let sessions: Arc<dyn SessionStore> = store;
            (accounts, sessions)
        };

    let config = AuthConfig::new(args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_landing_path(args.landing_path)
        .with_login_path(args.login_path);

    let state = Arc::new(AuthState::new(
        config,
        accounts,
        sessions,
        Hasher::default(),
    ));

    api::new(args.port, state).await
}

/// Strip credentials from a DSN before logging it.
fn redact_dsn(dsn: &str) -> String {
    let Ok(mut url) = Url::parse(dsn) else {
        return "<unparseable dsn>".to_string();
    };
    if url.password().is_some() {
        let _ = url.set_password(Some("***"));
    }
    url.to_string()
}
