use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::config::DocxConfig;

const IN_MEMORY_ENDPOINT: &str = "mem://";

/// Connects to the embedded store or the configured remote endpoint and
/// selects the namespace and database.
pub async fn connect_database(config: &DocxConfig) -> Result<Surreal<Any>, surrealdb::Error> {
    let endpoint = config.db_endpoint().unwrap_or(IN_MEMORY_ENDPOINT);
    let db = connect(endpoint).await?;

    if config.db_endpoint().is_some()
        && let (Some(username), Some(password)) =
            (config.db_username.as_ref(), config.db_password.as_ref())
    {
        db.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await?;
    }

    db.use_ns(&config.db_namespace)
        .use_db(&config.db_name)
        .await?;
    info!(
        endpoint,
        namespace = %config.db_namespace,
        database = %config.db_name,
        "database connected"
    );
    Ok(db)
}
