use std::sync::Arc;

use mongodb::{bson::doc, Client, Database};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::database::memory::InMemoryStore;
use crate::database::mongo::MongoStore;
use crate::database::store::PaymentStore;
use crate::errors::Result;

pub async fn get_db_client(database_url: &str, db_name: &str) -> Result<Database> {
    let client = Client::with_uri_str(database_url).await?;
    let db = client.database(db_name);

    // Connecting is lazy; ping so a bad URI shows up at startup.
    db.run_command(doc! { "ping": 1 }).await?;

    match db.list_collection_names().await {
        Ok(collections) => {
            info!("✅ Connected to database: {}", db_name);
            info!("📂 Collections found: {:?}", collections);
        }
        Err(e) => {
            warn!("⚠️ Database '{}' may not be listable: {}", db_name, e);
        }
    }

    Ok(db)
}

/// Picks the store backend from configuration. Without `DATABASE_URL`, or when
/// MongoDB cannot be reached, payments are kept in memory.
pub async fn connect_store(config: &AppConfig) -> Arc<dyn PaymentStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory store");
        return Arc::new(InMemoryStore::new());
    };

    match get_db_client(database_url, &config.database_name).await {
        Ok(db) => Arc::new(MongoStore::new(db)),
        Err(e) => {
            tracing::error!("❌ Failed to connect to MongoDB: {}", e);
            warn!("Falling back to in-memory store");
            Arc::new(InMemoryStore::new())
        }
    }
}
