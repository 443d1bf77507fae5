use crate::models::{User, USER_COLLECTION};
use mongodb::{Client, Collection, Database};
use std::error::Error;

const DEFAULT_DB_NAME: &str = "exercia";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Small pool: the API is a handful of direct reads/writes
        client_options.max_pool_size = Some(10);
        client_options.min_pool_size = Some(1);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        let db = client.database(database_name(uri));

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the account routes rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        // Concurrent signups for one address fail with a duplicate key
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match self.users().create_index(email_index).await {
            Ok(_) => log::info!("   ✅ Index created: user(email) unique"),
            Err(e) => log::debug!("   ℹ️  Index not created: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    /// Handle that connects on first use, for route tests that fail before
    /// any query runs.
    #[cfg(test)]
    pub(crate) async fn unchecked(uri: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self { db: client.database(database_name(uri)) })
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection(USER_COLLECTION)
    }

    pub async fn ping(&self) -> bool {
        self.db.list_collection_names().await.is_ok()
    }
}

/// Extracts the database name from the URI path, falling back to the default
/// when the URI has no path (e.g. `mongodb+srv://host/?retryWrites=true`).
fn database_name(uri: &str) -> &str {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);

    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DB_NAME)
}
