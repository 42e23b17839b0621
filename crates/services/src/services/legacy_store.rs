//! The legacy database, parsed on first use and kept for the process lifetime.

use std::sync::Arc;

use db::{DBService, models::legacy::LegacyDatabase};
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub struct LegacyStore {
    db: DBService,
    database: OnceCell<Arc<LegacyDatabase>>,
}

impl LegacyStore {
    pub fn new(db: DBService) -> Self {
        Self {
            db,
            database: OnceCell::new(),
        }
    }

    /// `None` when the file is missing or unparsable; the next call retries.
    pub async fn get(&self) -> Option<Arc<LegacyDatabase>> {
        let loaded = self
            .database
            .get_or_try_init(|| async {
                let path = self.db.layout.legacy_database();
                let database = self.db.read_json::<LegacyDatabase>(&path).await?;
                info!(path = %path.display(), "legacy database loaded");
                Ok::<_, db::DbError>(Arc::new(database))
            })
            .await;
        match loaded {
            Ok(database) => Some(database.clone()),
            Err(e) => {
                warn!(error = %e, "legacy database unavailable");
                None
            }
        }
    }
}
