//! Stroke animations stored alongside the character data.

use std::sync::Arc;

use dashmap::DashMap;
use db::{DBService, models::stroke::StrokeAnimation};
use tracing::{debug, warn};

/// Reads `stroke_data/<c>.json` from the data directory, then from the public
/// directory. A file that loads is kept for the service's lifetime; misses are
/// looked up again on the next request.
pub struct StrokeFileService {
    db: DBService,
    loaded: DashMap<char, Arc<StrokeAnimation>>,
}

impl StrokeFileService {
    pub fn new(db: DBService) -> Self {
        Self {
            db,
            loaded: DashMap::new(),
        }
    }

    pub async fn get(&self, character: char) -> Option<Arc<StrokeAnimation>> {
        if let Some(animation) = self.loaded.get(&character) {
            return Some(animation.clone());
        }

        for path in self.db.layout.stroke_files(character) {
            let animation = match self.db.read_json::<StrokeAnimation>(&path).await {
                Ok(raw) => raw.for_character(character),
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warn!(character = %character, error = %e, "unreadable stroke file");
                    continue;
                }
            };
            match animation {
                Ok(animation) => {
                    debug!(character = %character, path = %path.display(), "stroke file loaded");
                    let animation = Arc::new(animation);
                    return Some(self.loaded.entry(character).or_insert(animation).clone());
                }
                Err(e) => warn!(character = %character, path = %path.display(), error = %e, "unusable stroke file"),
            }
        }

        debug!(character = %character, "no local stroke file");
        None
    }

    pub fn loaded(&self) -> usize {
        self.loaded.len()
    }
}
