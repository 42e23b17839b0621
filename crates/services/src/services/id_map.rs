//! Character <-> ID mapping, built lazily from the bulk extended data file.

use std::collections::HashMap;

use db::{
    DBService, DbError,
    models::character::BulkCharacterFile,
};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use utils::hanja_id::{is_valid_id, percent_decoded_char, single_char};

#[derive(Debug, Error)]
pub enum IdMapError {
    #[error("failed to load id map: {0}")]
    Load(#[from] DbError),
}

#[derive(Debug, Default)]
struct Maps {
    by_character: HashMap<String, String>,
    by_id: HashMap<String, String>,
    ids: Vec<String>,
}

/// Bidirectional map between characters and IDs. The bulk file is read on
/// first use and never again; a failed read leaves the map unbuilt so the
/// next call retries.
pub struct IdMap {
    db: DBService,
    maps: OnceCell<Maps>,
}

impl IdMap {
    pub fn new(db: DBService) -> Self {
        Self {
            db,
            maps: OnceCell::new(),
        }
    }

    async fn maps(&self) -> Result<&Maps, IdMapError> {
        self.maps
            .get_or_try_init(|| async {
                let path = self.db.layout.extended_data();
                let file: BulkCharacterFile = self.db.read_json(&path).await?;
                let mut maps = Maps::default();
                for entry in file.characters {
                    if !is_valid_id(&entry.id) {
                        warn!(id = %entry.id, "skipping malformed id in bulk file");
                        continue;
                    }
                    maps.by_character
                        .entry(entry.character.clone())
                        .or_insert_with(|| entry.id.clone());
                    maps.by_id
                        .entry(entry.id.clone())
                        .or_insert(entry.character);
                    maps.ids.push(entry.id);
                }
                info!(characters = maps.by_character.len(), "id map built");
                Ok::<_, IdMapError>(maps)
            })
            .await
    }

    pub async fn id_from_character(&self, character: &str) -> Result<Option<String>, IdMapError> {
        Ok(self.maps().await?.by_character.get(character).cloned())
    }

    pub async fn character_from_id(&self, id: &str) -> Result<Option<String>, IdMapError> {
        Ok(self.maps().await?.by_id.get(id).cloned())
    }

    /// Valid IDs pass through untouched; a single character, or a
    /// percent-encoded single character, is looked up. Anything else is `None`.
    pub async fn normalize(&self, identifier: &str) -> Result<Option<String>, IdMapError> {
        if is_valid_id(identifier) {
            return Ok(Some(identifier.to_string()));
        }
        if let Some(c) = single_char(identifier) {
            return self.id_from_character(&c.to_string()).await;
        }
        if let Some(c) = percent_decoded_char(identifier) {
            return self.id_from_character(&c.to_string()).await;
        }
        Ok(None)
    }

    /// Every ID in bulk-file order.
    pub async fn all_ids(&self) -> Result<Vec<String>, IdMapError> {
        Ok(self.maps().await?.ids.clone())
    }

    pub fn is_built(&self) -> bool {
        self.maps.initialized()
    }
}

#[cfg(test)]
mod tests {
    use db::DataLayout;
    use serde_json::json;

    use super::*;
    use crate::services::test_fixtures::{seed, write_json};

    fn id_map(layout: &DataLayout) -> IdMap {
        IdMap::new(DBService::new(layout.clone()))
    }

    #[tokio::test]
    async fn round_trips_every_known_character() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let map = id_map(&layout);

        for c in ["一", "二", "大", "小"] {
            let id = map.id_from_character(c).await.unwrap().unwrap();
            assert!(is_valid_id(&id));
            assert_eq!(map.character_from_id(&id).await.unwrap().as_deref(), Some(c));
        }
        assert_eq!(map.id_from_character("龍").await.unwrap(), None);
        assert_eq!(map.character_from_id("HJ-01-0001-9F8D").await.unwrap(), None);
    }

    #[tokio::test]
    async fn builds_once_and_never_rereads() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let map = id_map(&layout);

        assert!(!map.is_built());
        map.id_from_character("一").await.unwrap();
        assert!(map.is_built());

        std::fs::remove_file(layout.extended_data()).unwrap();
        assert_eq!(
            map.id_from_character("大").await.unwrap().as_deref(),
            Some("HJ-07-0001-5927")
        );
    }

    #[tokio::test]
    async fn normalize_handles_ids_characters_and_percent_encoding() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let map = id_map(&layout);

        assert_eq!(
            map.normalize("HJ-99-0001-4EBA").await.unwrap().as_deref(),
            Some("HJ-99-0001-4EBA")
        );
        assert_eq!(
            map.normalize("大").await.unwrap().as_deref(),
            Some("HJ-07-0001-5927")
        );
        assert_eq!(
            map.normalize("%E5%A4%A7").await.unwrap().as_deref(),
            Some("HJ-07-0001-5927")
        );
        assert_eq!(map.normalize("大小").await.unwrap(), None);
        assert_eq!(map.normalize("HJ-٠٧-٠٠٠١-5927").await.unwrap(), None);
        assert_eq!(map.normalize("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn valid_ids_skip_the_bulk_file() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        std::fs::remove_file(layout.extended_data()).unwrap();
        let map = id_map(&layout);

        assert!(map.normalize("HJ-07-0001-5927").await.is_ok());
        assert!(!map.is_built());
    }

    #[tokio::test]
    async fn missing_or_malformed_bulk_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        std::fs::remove_file(layout.extended_data()).unwrap();
        let map = id_map(&layout);
        assert!(map.id_from_character("一").await.is_err());
        assert!(!map.is_built());

        write_json(&layout.extended_data(), &json!({"characters": "nope"}));
        assert!(map.id_from_character("一").await.is_err());

        write_json(
            &layout.extended_data(),
            &json!({"characters": [{"id": "HJ-15-0001-4E00", "character": "一"}]}),
        );
        assert_eq!(
            map.id_from_character("一").await.unwrap().as_deref(),
            Some("HJ-15-0001-4E00")
        );
    }
}
