//! Per-grade character lists, read once per grade and memoized.

use std::sync::Arc;

use dashmap::DashMap;
use db::{
    DBService,
    models::{
        character::CharacterRecord,
        grade::{GradeStore, RawGradeFile},
    },
};
use tracing::{debug, warn};
use utils::hanja_id::{MAX_GRADE, MIN_GRADE};

/// Loads `grade_<N>.json` files. A successfully parsed grade is kept for the
/// loader's lifetime; changes on disk afterwards are not observed. Failures
/// are not memoized.
pub struct GradeLoader {
    db: DBService,
    grades: DashMap<u8, Arc<GradeStore>>,
}

impl GradeLoader {
    pub fn new(db: DBService) -> Self {
        Self {
            db,
            grades: DashMap::new(),
        }
    }

    /// Returns `None` for an out-of-range grade or a missing, unreadable or
    /// unparsable file.
    pub async fn load_grade(&self, grade: u8) -> Option<Arc<GradeStore>> {
        if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
            return None;
        }
        if let Some(store) = self.grades.get(&grade) {
            return Some(store.clone());
        }

        let path = self.db.layout.grade_store(grade);
        let raw: RawGradeFile = match self.db.read_json(&path).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                debug!(grade = grade, "no grade file");
                return None;
            }
            Err(e) => {
                warn!(grade = grade, error = %e, "failed to load grade file");
                return None;
            }
        };

        let store = Arc::new(GradeStore::from_raw(grade, raw));
        debug!(
            grade = grade,
            characters = store.characters.len(),
            quarantined = store.quarantined,
            "grade loaded"
        );
        // Two concurrent first loads both parse; the first insert wins.
        Some(self.grades.entry(grade).or_insert(store).clone())
    }

    /// Every loadable record, grades 15 down to 1, each grade in file order.
    pub async fn all_characters(&self) -> Vec<CharacterRecord> {
        let mut all = Vec::new();
        for grade in (MIN_GRADE..=MAX_GRADE).rev() {
            if let Some(store) = self.load_grade(grade).await {
                all.extend(store.characters.iter().cloned());
            }
        }
        all
    }

    pub fn loaded_grades(&self) -> usize {
        self.grades.len()
    }
}
