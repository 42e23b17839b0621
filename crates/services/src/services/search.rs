//! Substring search over every loaded grade.

use std::sync::Arc;

use db::models::character::CharacterRecord;

use super::grade_loader::GradeLoader;

pub struct SearchService {
    grades: Arc<GradeLoader>,
}

impl SearchService {
    pub fn new(grades: Arc<GradeLoader>) -> Self {
        Self { grades }
    }

    /// Records whose character, meaning or pronunciation contains `query`,
    /// case-sensitively, in grade order 15 down to 1. A blank query matches
    /// nothing.
    pub async fn search(&self, query: &str) -> Vec<CharacterRecord> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.grades
            .all_characters()
            .await
            .into_iter()
            .filter(|c| {
                c.character.contains(query)
                    || c.meaning.contains(query)
                    || c.pronunciation.contains(query)
            })
            .collect()
    }
}
