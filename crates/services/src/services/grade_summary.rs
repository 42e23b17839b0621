//! Grade summaries served by `GET /api/grade/{grade}`.

use std::sync::Arc;

use db::{
    DBService,
    models::{character::RecordMetadata, grade::GradeSummary},
};
use tracing::{debug, info, warn};
use utils::hanja_id::{HanjaId, MAX_GRADE, MIN_GRADE, single_char};

use super::{grade_loader::GradeLoader, legacy_mapping::LegacyMapping, legacy_store::LegacyStore};

/// Where a summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    File,
    GradeStore,
    Legacy,
}

/// Resolves a grade summary from, in order: the summary file, the grade
/// store, and the legacy level mapped to the grade. Legacy-derived
/// summaries are written back to the summary file.
pub struct GradeSummaryService {
    db: DBService,
    grades: Arc<GradeLoader>,
    legacy: Arc<LegacyStore>,
    mapping: Arc<LegacyMapping>,
}

impl GradeSummaryService {
    pub fn new(
        db: DBService,
        grades: Arc<GradeLoader>,
        legacy: Arc<LegacyStore>,
        mapping: Arc<LegacyMapping>,
    ) -> Self {
        Self {
            db,
            grades,
            legacy,
            mapping,
        }
    }

    pub async fn summary(&self, grade: u8) -> Option<GradeSummary> {
        self.summary_with_source(grade).await.map(|(summary, _)| summary)
    }

    pub async fn summary_with_source(&self, grade: u8) -> Option<(GradeSummary, SummarySource)> {
        if !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
            return None;
        }
        if let Some(summary) = self.from_file(grade).await {
            return Some((summary, SummarySource::File));
        }
        if let Some(summary) = self.from_grade_store(grade).await {
            return Some((summary, SummarySource::GradeStore));
        }
        let summary = self.from_legacy(grade).await?;
        let path = self.db.layout.grade_summary(grade);
        match self.db.write_json(&path, &summary).await {
            Ok(()) => info!(grade = grade, path = %path.display(), "wrote derived grade summary"),
            Err(e) => warn!(grade = grade, error = %e, "failed to write derived grade summary"),
        }
        Some((summary, SummarySource::Legacy))
    }

    async fn from_file(&self, grade: u8) -> Option<GradeSummary> {
        let path = self.db.layout.grade_summary(grade);
        match self.db.read_json::<GradeSummary>(&path).await {
            Ok(summary) if summary.grade == grade => Some(summary),
            Ok(summary) => {
                warn!(grade = grade, file_grade = summary.grade, "grade summary file holds another grade");
                None
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                warn!(grade = grade, error = %e, "unreadable grade summary file");
                None
            }
        }
    }

    async fn from_grade_store(&self, grade: u8) -> Option<GradeSummary> {
        let store = self.grades.load_grade(grade).await?;
        let character_ids = store.character_ids();
        if character_ids.is_empty() {
            debug!(grade = grade, quarantined = store.quarantined, "grade store has no usable records");
            return None;
        }
        Some(GradeSummary {
            grade,
            name: GradeSummary::default_name(grade),
            description: GradeSummary::default_description(grade),
            category: self
                .mapping
                .level_for(grade)
                .map(|level| self.mapping.display_name(level.category)),
            character_count: character_ids.len(),
            character_ids,
            metadata: None,
        })
    }

    async fn from_legacy(&self, grade: u8) -> Option<GradeSummary> {
        let Some(level_ref) = self.mapping.level_for(grade) else {
            debug!(grade = grade, "grade has no legacy mapping");
            return None;
        };
        let database = self.legacy.get().await?;
        let level = database
            .category(level_ref.category)?
            .level(&level_ref.level)?;

        let mut character_ids = Vec::with_capacity(level.characters.len());
        for entry in &level.characters {
            let Some(c) = single_char(&entry.character) else {
                warn!(grade = grade, index = entry.index, "legacy entry is not a single character");
                continue;
            };
            match HanjaId::derive(grade, entry.index, c) {
                Ok(id) => character_ids.push(id.to_string()),
                Err(e) => warn!(grade = grade, error = %e, "cannot derive id for legacy entry"),
            }
        }

        Some(GradeSummary {
            grade,
            name: GradeSummary::default_name(grade),
            description: level
                .description
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| GradeSummary::default_description(grade)),
            category: Some(self.mapping.display_name(level_ref.category)),
            character_count: character_ids.len(),
            character_ids,
            metadata: Some(RecordMetadata::derived_from_legacy()),
        })
    }
}

#[cfg(test)]
mod tests {
    use db::DataLayout;
    use serde_json::json;

    use super::*;
    use crate::services::test_fixtures::{context, seed, write_grade, write_json};

    fn service(layout: &DataLayout) -> GradeSummaryService {
        let ctx = context(layout);
        GradeSummaryService::new(ctx.db, ctx.grades, ctx.legacy, ctx.mapping)
    }

    #[tokio::test]
    async fn summary_file_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        write_json(
            &layout.grade_summary(7),
            &json!({
                "grade": 7,
                "name": "칠급",
                "description": "파일",
                "character_count": 1,
                "character_ids": ["HJ-07-0001-5927"]
            }),
        );
        let (summary, source) = service(&layout).summary_with_source(7).await.unwrap();
        assert_eq!(source, SummarySource::File);
        assert_eq!(summary.name, "칠급");
    }

    #[tokio::test]
    async fn grade_store_is_summarized_in_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let (summary, source) = service(&layout).summary_with_source(7).await.unwrap();

        assert_eq!(source, SummarySource::GradeStore);
        assert_eq!(summary.character_ids, ["HJ-07-0001-5927", "HJ-07-0002-5C0F"]);
        assert_eq!(summary.character_count, 2);
        assert_eq!(summary.name, "7급");
        assert_eq!(summary.category.as_deref(), Some("university"));
        assert!(!layout.grade_summary(7).exists());
    }

    #[tokio::test]
    async fn legacy_level_is_summarized_and_written_back() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        std::fs::remove_file(layout.grade_store(15)).unwrap();
        let (summary, source) = service(&layout).summary_with_source(15).await.unwrap();

        assert_eq!(source, SummarySource::Legacy);
        assert_eq!(
            summary.character_ids,
            ["HJ-15-0001-4E00", "HJ-15-0002-4E8C", "HJ-15-0003-5C71"]
        );
        assert_eq!(summary.description, "기초 1단계");
        assert_eq!(summary.category.as_deref(), Some("beginner"));
        assert!(layout.grade_summary(15).exists());

        let (_, again) = service(&layout).summary_with_source(15).await.unwrap();
        assert_eq!(again, SummarySource::File);
    }

    #[tokio::test]
    async fn empty_grade_store_falls_through_to_legacy() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        write_grade(&layout, 15, json!([]));
        let (summary, source) = service(&layout).summary_with_source(15).await.unwrap();

        assert_eq!(source, SummarySource::Legacy);
        assert_eq!(summary.character_count, 3);
    }

    #[tokio::test]
    async fn fully_quarantined_grade_store_is_not_a_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        // The record claims grade 15 but sits in grade 7's file.
        write_grade(
            &layout,
            7,
            json!([crate::services::test_fixtures::record("HJ-15-0001-4E00", "一", 15, 1, "한", "일")]),
        );
        std::fs::remove_file(layout.legacy_database()).unwrap();

        assert!(service(&layout).summary(7).await.is_none());
    }

    #[tokio::test]
    async fn unmapped_or_out_of_range_grades_have_no_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let service = service(&layout);

        assert!(service.summary(0).await.is_none());
        assert!(service.summary(16).await.is_none());
        assert!(service.summary(2).await.is_none());
        // Mapped, but the legacy database has no advanced category.
        assert!(service.summary(10).await.is_none());
    }
}
