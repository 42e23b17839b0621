//! Character lookup as an ordered chain of strategies.
//!
//! The default chain is `EmbeddedGrade -> GradeScan -> RecordFile -> Legacy`.
//! Every strategy treats its own I/O and parse failures as a miss, so the
//! chain only ever answers "found, and where" or "not found".

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use db::{
    DBService,
    models::{
        character::{CharacterRecord, RecordMetadata},
        legacy::LegacyMatch,
    },
};
use strum_macros::{Display, EnumString};
use tracing::{debug, info, warn};
use utils::hanja_id::{
    HanjaId, MAX_GRADE, MIN_GRADE, percent_decoded_char, single_char,
};

use super::{grade_loader::GradeLoader, legacy_mapping::LegacyMapping, legacy_store::LegacyStore};

/// What a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    Id(HanjaId),
    Character(char),
}

impl Identifier {
    /// A valid ID, a single character, or a percent-encoded single character.
    pub fn parse(input: &str) -> Option<Self> {
        if let Ok(id) = input.parse::<HanjaId>() {
            return Some(Self::Id(id));
        }
        single_char(input)
            .or_else(|| percent_decoded_char(input))
            .map(Self::Character)
    }

    /// The character being looked up; for an ID, the one its hex segment encodes.
    pub fn character(&self) -> Option<char> {
        match self {
            Self::Id(id) => id.character(),
            Self::Character(c) => Some(*c),
        }
    }

    fn matches(&self, record: &CharacterRecord) -> bool {
        match self {
            Self::Id(id) => record.has_id(id),
            Self::Character(c) => single_char(&record.character) == Some(*c),
        }
    }
}

/// Shared stores every strategy reads from.
#[derive(Clone)]
pub struct ResolveContext {
    pub db: DBService,
    pub grades: Arc<GradeLoader>,
    pub legacy: Arc<LegacyStore>,
    pub mapping: Arc<LegacyMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ResolveSource {
    EmbeddedGrade,
    GradeScan,
    RecordFile,
    Legacy,
}

/// Outcome of persisting a derived record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBack {
    Written(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: CharacterRecord,
    pub source: ResolveSource,
    /// Set only when the winning strategy derives records that are written
    /// back to `characters/<ID>.json`.
    pub write_back: Option<WriteBack>,
}

#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn source(&self) -> ResolveSource;

    /// Whether a hit should be persisted as a per-ID record file.
    fn writes_back(&self) -> bool {
        false
    }

    async fn resolve(&self, identifier: &Identifier, ctx: &ResolveContext)
    -> Option<CharacterRecord>;
}

/// Looks only in the grade file named by the ID.
pub struct EmbeddedGrade;

#[async_trait]
impl ResolveStrategy for EmbeddedGrade {
    fn source(&self) -> ResolveSource {
        ResolveSource::EmbeddedGrade
    }

    async fn resolve(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Option<CharacterRecord> {
        let Identifier::Id(id) = identifier else {
            return None;
        };
        let store = ctx.grades.load_grade(id.grade).await?;
        store.characters.iter().find(|c| c.has_id(id)).cloned()
    }
}

/// Scans every grade, 15 down to 1.
pub struct GradeScan;

#[async_trait]
impl ResolveStrategy for GradeScan {
    fn source(&self) -> ResolveSource {
        ResolveSource::GradeScan
    }

    async fn resolve(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Option<CharacterRecord> {
        for grade in (MIN_GRADE..=MAX_GRADE).rev() {
            let Some(store) = ctx.grades.load_grade(grade).await else {
                continue;
            };
            if let Some(record) = store.characters.iter().find(|c| identifier.matches(c)) {
                return Some(record.clone());
            }
        }
        None
    }
}

/// Per-ID record files, the target of legacy write-backs.
pub struct RecordFile;

impl RecordFile {
    async fn read(ctx: &ResolveContext, id: &HanjaId) -> Option<CharacterRecord> {
        let path = ctx.db.layout.character_record(&id.to_string());
        let record: CharacterRecord = match ctx.db.read_json(&path).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return None,
            Err(e) => {
                warn!(id = %id, error = %e, "unreadable character record file");
                return None;
            }
        };
        match record.validate() {
            Ok(stored) if stored == *id => Some(record),
            Ok(stored) => {
                warn!(id = %id, stored = %stored, "character record file holds another id");
                None
            }
            Err(e) => {
                warn!(id = %id, error = %e, "invalid character record file");
                None
            }
        }
    }

    /// IDs of record files whose hex segment encodes `character`, sorted.
    async fn ids_for_character(ctx: &ResolveContext, character: char) -> Vec<HanjaId> {
        let dir = ctx.db.layout.characters_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "no character record directory");
                return Vec::new();
            }
        };

        let mut ids = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "failed to list character records");
                    break;
                }
            };
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            match stem.parse::<HanjaId>() {
                Ok(id) if id.character() == Some(character) => ids.push(id),
                _ => {}
            }
        }
        ids.sort_by_key(|id| id.to_string());
        ids
    }
}

#[async_trait]
impl ResolveStrategy for RecordFile {
    fn source(&self) -> ResolveSource {
        ResolveSource::RecordFile
    }

    async fn resolve(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Option<CharacterRecord> {
        match identifier {
            Identifier::Id(id) => Self::read(ctx, id).await,
            Identifier::Character(c) => {
                for id in Self::ids_for_character(ctx, *c).await {
                    if let Some(record) = Self::read(ctx, &id).await {
                        return Some(record);
                    }
                }
                None
            }
        }
    }
}

/// Derives records from `hanja_database.json`.
pub struct Legacy;

impl Legacy {
    fn derive(
        id: HanjaId,
        order: u32,
        found: &LegacyMatch<'_>,
        mapping: &LegacyMapping,
    ) -> Option<CharacterRecord> {
        let character = id.character()?;
        let legacy = found.character;
        let record = CharacterRecord {
            id: id.to_string(),
            character: character.to_string(),
            unicode: Some(id.unicode_hex()),
            meaning: legacy.meaning.clone(),
            pronunciation: legacy.pronunciation.clone(),
            stroke_count: legacy.stroke_count,
            radical: legacy.radical.clone(),
            grade: id.grade,
            order,
            category: Some(mapping.display_name(found.category)),
            tags: Vec::new(),
            examples: legacy.examples.clone(),
            extended_data: None,
            metadata: Some(RecordMetadata::derived_from_legacy()),
        };
        match record.validate() {
            Ok(_) => Some(record),
            Err(e) => {
                warn!(id = %id, error = %e, "legacy entry does not make a valid record");
                None
            }
        }
    }
}

#[async_trait]
impl ResolveStrategy for Legacy {
    fn source(&self) -> ResolveSource {
        ResolveSource::Legacy
    }

    fn writes_back(&self) -> bool {
        true
    }

    async fn resolve(
        &self,
        identifier: &Identifier,
        ctx: &ResolveContext,
    ) -> Option<CharacterRecord> {
        let character = identifier.character()?.to_string();
        let database = ctx.legacy.get().await?;

        match identifier {
            Identifier::Id(id) => {
                if !(MIN_GRADE..=MAX_GRADE).contains(&id.grade) {
                    return None;
                }
                let found = database.find(&character)?;
                Self::derive(*id, id.ordinal, &found, &ctx.mapping)
            }
            Identifier::Character(c) => database.occurrences(&character).find_map(|found| {
                let Some(grade) = ctx.mapping.grade_for(found.category, found.level_key) else {
                    debug!(
                        category = %found.category,
                        level = found.level_key,
                        "legacy level has no grade mapping"
                    );
                    return None;
                };
                let id = match HanjaId::derive(grade, found.index, *c) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(character = %c, error = %e, "cannot derive id for legacy entry");
                        return None;
                    }
                };
                Self::derive(id, id.ordinal, &found, &ctx.mapping)
            }),
        }
    }
}

/// Tries each strategy in order; the first hit wins.
pub struct CharacterResolver {
    ctx: ResolveContext,
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl CharacterResolver {
    pub fn new(ctx: ResolveContext) -> Self {
        Self::with_strategies(
            ctx,
            vec![
                Box::new(EmbeddedGrade),
                Box::new(GradeScan),
                Box::new(RecordFile),
                Box::new(Legacy),
            ],
        )
    }

    pub fn with_strategies(ctx: ResolveContext, strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { ctx, strategies }
    }

    pub fn context(&self) -> &ResolveContext {
        &self.ctx
    }

    pub async fn resolve(&self, identifier: &Identifier) -> Option<Resolution> {
        for strategy in &self.strategies {
            let Some(record) = strategy.resolve(identifier, &self.ctx).await else {
                continue;
            };
            let source = strategy.source();
            debug!(id = %record.id, source = %source, "character resolved");

            let write_back = if strategy.writes_back() {
                Some(self.write_back(&record).await)
            } else {
                None
            };
            return Some(Resolution {
                record,
                source,
                write_back,
            });
        }
        None
    }

    /// Parses `input` first; unparsable input resolves to nothing.
    pub async fn resolve_str(&self, input: &str) -> Option<Resolution> {
        let identifier = Identifier::parse(input)?;
        self.resolve(&identifier).await
    }

    /// Resolves each related ID of the record for `id`, dropping misses.
    /// `None` when `id` itself does not resolve.
    pub async fn related(&self, id: &HanjaId) -> Option<Vec<CharacterRecord>> {
        let resolution = self.resolve(&Identifier::Id(*id)).await?;
        let mut related = Vec::new();
        for related_id in resolution.record.related_ids() {
            let Ok(parsed) = related_id.parse::<HanjaId>() else {
                debug!(id = %id, related = %related_id, "skipping malformed related id");
                continue;
            };
            if let Some(hit) = self.resolve(&Identifier::Id(parsed)).await {
                related.push(hit.record);
            }
        }
        Some(related)
    }

    async fn write_back(&self, record: &CharacterRecord) -> WriteBack {
        let path = self.ctx.db.layout.character_record(&record.id);
        match self.ctx.db.write_json(&path, record).await {
            Ok(()) => {
                info!(id = %record.id, path = %path.display(), "wrote derived character record");
                WriteBack::Written(path)
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "failed to write derived character record");
                WriteBack::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use db::DataLayout;
    use serde_json::json;

    use super::*;
    use crate::services::test_fixtures::{context, record, seed, write_grade, write_json};

    fn resolver(layout: &DataLayout) -> CharacterResolver {
        CharacterResolver::new(context(layout))
    }

    fn id(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn identifiers_parse_ids_and_characters() {
        assert!(matches!(id("HJ-07-0001-4EBA"), Identifier::Id(_)));
        assert_eq!(id("人"), Identifier::Character('人'));
        assert_eq!(id("%E4%BA%BA"), Identifier::Character('人'));
        assert_eq!(id("HJ-07-0001-4EBA").character(), Some('人'));
        assert!(Identifier::parse("人間").is_none());
        assert!(Identifier::parse("").is_none());
    }

    #[tokio::test]
    async fn id_in_its_own_grade_is_found_there() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let hit = resolver(&layout).resolve(&id("HJ-07-0001-5927")).await.unwrap();

        assert_eq!(hit.source, ResolveSource::EmbeddedGrade);
        assert_eq!(hit.record.character, "大");
        assert!(hit.write_back.is_none());
    }

    #[tokio::test]
    async fn lowercase_hex_finds_the_same_record() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let lower = resolver(&layout).resolve_str("HJ-07-0002-5c0f").await.unwrap();

        assert_eq!(lower.source, ResolveSource::EmbeddedGrade);
        assert_eq!(lower.record.id, "HJ-07-0002-5C0F");
    }

    #[tokio::test]
    async fn characters_are_found_by_scanning_grades() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let hit = resolver(&layout).resolve_str("小").await.unwrap();

        assert_eq!(hit.source, ResolveSource::GradeScan);
        assert_eq!(hit.record.id, "HJ-07-0002-5C0F");
    }

    #[tokio::test]
    async fn id_filed_under_another_grade_is_found_by_the_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        write_grade(
            &layout,
            15,
            json!([
                record("HJ-15-0001-4E00", "一", 15, 1, "한", "일"),
                record("HJ-03-0001-4E09", "三", 15, 2, "석", "삼"),
            ]),
        );
        let hit = resolver(&layout).resolve_str("HJ-03-0001-4E09").await.unwrap();

        assert_eq!(hit.source, ResolveSource::GradeScan);
        assert_eq!(hit.record.grade, 15);
    }

    #[tokio::test]
    async fn legacy_hit_is_derived_and_written_back() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let resolver = resolver(&layout);

        let hit = resolver.resolve_str("HJ-07-0001-4EBA").await.unwrap();
        assert_eq!(hit.source, ResolveSource::Legacy);
        assert_eq!(hit.record.character, "人");
        assert_eq!(hit.record.grade, 7);
        assert_eq!(hit.record.order, 1);
        assert_eq!(hit.record.unicode.as_deref(), Some("4EBA"));
        assert_eq!(hit.record.category.as_deref(), Some("university"));
        assert_eq!(hit.record.examples.len(), 1);
        assert_eq!(
            hit.record.metadata.as_ref().unwrap().source.as_deref(),
            Some("Legacy Database")
        );

        let path = layout.character_record("HJ-07-0001-4EBA");
        assert_eq!(hit.write_back, Some(WriteBack::Written(path.clone())));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn written_back_record_is_served_without_the_legacy_database() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        resolver(&layout).resolve_str("HJ-07-0001-4EBA").await.unwrap();
        std::fs::remove_file(layout.legacy_database()).unwrap();

        let fresh = resolver(&layout);
        let by_id = fresh.resolve_str("HJ-07-0001-4EBA").await.unwrap();
        assert_eq!(by_id.source, ResolveSource::RecordFile);
        assert!(by_id.write_back.is_none());

        let by_char = fresh.resolve_str("人").await.unwrap();
        assert_eq!(by_char.source, ResolveSource::RecordFile);
        assert_eq!(by_char.record.id, "HJ-07-0001-4EBA");
    }

    #[tokio::test]
    async fn character_input_derives_an_id_from_the_grade_mapping() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let hit = resolver(&layout).resolve_str("山").await.unwrap();

        assert_eq!(hit.source, ResolveSource::Legacy);
        assert_eq!(hit.record.id, "HJ-15-0003-5C71");
        assert_eq!(hit.record.category.as_deref(), Some("beginner"));
    }

    #[tokio::test]
    async fn one_malformed_legacy_entry_does_not_hide_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let mut database = crate::services::test_fixtures::legacy_database();
        database["university"]["levels"]["level1"]["characters"][0]["meaning"] = json!(null);
        write_json(&layout.legacy_database(), &database);
        let resolver = resolver(&layout);

        let hit = resolver.resolve_str("山").await.unwrap();
        assert_eq!(hit.source, ResolveSource::Legacy);
        assert_eq!(hit.record.id, "HJ-15-0003-5C71");
        assert!(resolver.resolve_str("人").await.is_none());
    }

    #[tokio::test]
    async fn first_category_in_scan_order_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        write_json(
            &layout.legacy_database(),
            &json!({
                "university": { "levels": { "level1": { "characters": [
                    { "character": "水", "meaning": "물(대학)", "pronunciation": "수", "stroke_count": 4 }
                ]}}},
                "basic": { "levels": { "level2": { "characters": [
                    { "character": "火", "meaning": "불", "pronunciation": "화", "stroke_count": 4 },
                    { "character": "水", "meaning": "물", "pronunciation": "수", "stroke_count": 4 }
                ]}}}
            }),
        );
        let hit = resolver(&layout).resolve_str("水").await.unwrap();

        assert_eq!(hit.record.meaning, "물");
        assert_eq!(hit.record.id, "HJ-14-0002-6C34");
    }

    #[tokio::test]
    async fn unmapped_levels_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        write_json(
            &layout.legacy_database(),
            &json!({
                "university": { "levels": { "level9": { "characters": [
                    { "character": "水", "meaning": "물", "pronunciation": "수", "stroke_count": 4 }
                ]}}}
            }),
        );
        let resolver = resolver(&layout);

        assert!(resolver.resolve_str("水").await.is_none());
        // An explicit ID still resolves: the grade comes from the ID.
        let hit = resolver.resolve_str("HJ-02-0005-6C34").await.unwrap();
        assert_eq!(hit.record.grade, 2);
        assert_eq!(hit.record.order, 5);
    }

    #[tokio::test]
    async fn out_of_range_grade_in_id_is_not_derived() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        assert!(resolver(&layout).resolve_str("HJ-99-0001-4EBA").await.is_none());
        assert!(!layout.character_record("HJ-99-0001-4EBA").exists());
    }

    #[tokio::test]
    async fn unknown_characters_resolve_to_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let resolver = resolver(&layout);
        assert!(resolver.resolve_str("龍").await.is_none());
        assert!(resolver.resolve_str("HJ-01-0001-9F8D").await.is_none());
        assert!(resolver.resolve_str("not an id").await.is_none());
    }

    #[tokio::test]
    async fn broken_legacy_database_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        std::fs::write(layout.legacy_database(), "{ nope").unwrap();
        assert!(resolver(&layout).resolve_str("HJ-07-0001-4EBA").await.is_none());
    }

    #[tokio::test]
    async fn failed_write_back_still_returns_the_record() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        // A file where the record would go makes the write fail.
        let target = layout.character_record("HJ-07-0001-4EBA");
        std::fs::create_dir_all(&target).unwrap();

        let hit = resolver(&layout).resolve_str("HJ-07-0001-4EBA").await.unwrap();
        assert_eq!(hit.record.character, "人");
        assert!(matches!(hit.write_back, Some(WriteBack::Failed(_))));
    }

    #[tokio::test]
    async fn related_drops_unresolvable_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let resolver = resolver(&layout);

        let related = resolver
            .related(&"HJ-15-0002-4E8C".parse().unwrap())
            .await
            .unwrap();
        let chars: Vec<_> = related.iter().map(|r| r.character.as_str()).collect();
        assert_eq!(chars, ["一"]);

        assert!(resolver.related(&"HJ-01-0001-9F8D".parse().unwrap()).await.is_none());
    }

    #[tokio::test]
    async fn custom_chains_run_in_the_given_order() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = seed(tmp.path());
        let ctx = resolver(&layout).context().clone();
        let legacy_first = CharacterResolver::with_strategies(
            ctx,
            vec![Box::new(Legacy), Box::new(GradeScan)],
        );

        let hit = legacy_first.resolve_str("大").await.unwrap();
        assert_eq!(hit.source, ResolveSource::Legacy);
    }
}
