use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use super::character::{CharacterRecord, RecordMetadata};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct GradeMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub total_characters: u32,
    #[serde(default)]
    pub grade: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

/// `grade_<N>.json` as it sits on disk, before record validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGradeFile {
    #[serde(default)]
    pub metadata: GradeMetadata,
    #[serde(default)]
    pub characters: Vec<serde_json::Value>,
}

/// A validated grade: every record has `grade == metadata.grade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct GradeStore {
    pub metadata: GradeMetadata,
    pub characters: Vec<CharacterRecord>,
    /// Records dropped at load time (malformed or belonging to another grade).
    #[serde(skip)]
    #[ts(skip)]
    pub quarantined: usize,
}

impl GradeStore {
    /// Validates each raw record against `grade`. Offending records are
    /// quarantined instead of failing the whole file.
    pub fn from_raw(grade: u8, raw: RawGradeFile) -> Self {
        let mut metadata = raw.metadata;
        if metadata.grade != grade {
            warn!(
                grade = grade,
                metadata_grade = metadata.grade,
                "grade file metadata disagrees with its file name"
            );
            metadata.grade = grade;
        }

        let mut characters = Vec::with_capacity(raw.characters.len());
        let mut quarantined = 0;
        for (index, value) in raw.characters.into_iter().enumerate() {
            let record = match serde_json::from_value::<CharacterRecord>(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!(grade = grade, index = index, error = %e, "quarantining malformed record");
                    quarantined += 1;
                    continue;
                }
            };
            if let Err(e) = record.validate() {
                warn!(grade = grade, id = %record.id, error = %e, "quarantining invalid record");
                quarantined += 1;
                continue;
            }
            if record.grade != grade {
                warn!(
                    grade = grade,
                    id = %record.id,
                    record_grade = record.grade,
                    "quarantining record filed under the wrong grade"
                );
                quarantined += 1;
                continue;
            }
            characters.push(record);
        }

        Self {
            metadata,
            characters,
            quarantined,
        }
    }

    pub fn character_ids(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.id.clone()).collect()
    }
}

/// Body of `GET /api/grade/{grade}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct GradeSummary {
    pub grade: u8,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub character_count: usize,
    pub character_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
}

impl GradeSummary {
    pub fn default_name(grade: u8) -> String {
        format!("{grade}급")
    }

    pub fn default_description(grade: u8) -> String {
        format!("{grade}급 한자")
    }
}
