use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils::hanja_id::{HanjaId, MAX_GRADE, MIN_GRADE, single_char};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid id '{0}'")]
    InvalidId(String),
    #[error("character field '{0}' is not a single code point")]
    NotSingleCharacter(String),
    #[error("grade {0} outside 1-15")]
    GradeOutOfRange(u8),
    #[error("stroke count must be positive")]
    ZeroStrokeCount,
    #[error("id {id} does not encode character '{character}'")]
    IdCharacterMismatch { id: String, character: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Example {
    pub word: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub pronunciation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CommonWord {
    pub word: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_meaning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct StrokeOrder {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub directions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ExampleSentence {
    pub hanja: String,
    #[serde(default)]
    pub hangul: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Enrichment fields. Absent fields mean "not yet enriched".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ExtendedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_meaning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etymology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonics: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_words: Vec<CommonWord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pronunciation_guide: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_order: Option<StrokeOrder>,
    /// IDs of related characters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_characters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub example_sentences: Vec<ExampleSentence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct RecordMetadata {
    pub version: String,
    pub last_updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub validated: bool,
}

impl RecordMetadata {
    /// Metadata stamped on documents synthesized from the legacy database.
    pub fn derived_from_legacy() -> Self {
        Self {
            version: "1.0.0".to_string(),
            last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source: Some("Legacy Database".to_string()),
            validated: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CharacterRecord {
    pub id: String,
    pub character: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode: Option<String>,
    pub meaning: String,
    pub pronunciation: String,
    pub stroke_count: u32,
    #[serde(default)]
    pub radical: String,
    pub grade: u8,
    #[serde(default, alias = "order_in_grade")]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_data: Option<ExtendedData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecordMetadata>,
}

impl CharacterRecord {
    /// Checks the structural invariants a record must hold to be served:
    /// a well-formed id, a single-code-point character that the id encodes,
    /// a positive stroke count and a grade in 1..=15.
    pub fn validate(&self) -> Result<HanjaId, RecordError> {
        let id: HanjaId = self
            .id
            .parse()
            .map_err(|_| RecordError::InvalidId(self.id.clone()))?;
        let character = single_char(&self.character)
            .ok_or_else(|| RecordError::NotSingleCharacter(self.character.clone()))?;
        if !(MIN_GRADE..=MAX_GRADE).contains(&self.grade) {
            return Err(RecordError::GradeOutOfRange(self.grade));
        }
        if self.stroke_count == 0 {
            return Err(RecordError::ZeroStrokeCount);
        }
        if id.code_point != character as u32 {
            return Err(RecordError::IdCharacterMismatch {
                id: self.id.clone(),
                character: self.character.clone(),
            });
        }
        Ok(id)
    }

    pub fn has_id(&self, id: &HanjaId) -> bool {
        self.id.eq_ignore_ascii_case(&id.to_string())
    }

    pub fn related_ids(&self) -> &[String] {
        self.extended_data
            .as_ref()
            .map(|data| data.related_characters.as_slice())
            .unwrap_or_default()
    }
}

/// Entry of the bulk extended data file; only the identity fields matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkEntry {
    pub id: String,
    pub character: String,
}

/// `hanja_extended.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkCharacterFile {
    pub characters: Vec<BulkEntry>,
}
