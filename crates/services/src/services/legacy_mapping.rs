//! Grade <-> legacy (category, level) table, and the display names legacy
//! categories take in derived documents.
//!
//! Only grades 4-15 have a known home in the legacy database. Grades 1-3 must
//! be supplied through a mapping file; nothing is inferred for them.

use std::{collections::BTreeMap, path::Path};

use db::models::legacy::LegacyCategory;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utils::hanja_id::{MAX_GRADE, MIN_GRADE};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("cannot read mapping file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid mapping file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("mapping key '{0}' is not a grade between 1 and 15")]
    InvalidGrade(String),
    #[error("unknown legacy category '{0}'")]
    UnknownCategory(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRef {
    pub category: LegacyCategory,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMapping {
    grades: BTreeMap<u8, LevelRef>,
    category_names: BTreeMap<LegacyCategory, String>,
}

/// On-disk shape of a mapping override file.
///
/// ```toml
/// [grades]
/// 3 = { category = "university", level = "level5" }
///
/// [category_names]
/// basic = "beginner"
/// ```
#[derive(Debug, Default, Deserialize)]
struct MappingFile {
    #[serde(default)]
    grades: BTreeMap<String, LevelRef>,
    #[serde(default)]
    category_names: BTreeMap<String, String>,
}

impl Default for LegacyMapping {
    fn default() -> Self {
        use LegacyCategory::*;

        let table: [(u8, LegacyCategory, &str); 12] = [
            (15, Basic, "level1"),
            (14, Basic, "level2"),
            (13, Basic, "level3"),
            (12, Basic, "level4"),
            (11, Basic, "level5"),
            (10, Advanced, "level1"),
            (9, Advanced, "level2"),
            (8, Advanced, "level3"),
            (7, University, "level1"),
            (6, University, "level2"),
            (5, University, "level3"),
            (4, University, "level4"),
        ];
        let grades = table
            .into_iter()
            .map(|(grade, category, level)| {
                (
                    grade,
                    LevelRef {
                        category,
                        level: level.to_string(),
                    },
                )
            })
            .collect();

        let category_names = [
            (Basic, "beginner"),
            (Advanced, "advanced"),
            (University, "university"),
        ]
        .into_iter()
        .map(|(category, name)| (category, name.to_string()))
        .collect();

        Self {
            grades,
            category_names,
        }
    }
}

impl LegacyMapping {
    /// Default table with the entries of a TOML document layered on top.
    pub fn with_overrides(toml_source: &str) -> Result<Self, MappingError> {
        let file: MappingFile = toml::from_str(toml_source)?;
        let mut mapping = Self::default();
        for (key, level) in file.grades {
            let grade = key
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|g| (MIN_GRADE..=MAX_GRADE).contains(g))
                .ok_or_else(|| MappingError::InvalidGrade(key.clone()))?;
            mapping.grades.insert(grade, level);
        }
        for (key, name) in file.category_names {
            let category = key
                .parse::<LegacyCategory>()
                .map_err(|_| MappingError::UnknownCategory(key.clone()))?;
            mapping.category_names.insert(category, name);
        }
        Ok(mapping)
    }

    pub fn from_file(path: &Path) -> Result<Self, MappingError> {
        let source = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::with_overrides(&source)
    }

    pub fn level_for(&self, grade: u8) -> Option<&LevelRef> {
        self.grades.get(&grade)
    }

    pub fn grade_for(&self, category: LegacyCategory, level: &str) -> Option<u8> {
        self.grades
            .iter()
            .find(|(_, r)| r.category == category && r.level == level)
            .map(|(grade, _)| *grade)
    }

    /// Name a legacy category carries in derived documents.
    pub fn display_name(&self, category: LegacyCategory) -> String {
        self.category_names
            .get(&category)
            .cloned()
            .unwrap_or_else(|| category.to_string())
    }
}
