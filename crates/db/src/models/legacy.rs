//! The monolithic `hanja_database.json` the per-grade files were split from.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};
use strum_macros::{Display, EnumString};
use tracing::warn;

use super::character::Example;

/// Legacy top-level categories, in the order they are scanned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LegacyCategory {
    Basic,
    Advanced,
    University,
}

impl LegacyCategory {
    pub const SCAN_ORDER: [LegacyCategory; 3] = [
        LegacyCategory::Basic,
        LegacyCategory::Advanced,
        LegacyCategory::University,
    ];
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyCharacter {
    pub character: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub pronunciation: String,
    #[serde(default)]
    pub stroke_count: u32,
    #[serde(default)]
    pub radical: String,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub order: Option<u32>,
    /// Zero-based position in the level's list as written in the file,
    /// counting entries that were quarantined.
    #[serde(skip)]
    pub index: usize,
}

/// A level as it sits on disk, before entry validation.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawLegacyLevel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    characters: Vec<serde_json::Value>,
}

/// Entries that fail to parse are dropped and counted in `quarantined`
/// instead of failing the whole database.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawLegacyLevel")]
pub struct LegacyLevel {
    pub name: String,
    pub description: Option<String>,
    pub characters: Vec<LegacyCharacter>,
    pub quarantined: usize,
}

impl From<RawLegacyLevel> for LegacyLevel {
    fn from(raw: RawLegacyLevel) -> Self {
        let mut characters = Vec::with_capacity(raw.characters.len());
        let mut quarantined = 0;
        for (index, value) in raw.characters.into_iter().enumerate() {
            match serde_json::from_value::<LegacyCharacter>(value) {
                Ok(mut character) => {
                    character.index = index;
                    characters.push(character);
                }
                Err(e) => {
                    warn!(
                        level = raw.name.as_deref().unwrap_or_default(),
                        index = index,
                        error = %e,
                        "quarantining malformed legacy entry"
                    );
                    quarantined += 1;
                }
            }
        }
        Self {
            name: raw.name.unwrap_or_default(),
            description: raw.description,
            characters,
            quarantined,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyCategoryData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_characters: u32,
    /// Level key (`level1`, ...) to level, in file order.
    #[serde(default, deserialize_with = "ordered_levels")]
    pub levels: Vec<(String, LegacyLevel)>,
}

impl LegacyCategoryData {
    pub fn level(&self, key: &str) -> Option<&LegacyLevel> {
        self.levels
            .iter()
            .find(|(level_key, _)| level_key == key)
            .map(|(_, level)| level)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyDatabase {
    #[serde(default)]
    pub basic: Option<LegacyCategoryData>,
    #[serde(default)]
    pub advanced: Option<LegacyCategoryData>,
    #[serde(default)]
    pub university: Option<LegacyCategoryData>,
}

/// Where a character was found in the legacy database.
#[derive(Debug, Clone, Copy)]
pub struct LegacyMatch<'a> {
    pub category: LegacyCategory,
    pub level_key: &'a str,
    pub level: &'a LegacyLevel,
    /// Zero-based position in the level's character list on disk.
    pub index: usize,
    pub character: &'a LegacyCharacter,
}

impl LegacyDatabase {
    pub fn category(&self, category: LegacyCategory) -> Option<&LegacyCategoryData> {
        match category {
            LegacyCategory::Basic => self.basic.as_ref(),
            LegacyCategory::Advanced => self.advanced.as_ref(),
            LegacyCategory::University => self.university.as_ref(),
        }
    }

    /// Every occurrence of `character`, in scan order: categories
    /// `basic, advanced, university`, then levels in file order.
    pub fn occurrences<'a>(&'a self, character: &'a str) -> impl Iterator<Item = LegacyMatch<'a>> + 'a {
        LegacyCategory::SCAN_ORDER
            .into_iter()
            .filter_map(move |category| self.category(category).map(|data| (category, data)))
            .flat_map(move |(category, data)| {
                data.levels.iter().flat_map(move |(level_key, level)| {
                    level
                        .characters
                        .iter()
                        .filter(move |c| c.character == character)
                        .map(move |c| LegacyMatch {
                            category,
                            level_key: level_key.as_str(),
                            level,
                            index: c.index,
                            character: c,
                        })
                })
            })
    }

    /// First occurrence of `character` in scan order.
    pub fn find<'a>(&'a self, character: &'a str) -> Option<LegacyMatch<'a>> {
        self.occurrences(character).next()
    }
}

fn ordered_levels<'de, D>(deserializer: D) -> Result<Vec<(String, LegacyLevel)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LevelsVisitor;

    impl<'de> Visitor<'de> for LevelsVisitor {
        type Value = Vec<(String, LegacyLevel)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of level key to level")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut levels = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, level)) = map.next_entry::<String, LegacyLevel>()? {
                levels.push((key, level));
            }
            Ok(levels)
        }
    }

    deserializer.deserialize_map(LevelsVisitor)
}
