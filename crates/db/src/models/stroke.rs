use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrokeFileError {
    #[error("stroke file has no strokes")]
    NoStrokes,
    #[error("{medians} medians for {strokes} strokes")]
    MedianCount { strokes: usize, medians: usize },
}

/// Locally stored stroke animation in hanzi-writer layout: one SVG path per
/// stroke plus the stroke's median polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct StrokeAnimation {
    #[serde(default)]
    pub character: String,
    pub strokes: Vec<String>,
    #[serde(default)]
    #[ts(type = "Array<Array<[number, number]>>")]
    pub medians: Vec<serde_json::Value>,
}

impl StrokeAnimation {
    /// Checks the document and stamps `character` with the character it was
    /// requested under, whatever the file says.
    pub fn for_character(mut self, character: char) -> Result<Self, StrokeFileError> {
        if self.strokes.is_empty() {
            return Err(StrokeFileError::NoStrokes);
        }
        if !self.medians.is_empty() && self.medians.len() != self.strokes.len() {
            return Err(StrokeFileError::MedianCount {
                strokes: self.strokes.len(),
                medians: self.medians.len(),
            });
        }
        self.character = character.to_string();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> StrokeAnimation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn character_is_taken_from_the_request() {
        let animation = parse(json!({"character": "?", "strokes": ["M 1 2"], "medians": [[[1, 2]]]}))
            .for_character('水')
            .unwrap();
        assert_eq!(animation.character, "水");
        assert_eq!(animation.medians, vec![json!([[1, 2]])]);
    }

    #[test]
    fn medians_are_optional() {
        let animation = parse(json!({"strokes": ["M 1 2", "M 3 4"]}))
            .for_character('二')
            .unwrap();
        assert!(animation.medians.is_empty());
    }

    #[test]
    fn unusable_documents_are_rejected() {
        assert_eq!(
            parse(json!({"strokes": []})).for_character('一'),
            Err(StrokeFileError::NoStrokes)
        );
        assert_eq!(
            parse(json!({"strokes": ["M 1 2", "M 3 4"], "medians": [[[1, 2]]]})).for_character('二'),
            Err(StrokeFileError::MedianCount { strokes: 2, medians: 1 })
        );
    }
}
