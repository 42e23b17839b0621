use std::path::{Path, PathBuf};

pub const LEGACY_DATABASE_FILE: &str = "hanja_database.json";
pub const EXTENDED_DATA_FILE: &str = "hanja_extended.json";

/// Where each kind of document lives.
///
/// ```text
/// <data_dir>/hanja_database.json                                legacy database
/// <data_dir>/new-structure/characters/hanja_extended.json        bulk id source
/// <data_dir>/new-structure/characters/by-grade/grade_<N>.json    grade stores
/// <data_dir>/new-structure/characters/<ID>.json                  per-id records
/// <data_dir>/new-structure/grades/grade_<N>.json                 grade summaries
/// <public_dir>/images/hanja/<char>.svg                           glyph images
/// <data_dir>/stroke_data/<char>.json                             stroke animations
/// <public_dir>/data/stroke_data/<char>.json                      stroke animations, second choice
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    data_dir: PathBuf,
    public_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            public_dir: public_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn legacy_database(&self) -> PathBuf {
        self.data_dir.join(LEGACY_DATABASE_FILE)
    }

    pub fn characters_dir(&self) -> PathBuf {
        self.data_dir.join("new-structure").join("characters")
    }

    pub fn extended_data(&self) -> PathBuf {
        self.characters_dir().join(EXTENDED_DATA_FILE)
    }

    pub fn grade_store(&self, grade: u8) -> PathBuf {
        self.characters_dir()
            .join("by-grade")
            .join(format!("grade_{grade}.json"))
    }

    pub fn character_record(&self, id: &str) -> PathBuf {
        self.characters_dir().join(format!("{id}.json"))
    }

    pub fn grade_summary(&self, grade: u8) -> PathBuf {
        self.data_dir
            .join("new-structure")
            .join("grades")
            .join(format!("grade_{grade}.json"))
    }

    pub fn glyph_svg(&self, character: char) -> PathBuf {
        self.public_dir
            .join("images")
            .join("hanja")
            .join(format!("{character}.svg"))
    }

    /// Candidate stroke animation files for `character`, in lookup order.
    pub fn stroke_files(&self, character: char) -> [PathBuf; 2] {
        let file = format!("{character}.json");
        [
            self.data_dir.join("stroke_data").join(&file),
            self.public_dir.join("data").join("stroke_data").join(file),
        ]
    }
}
