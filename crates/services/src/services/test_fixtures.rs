//! Small on-disk corpus shared by the service and API tests.
//!
//! grade 15: 一 (HJ-15-0001-4E00), 二 (HJ-15-0002-4E8C, related to 一 and 三)
//! grade 7:  大 (HJ-07-0001-5927), 小 (HJ-07-0002-5C0F)
//! legacy:   basic/level1 = 一 二 山, university/level1 = 人 大
//! bulk:     一 二 大 小
//! glyphs:   大.svg
//! strokes:  大.json (three strokes)

use std::{path::Path, sync::Arc};

use db::{DBService, DataLayout};
use serde_json::{Value, json};

use super::{
    grade_loader::GradeLoader, legacy_mapping::LegacyMapping, legacy_store::LegacyStore,
    resolver::ResolveContext,
};

pub const GLYPH_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0"/></svg>"#;

pub fn record(id: &str, character: &str, grade: u8, order: u32, meaning: &str, reading: &str) -> Value {
    json!({
        "id": id,
        "character": character,
        "meaning": meaning,
        "pronunciation": reading,
        "stroke_count": 3,
        "radical": character,
        "grade": grade,
        "order": order,
        "tags": []
    })
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn write_grade(layout: &DataLayout, grade: u8, characters: Value) {
    let count = characters.as_array().map(|a| a.len()).unwrap_or(0);
    write_json(
        &layout.grade_store(grade),
        &json!({
            "metadata": {
                "version": "1.0.0",
                "last_updated": "2024-01-01T00:00:00.000Z",
                "total_characters": count,
                "grade": grade
            },
            "characters": characters
        }),
    );
}

pub fn legacy_database() -> Value {
    json!({
        "basic": {
            "name": "기초",
            "levels": {
                "level1": {
                    "name": "1단계",
                    "description": "기초 1단계",
                    "characters": [
                        { "character": "一", "meaning": "한", "pronunciation": "일", "stroke_count": 1, "radical": "一" },
                        { "character": "二", "meaning": "두", "pronunciation": "이", "stroke_count": 2, "radical": "二" },
                        { "character": "山", "meaning": "메", "pronunciation": "산", "stroke_count": 3, "radical": "山" }
                    ]
                }
            }
        },
        "university": {
            "name": "대학",
            "levels": {
                "level1": {
                    "name": "대학 1단계",
                    "characters": [
                        { "character": "人", "meaning": "사람", "pronunciation": "인", "stroke_count": 2, "radical": "人",
                          "examples": [{ "word": "人間", "meaning": "사람", "pronunciation": "인간" }] },
                        { "character": "大", "meaning": "큰", "pronunciation": "대", "stroke_count": 3, "radical": "大" }
                    ]
                }
            }
        }
    })
}

/// Writes the full corpus under `dir` and returns its layout.
pub fn seed(dir: &Path) -> DataLayout {
    let layout = DataLayout::new(dir.join("data"), dir.join("public"));

    let mut two = record("HJ-15-0002-4E8C", "二", 15, 2, "두", "이");
    two["extended_data"] = json!({
        "etymology": "가로획 둘",
        "related_characters": ["HJ-15-0001-4E00", "HJ-15-0003-4E09"]
    });
    write_grade(
        &layout,
        15,
        json!([record("HJ-15-0001-4E00", "一", 15, 1, "한", "일"), two]),
    );
    write_grade(
        &layout,
        7,
        json!([
            record("HJ-07-0001-5927", "大", 7, 1, "큰", "대"),
            record("HJ-07-0002-5C0F", "小", 7, 2, "작을", "소"),
        ]),
    );
    write_json(
        &layout.extended_data(),
        &json!({
            "characters": [
                { "id": "HJ-15-0001-4E00", "character": "一" },
                { "id": "HJ-15-0002-4E8C", "character": "二" },
                { "id": "HJ-07-0001-5927", "character": "大" },
                { "id": "HJ-07-0002-5C0F", "character": "小" }
            ]
        }),
    );
    write_json(&layout.legacy_database(), &legacy_database());
    write_json(
        &layout.stroke_files('大')[0],
        &json!({
            "character": "大",
            "strokes": ["M 10 40 L 90 40", "M 50 10 L 20 90", "M 50 40 L 80 90"],
            "medians": [[[10, 40], [90, 40]], [[50, 10], [20, 90]], [[50, 40], [80, 90]]]
        }),
    );

    let glyph = layout.glyph_svg('大');
    std::fs::create_dir_all(glyph.parent().unwrap()).unwrap();
    std::fs::write(glyph, GLYPH_SVG).unwrap();
    layout
}

pub fn loader(layout: &DataLayout) -> Arc<GradeLoader> {
    Arc::new(GradeLoader::new(DBService::new(layout.clone())))
}

pub fn mapping() -> Arc<LegacyMapping> {
    Arc::new(LegacyMapping::default())
}

pub fn context(layout: &DataLayout) -> ResolveContext {
    let db = DBService::new(layout.clone());
    ResolveContext {
        db: db.clone(),
        grades: loader(layout),
        legacy: Arc::new(LegacyStore::new(db)),
        mapping: mapping(),
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
