pub mod clock;
pub mod glyph_svg;
pub mod grade_loader;
pub mod grade_summary;
pub mod hanja_cache;
pub mod hanja_client;
pub mod id_map;
pub mod legacy_mapping;
pub mod legacy_store;
pub mod listing;
pub mod resolver;
pub mod search;
pub mod stroke_data;
pub mod stroke_files;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;
