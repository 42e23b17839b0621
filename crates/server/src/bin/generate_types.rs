use db::models::{
    character::{CharacterRecord, CommonWord, Example, ExampleSentence, ExtendedData, RecordMetadata, StrokeOrder},
    grade::{GradeMetadata, GradeStore, GradeSummary},
    stroke::StrokeAnimation,
};
use services::services::listing::{CharacterPage, GradeOverview, GradeSection};
use server::routes::{
    hanja::{AllIds, GradeCharacters, HanjaData, HanjaListing, IdLookup, RelatedResponse},
    health::HealthResponse,
    search::SearchResponse,
};
use ts_rs::TS;
use utils::response::ErrorBody;

fn main() -> anyhow::Result<()> {
    let decls = [
        Example::decl(),
        CommonWord::decl(),
        StrokeOrder::decl(),
        ExampleSentence::decl(),
        ExtendedData::decl(),
        RecordMetadata::decl(),
        CharacterRecord::decl(),
        GradeMetadata::decl(),
        GradeStore::decl(),
        GradeSummary::decl(),
        RelatedResponse::decl(),
        GradeCharacters::decl(),
        IdLookup::decl(),
        AllIds::decl(),
        HanjaData::decl(),
        StrokeAnimation::decl(),
        CharacterPage::decl(),
        GradeSection::decl(),
        GradeOverview::decl(),
        HanjaListing::decl(),
        SearchResponse::decl(),
        HealthResponse::decl(),
        ErrorBody::decl(),
    ];

    let mut out = String::from("// Generated by `cargo run --bin generate_types`. Do not edit.\n\n");
    for decl in decls {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }

    match std::env::args().nth(1) {
        Some(path) => std::fs::write(&path, out)?,
        None => print!("{out}"),
    }
    Ok(())
}
