use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use db::models::{character::CharacterRecord, grade::GradeStore, stroke::StrokeAnimation};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::{
    listing::{CharacterPage, GradeOverview, Pagination},
    resolver::Identifier,
};
use tracing::debug;
use ts_rs::TS;
use utils::{
    hanja_id::{HanjaId, is_valid_id, parse_grade, percent_decoded_char, single_char},
    response::{CachePolicy, Cached},
};

use super::grade::INVALID_GRADE;
use crate::{DeploymentImpl, error::ApiError};

const INVALID_ID: &str = "invalid hanja id: expected HJ-GG-OOOO-UUUU";

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct RelatedResponse {
    pub id: String,
    pub related: Vec<CharacterRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct GradeCharacters {
    pub grade: u8,
    pub total: usize,
    pub characters: Vec<CharacterRecord>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct IdLookup {
    pub id: String,
    pub character: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct AllIds {
    pub success: bool,
    pub ids: Vec<String>,
    pub count: usize,
}

/// Body of `GET /api/hanja/data`: one record, or a grade's records.
#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
pub enum HanjaData {
    Character(CharacterRecord),
    Grade(GradeCharacters),
}

/// Body of `GET /api/hanja`.
#[derive(Debug, Serialize, TS)]
#[serde(untagged)]
pub enum HanjaListing {
    Character(CharacterRecord),
    Page(CharacterPage),
    Overview(GradeOverview),
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    pub id: Option<String>,
    pub grade: Option<String>,
    pub character: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub id: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StrokeFileParams {
    #[serde(rename = "char")]
    pub char_: Option<String>,
    pub character: Option<String>,
}

fn parse_id(raw: &str) -> Result<HanjaId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(INVALID_ID.to_string()))
}

fn non_empty(param: Option<String>) -> Option<String> {
    param.filter(|v| !v.trim().is_empty())
}

fn parse_count(name: &str, raw: Option<String>) -> Result<Option<usize>, ApiError> {
    non_empty(raw)
        .map(|v| v.trim().parse::<usize>())
        .transpose()
        .map_err(|_| ApiError::BadRequest(format!("'{name}' must be a positive integer")))
}

async fn resolve_id(deployment: &DeploymentImpl, id: HanjaId) -> Result<CharacterRecord, ApiError> {
    deployment
        .resolver()
        .resolve(&Identifier::Id(id))
        .await
        .map(|resolution| resolution.record)
        .ok_or_else(|| ApiError::NotFound(format!("no character with id {id}")))
}

/// GET /api/hanja/{id}
pub async fn get_hanja(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<String>,
) -> Result<Cached<Json<CharacterRecord>>, ApiError> {
    let id = parse_id(&id)?;
    let record = resolve_id(&deployment, id).await?;
    Ok(Cached(CachePolicy::Lookup, Json(record)))
}

/// GET /api/hanja/{id}/related
pub async fn get_related(
    State(deployment): State<DeploymentImpl>,
    Path(id): Path<String>,
) -> Result<Cached<Json<RelatedResponse>>, ApiError> {
    let parsed = parse_id(&id)?;
    let related = deployment
        .resolver()
        .related(&parsed)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no character with id {parsed}")))?;

    Ok(Cached(
        CachePolicy::Lookup,
        Json(RelatedResponse {
            id,
            count: related.len(),
            related,
        }),
    ))
}

/// GET /api/hanja?id=<id or character> | ?search=<text> | ?level=<n>, each
/// with optional `page` and `limit`
///
/// `id` wins over `search`, which wins over `level`. With none of them,
/// every grade is listed with the same page applied to each.
pub async fn list_hanja(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<ListingParams>,
) -> Result<Cached<Json<HanjaListing>>, ApiError> {
    if let Some(raw) = non_empty(params.id) {
        let identifier = Identifier::parse(&raw).ok_or_else(|| ApiError::BadRequest(INVALID_ID.to_string()))?;
        let record = deployment
            .resolver()
            .resolve(&identifier)
            .await
            .map(|resolution| resolution.record)
            .ok_or_else(|| ApiError::NotFound(format!("no character for '{raw}'")))?;
        return Ok(Cached(CachePolicy::Lookup, Json(HanjaListing::Character(record))));
    }

    let pagination = Pagination::new(
        parse_count("page", params.page)?,
        parse_count("limit", params.limit)?,
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let listing = deployment.listing();

    if let Some(query) = params.search.filter(|q| !q.trim().is_empty()) {
        let page = listing.search(&query, pagination).await;
        return Ok(Cached(CachePolicy::Search, Json(HanjaListing::Page(page))));
    }
    if let Some(level) = non_empty(params.level) {
        let grade = parse_grade(&level).ok_or_else(|| ApiError::BadRequest(INVALID_GRADE.to_string()))?;
        let page = listing.grade(grade, pagination).await;
        return Ok(Cached(CachePolicy::Lookup, Json(HanjaListing::Page(page))));
    }

    let overview = listing.overview(pagination).await;
    Ok(Cached(CachePolicy::Lookup, Json(HanjaListing::Overview(overview))))
}

/// GET /api/hanja/strokes?char=<c> | ?character=<c>
///
/// Stroke animation from the local data files only; 404 when there is none.
pub async fn get_stroke_file(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<StrokeFileParams>,
) -> Result<Cached<Json<StrokeAnimation>>, ApiError> {
    let raw = non_empty(params.char_)
        .or_else(|| non_empty(params.character))
        .ok_or_else(|| ApiError::BadRequest("missing 'char' or 'character' parameter".to_string()))?;
    let character = single_char(&raw)
        .or_else(|| percent_decoded_char(&raw))
        .ok_or_else(|| ApiError::BadRequest("'char' must be a single character".to_string()))?;

    let animation = deployment
        .stroke_files()
        .get(character)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no stroke file for '{character}'")))?;

    Ok(Cached(CachePolicy::StrokeData, Json(StrokeAnimation::clone(&animation))))
}

/// GET /api/hanja/data?id=<id or character> | ?grade=<n>
///
/// With only `grade`, lists that grade's characters. Otherwise `id` is
/// required; a character is mapped to its ID first.
pub async fn get_data(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<LookupParams>,
) -> Result<Cached<Json<HanjaData>>, ApiError> {
    let id = non_empty(params.id);
    let grade = non_empty(params.grade);

    if let (Some(grade), None) = (&grade, &id) {
        let grade = parse_grade(grade).ok_or_else(|| ApiError::BadRequest(INVALID_GRADE.to_string()))?;
        let characters = deployment
            .grades()
            .load_grade(grade)
            .await
            .map(|store| store.characters.clone())
            .filter(|characters| !characters.is_empty())
            .ok_or_else(|| ApiError::NotFound(format!("no characters for grade {grade}")))?;
        let body = GradeCharacters {
            grade,
            total: characters.len(),
            characters,
        };
        return Ok(Cached(CachePolicy::Lookup, Json(HanjaData::Grade(body))));
    }

    let raw = id.ok_or_else(|| ApiError::BadRequest("missing 'id' parameter".to_string()))?;
    let normalized = if is_valid_id(&raw) {
        raw.clone()
    } else {
        deployment
            .id_map()
            .normalize(&raw)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no id for '{raw}'")))?
    };
    debug!(input = %raw, id = %normalized, "data lookup");

    let record = resolve_id(&deployment, parse_id(&normalized)?).await?;
    Ok(Cached(CachePolicy::Lookup, Json(HanjaData::Character(record))))
}

/// GET /api/hanja/id?id=<id or character> | ?character=<c>
pub async fn get_id(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<LookupParams>,
) -> Result<Cached<Json<IdLookup>>, ApiError> {
    let id_map = deployment.id_map();

    if let Some(character) = non_empty(params.character) {
        let c = single_char(&character)
            .or_else(|| percent_decoded_char(&character))
            .ok_or_else(|| ApiError::BadRequest("'character' must be a single character".to_string()))?;
        let id = id_map
            .id_from_character(&c.to_string())
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no id for '{c}'")))?;
        return Ok(Cached(
            CachePolicy::Lookup,
            Json(IdLookup {
                id,
                character: c.to_string(),
            }),
        ));
    }

    let raw = non_empty(params.id)
        .ok_or_else(|| ApiError::BadRequest("missing 'id' or 'character' parameter".to_string()))?;
    if Identifier::parse(&raw).is_none() {
        return Err(ApiError::BadRequest(INVALID_ID.to_string()));
    }
    let not_found = || ApiError::NotFound(format!("no character for '{raw}'"));
    let id = id_map.normalize(&raw).await?.ok_or_else(not_found)?;
    let character = id_map.character_from_id(&id).await?.ok_or_else(not_found)?;

    Ok(Cached(CachePolicy::Lookup, Json(IdLookup { id, character })))
}

/// GET /api/hanja/all-ids
pub async fn get_all_ids(State(deployment): State<DeploymentImpl>) -> Cached<Json<AllIds>> {
    let ids: Vec<String> = deployment
        .grades()
        .all_characters()
        .await
        .into_iter()
        .map(|c| c.id)
        .collect();

    Cached(
        CachePolicy::Lookup,
        Json(AllIds {
            success: true,
            count: ids.len(),
            ids,
        }),
    )
}

/// GET /api/hanja/grade?grade=<n>
pub async fn get_grade_store(
    State(deployment): State<DeploymentImpl>,
    Query(params): Query<LookupParams>,
) -> Result<Cached<Json<GradeStore>>, ApiError> {
    let grade = non_empty(params.grade)
        .ok_or_else(|| ApiError::BadRequest("missing 'grade' parameter".to_string()))?;
    let grade = parse_grade(&grade).ok_or_else(|| ApiError::BadRequest(INVALID_GRADE.to_string()))?;

    let store = deployment
        .grades()
        .load_grade(grade)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no data for grade {grade}")))?;

    Ok(Cached(CachePolicy::Lookup, Json(GradeStore::clone(&store))))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/hanja",
        Router::new()
            .route("/", get(list_hanja))
            .route("/strokes", get(get_stroke_file))
            .route("/data", get(get_data))
            .route("/id", get(get_id))
            .route("/all-ids", get(get_all_ids))
            .route("/grade", get(get_grade_store))
            .route("/{id}", get(get_hanja))
            .route("/{id}/related", get(get_related)),
    )
}
