//! Service wiring shared by every entry point.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use db::DBService;
use services::services::{
    glyph_svg::GlyphService,
    grade_loader::GradeLoader,
    grade_summary::GradeSummaryService,
    id_map::IdMap,
    legacy_mapping::{LegacyMapping, MappingError},
    listing::ListingService,
    resolver::CharacterResolver,
    search::SearchService,
    stroke_data::{self, StrokeDataError, StrokeDataService},
    stroke_files::StrokeFileService,
};
use thiserror::Error;

mod local;

pub use local::LocalDeployment;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("stroke data client: {0}")]
    StrokeData(#[from] StrokeDataError),
}

#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    pub stroke_sources: Vec<String>,
    pub stroke_timeout: Duration,
    /// TOML file layered over the built-in grade mapping.
    pub legacy_mapping: Option<PathBuf>,
}

impl DeploymentConfig {
    pub fn new(data_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            public_dir: public_dir.into(),
            stroke_sources: stroke_data::DEFAULT_SOURCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stroke_timeout: stroke_data::DEFAULT_TIMEOUT,
            legacy_mapping: None,
        }
    }

    pub(crate) fn mapping(&self) -> Result<LegacyMapping, MappingError> {
        match &self.legacy_mapping {
            Some(path) => LegacyMapping::from_file(path),
            None => Ok(LegacyMapping::default()),
        }
    }
}

#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new(config: DeploymentConfig) -> Result<Self, DeploymentError>;

    fn version(&self) -> &str;

    fn db(&self) -> &DBService;

    fn id_map(&self) -> &IdMap;

    fn grades(&self) -> &Arc<GradeLoader>;

    fn resolver(&self) -> &CharacterResolver;

    fn grade_summaries(&self) -> &GradeSummaryService;

    fn search(&self) -> &SearchService;

    fn listing(&self) -> &ListingService;

    fn glyphs(&self) -> &GlyphService;

    fn strokes(&self) -> &StrokeDataService;

    fn stroke_files(&self) -> &StrokeFileService;
}
