use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, DataLayout};
use services::services::{
    glyph_svg::GlyphService, grade_loader::GradeLoader, grade_summary::GradeSummaryService,
    id_map::IdMap, legacy_store::LegacyStore, listing::ListingService,
    resolver::{CharacterResolver, ResolveContext}, search::SearchService,
    stroke_data::StrokeDataService, stroke_files::StrokeFileService,
};
use tracing::info;

use crate::{Deployment, DeploymentConfig, DeploymentError};

/// Every service reads the same data directory; clones share all state.
#[derive(Clone)]
pub struct LocalDeployment {
    inner: Arc<Inner>,
}

struct Inner {
    db: DBService,
    id_map: IdMap,
    grades: Arc<GradeLoader>,
    resolver: CharacterResolver,
    grade_summaries: GradeSummaryService,
    search: SearchService,
    listing: ListingService,
    glyphs: GlyphService,
    strokes: StrokeDataService,
    stroke_files: StrokeFileService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new(config: DeploymentConfig) -> Result<Self, DeploymentError> {
        let mapping = Arc::new(config.mapping()?);
        let layout = DataLayout::new(&config.data_dir, &config.public_dir);
        let db = DBService::new(layout.clone());
        let grades = Arc::new(GradeLoader::new(db.clone()));
        let legacy = Arc::new(LegacyStore::new(db.clone()));

        let resolver = CharacterResolver::new(ResolveContext {
            db: db.clone(),
            grades: grades.clone(),
            legacy: legacy.clone(),
            mapping: mapping.clone(),
        });
        let grade_summaries =
            GradeSummaryService::new(db.clone(), grades.clone(), legacy, mapping);
        let strokes = StrokeDataService::new(config.stroke_sources.clone(), config.stroke_timeout)?;

        info!(
            data_dir = %config.data_dir.display(),
            public_dir = %config.public_dir.display(),
            "deployment ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                id_map: IdMap::new(db.clone()),
                search: SearchService::new(grades.clone()),
                listing: ListingService::new(grades.clone()),
                stroke_files: StrokeFileService::new(db.clone()),
                glyphs: GlyphService::new(layout),
                db,
                grades,
                resolver,
                grade_summaries,
                strokes,
            }),
        })
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn db(&self) -> &DBService {
        &self.inner.db
    }

    fn id_map(&self) -> &IdMap {
        &self.inner.id_map
    }

    fn grades(&self) -> &Arc<GradeLoader> {
        &self.inner.grades
    }

    fn resolver(&self) -> &CharacterResolver {
        &self.inner.resolver
    }

    fn grade_summaries(&self) -> &GradeSummaryService {
        &self.inner.grade_summaries
    }

    fn search(&self) -> &SearchService {
        &self.inner.search
    }

    fn listing(&self) -> &ListingService {
        &self.inner.listing
    }

    fn glyphs(&self) -> &GlyphService {
        &self.inner.glyphs
    }

    fn strokes(&self) -> &StrokeDataService {
        &self.inner.strokes
    }

    fn stroke_files(&self) -> &StrokeFileService {
        &self.inner.stroke_files
    }
}
