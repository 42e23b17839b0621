//! Paged character listings over the grade stores.

use std::sync::Arc;

use db::models::{character::CharacterRecord, grade::GradeSummary};
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;
use utils::hanja_id::{MAX_GRADE, MIN_GRADE};

use super::{grade_loader::GradeLoader, search::SearchService};

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    #[error("page must be 1 or greater")]
    Page,
    #[error("limit must be between 1 and {MAX_LIMIT}")]
    Limit,
}

/// 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page == 0 {
            return Err(PaginationError::Page);
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(PaginationError::Limit);
        }
        Ok(Self { page, limit })
    }

    /// The window of `items` this page covers; empty past the last page.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = (self.page - 1).saturating_mul(self.limit);
        items.iter().skip(start).take(self.limit).cloned().collect()
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct CharacterPage {
    pub characters: Vec<CharacterRecord>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub page: usize,
    pub total_pages: usize,
}

impl CharacterPage {
    fn of(items: &[CharacterRecord], level: Option<u8>, pagination: Pagination) -> Self {
        Self {
            characters: pagination.slice(items),
            total: items.len(),
            level,
            page: pagination.page,
            total_pages: pagination.total_pages(items.len()),
        }
    }
}

/// One grade's slice of the overview listing.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct GradeSection {
    pub grade: u8,
    pub name: String,
    pub total: usize,
    pub characters: Vec<CharacterRecord>,
}

/// Every grade with the same page applied to each; `total_pages` counts
/// across all grades.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct GradeOverview {
    pub grades: Vec<GradeSection>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

pub struct ListingService {
    grades: Arc<GradeLoader>,
    search: SearchService,
}

impl ListingService {
    pub fn new(grades: Arc<GradeLoader>) -> Self {
        Self {
            search: SearchService::new(grades.clone()),
            grades,
        }
    }

    /// A grade without a loadable store lists no characters.
    pub async fn grade(&self, grade: u8, pagination: Pagination) -> CharacterPage {
        let characters = match self.grades.load_grade(grade).await {
            Some(store) => store.characters.clone(),
            None => Vec::new(),
        };
        CharacterPage::of(&characters, Some(grade), pagination)
    }

    pub async fn search(&self, query: &str, pagination: Pagination) -> CharacterPage {
        let results = self.search.search(query).await;
        CharacterPage::of(&results, None, pagination)
    }

    /// Grades 15 down to 1, skipping grades without a store.
    pub async fn overview(&self, pagination: Pagination) -> GradeOverview {
        let mut grades = Vec::new();
        let mut total = 0;
        for grade in (MIN_GRADE..=MAX_GRADE).rev() {
            let Some(store) = self.grades.load_grade(grade).await else {
                continue;
            };
            total += store.characters.len();
            grades.push(GradeSection {
                grade,
                name: GradeSummary::default_name(grade),
                total: store.characters.len(),
                characters: pagination.slice(&store.characters),
            });
        }
        GradeOverview {
            grades,
            total,
            page: pagination.page,
            total_pages: pagination.total_pages(total),
        }
    }
}
