use axum::{
    extract::State,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    handlers::common::QueryParams,
    models::company::{DirectoryEntry, DirectoryFilters, DirectoryQuery, PageInfo, Pagination},
    repositories::DirectoryCriteria,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DirectoryResponse {
    pub items: Vec<DirectoryEntry>,
    pub page_info: PageInfo,
}

/// Approved and active companies, featured first, then newest.
pub async fn list_directory(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<DirectoryQuery>,
) -> Result<Json<DirectoryResponse>, AppError> {
    let pagination = Pagination::new(query.page, state.config.directory_page_size);
    let page = state
        .companies
        .directory(&DirectoryCriteria {
            search: query.search,
            industry: query.industry,
            location: query.location,
            pagination,
        })
        .await?;

    Ok(Json(DirectoryResponse {
        page_info: PageInfo::new(pagination.page, pagination.per_page, page.total),
        items: page.items.into_iter().map(DirectoryEntry::from).collect(),
    }))
}

pub async fn directory_filters(
    State(state): State<AppState>,
) -> Result<Json<DirectoryFilters>, AppError> {
    Ok(Json(state.companies.directory_filters().await?))
}
