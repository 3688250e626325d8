use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::dto::report_dto::{ResultDetail, ResultListQuery, ResultListResponse, ResultSummary};
use crate::error::{Error, Result};
use crate::services::export_service::ExportService;
use crate::AppState;

pub async fn list_results(
    State(state): State<AppState>,
    Query(query): Query<ResultListQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let records = state.pad.query_results(query.search(), query.order());
    let items: Vec<ResultSummary> = records.iter().map(ResultSummary::from).collect();
    Ok(Json(ResultListResponse {
        total: items.len(),
        items,
    }))
}

pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state
        .pad
        .result(&id)
        .ok_or_else(|| Error::NotFound(format!("Result {} not found", id)))?;
    let catalog = state.pad.catalog();
    Ok(Json(ResultDetail::build(
        &record,
        catalog.questions_for_title(&record.activity_name),
    )))
}

/// Export the filtered report list as XLSX
pub async fn export_results(
    State(state): State<AppState>,
    Query(query): Query<ResultListQuery>,
) -> Result<impl IntoResponse> {
    query.validate()?;
    let records = state.pad.query_results(query.search(), query.order());
    let catalog = state.pad.catalog();
    let details: Vec<ResultDetail> = records
        .iter()
        .map(|record| ResultDetail::build(record, catalog.questions_for_title(&record.activity_name)))
        .collect();

    let buffer = ExportService::generate_results_xlsx(&details).inspect_err(|e| {
        tracing::error!(error = %e, count = details.len(), "report export failed");
    })?;
    let filename = format!(
        "questionnaire_results_{}.xlsx",
        chrono::Utc::now().format("%Y%m%d_%H%M")
    );
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
