//! User report endpoints
//!
//! Submission is open to anonymous callers. Each new report goes through a
//! best-effort AI triage pass whose result is attached to the stored row;
//! triage failure is logged and never surfaces to the submitter.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Auth, OptionalAuth};
use crate::meta_adapter::{
	CreateReport, ListReportOptions, Report, ReportOverview, ReportTimelineEntry,
};
use crate::prelude::*;
use crate::types::{Paginated, ReportStatus, ReportType};

/// # POST /api/v1/reports
pub async fn post_report(
	State(app): State<App>,
	OptionalAuth(auth): OptionalAuth,
	Json(data): Json<CreateReport>,
) -> ApiResult<(StatusCode, Json<Report>)> {
	if data.title.trim().is_empty() || data.description.trim().is_empty() {
		return Err(Error::validation("Title, description, and report type are required"));
	}

	let user_id = auth.as_ref().map(|a| a.user_id);
	let report = app.meta_adapter.create_report(user_id, &data).await?;

	// Triage is best-effort: the report is already stored, a gateway outage
	// must not turn a successful submission into a 500.
	let summary = format!("{}: {}", data.title, data.description);
	let exploit_id = data.exploit_id.map(|id| id.to_string());
	match app.ai_adapter.validate_report(&summary, exploit_id.as_deref()).await {
		Ok(validation) => {
			if let Err(err) = app.meta_adapter.set_report_analysis(report.id, &validation.analysis).await {
				error!(report_id = %report.id, "Failed to store AI analysis: {}", err);
			}
			info!(
				report_id = %report.id,
				report_type = data.report_type.as_str(),
				ai_valid = validation.is_valid,
				ai_confidence = validation.confidence,
				"User report created and analyzed"
			);
		}
		Err(err) => {
			error!(report_id = %report.id, "AI analysis failed for user report: {}", err);
		}
	}

	Ok((StatusCode::CREATED, Json(report)))
}

/// # GET /api/v1/reports
#[derive(Deserialize)]
pub struct ListReportsQuery {
	#[serde(default = "crate::types::default_page")]
	page: i64,
	#[serde(default = "crate::types::default_limit")]
	limit: i64,
	status: Option<ReportStatus>,
	report_type: Option<ReportType>,
	user_id: Option<Uuid>,
}

pub async fn get_reports(
	State(app): State<App>,
	Query(query): Query<ListReportsQuery>,
) -> ApiResult<Json<Paginated<Report>>> {
	let opts = ListReportOptions {
		page: query.page,
		limit: query.limit,
		status: query.status,
		report_type: query.report_type,
		user_id: query.user_id,
	};
	let reports = app.meta_adapter.list_reports(&opts).await?;
	Ok(Json(reports))
}

/// # GET /api/v1/reports/{id}
pub async fn get_report(State(app): State<App>, Path(id): Path<Uuid>) -> ApiResult<Json<Report>> {
	let report = app.meta_adapter.read_report(id).await?;
	Ok(Json(report))
}

/// # PATCH /api/v1/reports/{id}/status
#[derive(Deserialize)]
pub struct UpdateStatusReq {
	status: ReportStatus,
	admin_notes: Option<Box<str>>,
}

pub async fn patch_status(
	State(app): State<App>,
	Auth(auth): Auth,
	Path(id): Path<Uuid>,
	Json(req): Json<UpdateStatusReq>,
) -> ApiResult<Json<Report>> {
	let report = app
		.meta_adapter
		.update_report_status(id, req.status, req.admin_notes.as_deref())
		.await?;

	info!(report_id = %id, new_status = req.status.as_str(), updated_by = %auth.user_id, "Report status updated");

	Ok(Json(report))
}

/// # GET /api/v1/reports/stats/overview
#[derive(Serialize)]
pub struct ReportStatsRes {
	overview: ReportOverview,
	timeline: Vec<ReportTimelineEntry>,
}

pub async fn get_stats(State(app): State<App>) -> ApiResult<Json<ReportStatsRes>> {
	let (overview, timeline) = app.meta_adapter.report_stats().await?;
	Ok(Json(ReportStatsRes { overview, timeline }))
}

// vim: ts=4
