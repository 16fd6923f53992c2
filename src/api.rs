use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::report::{MeterReport, ReportOptions, RunSummary};
use crate::template::DailyTemplate;

const FORM_PAGE: &str = include_str!("../templates/web/form.html");
const RESULT_PAGE: &str = include_str!("../templates/web/result.html");

#[derive(Clone)]
pub struct AppState {
    pub template: Arc<DailyTemplate>,
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

type HttpError = (StatusCode, &'static str);

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new().route("/health", get(health).fallback(method_not_allowed));

    Router::new()
        .route("/", get(form_page).fallback(method_not_allowed))
        .route("/run", post(run_report).fallback(method_not_allowed))
        .nest("/api/v1", api_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

#[instrument]
async fn health() -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

async fn form_page() -> Html<&'static str> {
    Html(FORM_PAGE)
}

// The method router still attaches the `Allow` header to this response
async fn method_not_allowed() -> HttpError {
    status_text(StatusCode::METHOD_NOT_ALLOWED)
}

async fn not_found() -> HttpError {
    status_text(StatusCode::NOT_FOUND)
}

/// Fields of the upload form
#[derive(Debug, Default)]
struct ReportForm {
    file_name: Option<String>,
    data: Option<Bytes>,
    contract: String,
    name: String,
    meter: String,
    coefficient: String,
}

impl ReportForm {
    async fn from_multipart(multipart: &mut Multipart) -> Result<Self, HttpError> {
        let mut form = ReportForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error)?
        {
            let field_name = field.name().unwrap_or_default().to_string();
            if field_name == "filename" {
                form.file_name = field.file_name().map(String::from);
                let data = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                form.data = Some(data);
                continue;
            }

            let text = field.text().await.map_err(multipart_error)?;
            match field_name.as_str() {
                "contract" => form.contract = text,
                "name" => form.name = text,
                "meter" => form.meter = text,
                "coefficient" => form.coefficient = text,
                other => debug!("Ignoring unknown form field '{}'", other),
            }
        }

        Ok(form)
    }
}

#[instrument(skip(state, multipart))]
async fn run_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Html<String>), HttpError> {
    let form = ReportForm::from_multipart(&mut multipart).await?;

    let data = form
        .data
        .ok_or_else(|| http_error(StatusCode::BAD_REQUEST, "missing uploaded file"))?;
    let coefficient: f64 = form.coefficient.trim().parse().map_err(|e| {
        http_error(
            StatusCode::BAD_REQUEST,
            format!("invalid coefficient '{}': {e}", form.coefficient),
        )
    })?;

    info!(
        "Received upload {:?} ({} bytes) for contract {}",
        form.file_name,
        data.len(),
        form.contract
    );

    let options = ReportOptions {
        contract: form.contract,
        company_name: form.name,
        meter: Some(form.meter),
        coefficient,
        output_root: state.output_dir.clone(),
    };
    let template = Arc::clone(&state.template);

    let summary = tokio::task::spawn_blocking(move || run_upload(&data, options, &template))
        .await
        .map_err(|e| http_error(StatusCode::INTERNAL_SERVER_ERROR, e))??;

    Ok((StatusCode::CREATED, Html(result_page(&summary))))
}

/// Stage the upload in a temp file for the duration of the run; the file is
/// removed when it goes out of scope.
fn run_upload(
    data: &[u8],
    options: ReportOptions,
    template: &DailyTemplate,
) -> Result<RunSummary, HttpError> {
    let internal = |e: &dyn Display| http_error(StatusCode::INTERNAL_SERVER_ERROR, e);

    let mut staged = tempfile::Builder::new()
        .prefix("hourly-meter-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| internal(&e))?;
    staged.write_all(data).map_err(|e| internal(&e))?;

    let report = MeterReport::from_file(staged.path(), options).map_err(|e| internal(&e))?;
    report.run(template).map_err(|e| internal(&e))
}

fn result_page(summary: &RunSummary) -> String {
    RESULT_PAGE
        .replace("{{total}}", &format!("{:.2}", summary.total))
        .replace("{{values}}", &summary.values.to_string())
        .replace("{{days}}", &summary.days_written.to_string())
}

/// Oversized uploads report 413, malformed forms 400.
fn multipart_error(err: MultipartError) -> HttpError {
    http_error(err.status(), err)
}

fn http_error(status: StatusCode, err: impl Display) -> HttpError {
    error!("{}", err);
    status_text(status)
}

fn status_text(status: StatusCode) -> HttpError {
    (status, status.canonical_reason().unwrap_or("Error"))
}
