use crate::error::{AppError, Result};
use crate::model::{ApiResponse, CreateUrlRequest};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use stubby_core::{Alias, MappingError, Signal};
use tracing::{error, info, warn};
use url::Url;

pub async fn create_url_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse>)> {
    let Json(request) =
        payload.inspect_err(|err| warn!(error = %err, "failed to decode request body"))?;
    validate_url(&request.url)?;

    let alias = match request.alias.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(Alias::new(raw)?),
    };

    let created = state
        .mapper()
        .create_mapping(&state.request_context(), &request.url, alias)
        .await
        .inspect_err(|err| log_failure("failed to save url", err))?;

    info!(id = created.id, alias = %created.alias, "url added");

    let short_url = state.short_url(&created.alias);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(created.alias.into_string(), short_url)),
    ))
}

pub async fn resolve_url_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let alias = Alias::new(alias)?;

    let target = state
        .mapper()
        .resolve_mapping(&state.request_context(), &alias)
        .await
        .inspect_err(|err| log_failure("failed to resolve url", err))?;

    info!(alias = %alias, target = %target, "redirecting");
    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}

pub async fn delete_url_handler(
    Path(alias): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse>> {
    let alias = Alias::new(alias)?;

    let existed = state
        .mapper()
        .delete_mapping(&state.request_context(), &alias)
        .await
        .inspect_err(|err| log_failure("failed to delete url", err))?;

    if !existed {
        return Err(MappingError::AliasNotFound(alias.into_string()).into());
    }

    info!(alias = %alias, "url deleted");
    Ok(Json(ApiResponse::ok()))
}

/// Accepts absolute `http` and `https` URLs with a host.
fn validate_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidUrl("url is required".to_string()));
    }

    let parsed = Url::parse(raw).map_err(|e| AppError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!(
            "scheme must be http or https, got {}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::InvalidUrl("url must have a host".to_string()));
    }

    Ok(())
}

fn log_failure(message: &'static str, err: &MappingError) {
    match err.signal() {
        Signal::Internal => error!(error = %err, "{message}"),
        _ => warn!(error = %err, "{message}"),
    }
}
