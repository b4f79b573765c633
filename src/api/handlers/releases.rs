// src/api/handlers/releases.rs
use actix_web::{web, HttpResponse};
use crate::api::AppState;
use crate::database;
use crate::errors::{Result, ServerError};
use crate::models::{CountResponse, DownloadedReleaseDetails, ReleasesResponse, ResponseStatus};

/// GET /releases - all releases with their downloadable files
pub async fn list_releases(state: web::Data<AppState>) -> Result<HttpResponse> {
    let releases = database::list_releases(&state.db_pool).await.map_err(|e| {
        log::error!("Unable to find releases: {}", e);
        e
    })?;
    Ok(HttpResponse::Ok().json(ReleasesResponse { releases }))
}

/// GET /releaseCount
pub async fn release_count(state: web::Data<AppState>) -> Result<HttpResponse> {
    let count = database::count_releases(&state.db_pool).await.map_err(|e| {
        log::error!("Could not retrieve number of releases: {}", e);
        e
    })?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

/// POST /downloadedRelease - bump the download count of one release file
pub async fn downloaded_release(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let details: DownloadedReleaseDetails = state.gate.decode(&body)?;
    state
        .gate
        .confirm(details.confirmation_key.as_deref())
        .map_err(|_| ServerError::NotConfirmed)?;

    database::record_download(&state.db_pool, &details.release_id, &details.platform_id).await?;

    log::info!(
        "Recorded download of {} for release {}",
        details.platform_id,
        details.release_id
    );
    Ok(HttpResponse::Ok().json(ResponseStatus::new(
        "Updated release file download count successfully",
    )))
}
