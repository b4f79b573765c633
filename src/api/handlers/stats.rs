// src/api/handlers/stats.rs
use actix_web::{web, HttpResponse};
use crate::api::AppState;
use crate::database;
use crate::errors::{Result, ServerError};

/// GET /projectStats - WakaTime totals for every tracked project
pub async fn project_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let config = database::server_config(&state.db_pool)
        .await?
        .ok_or_else(|| ServerError::Config("Could not decode server config".to_string()))?;

    let stats = state
        .stats
        .all_stats(&config.wakatime.access_token)
        .await
        .map_err(|e| {
            log::error!("Fetching project stats failed: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(stats))
}
