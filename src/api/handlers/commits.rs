// src/api/handlers/commits.rs
use actix_web::{web, HttpResponse};
use crate::api::AppState;
use crate::database;
use crate::errors::{Result, ServerError};
use crate::models::{PushedCommits, ResponseStatus};

/// POST /newCommits - store commits pushed by the repository webhook
pub async fn new_commits(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let pushed: PushedCommits = state.gate.decode(&body)?;
    state
        .gate
        .confirm(pushed.confirmation_key.as_deref())
        .map_err(|_| ServerError::NotConfirmed)?;

    if pushed.commits.is_empty() {
        return Err(ServerError::BadRequest("no commits in payload".to_string()));
    }

    let inserted = database::insert_commits(&state.db_pool, &pushed.commits)
        .await
        .map_err(|e| {
            log::error!("Could not add commits to the database: {}", e);
            e
        })?;

    log::info!("Added {} commits", inserted);
    Ok(HttpResponse::Ok().json(ResponseStatus::new("Added commits successfully")))
}

/// GET /latestCommit
pub async fn latest_commit(state: web::Data<AppState>) -> Result<HttpResponse> {
    match database::latest_commit(&state.db_pool).await? {
        Some(commit) => Ok(HttpResponse::Ok().json(commit)),
        None => Err(ServerError::NoCommits),
    }
}
