// src/api/routes.rs
use actix_cors::Cors;
use actix_web::web;
use super::handlers;
use crate::config::AppConfig;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health_check)))
        .service(web::resource("/compile").route(web::post().to(handlers::compile)))
        .service(web::resource("/releases").route(web::get().to(handlers::list_releases)))
        .service(web::resource("/releaseCount").route(web::get().to(handlers::release_count)))
        .service(
            web::resource("/downloadedRelease").route(web::post().to(handlers::downloaded_release)),
        )
        .service(web::resource("/newCommits").route(web::post().to(handlers::new_commits)))
        .service(web::resource("/latestCommit").route(web::get().to(handlers::latest_commit)))
        .service(web::resource("/projectStats").route(web::get().to(handlers::project_stats)));
}

/// CORS policy: the configured origin only, or any origin when unset.
pub fn cors(config: &AppConfig) -> Cors {
    let cors = match &config.allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header(),
        None => Cors::permissive(),
    };
    cors.max_age(15)
}
