// src/api/handlers/compile.rs
use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use crate::api::AppState;
use crate::errors::Result;

/// POST /compile - compile the posted source and return the compiler's result
/// file verbatim once it has been validated
pub async fn compile(state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse> {
    let harvested = state.compiler.handle(&body).await?;
    Ok(HttpResponse::Ok().content_type(ContentType::json()).body(harvested.raw))
}
