// src/token_refresh.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::database;
use crate::errors::{Result, ServerError};
use crate::models::WakatimeConfig;

/// Tokens are refreshed once they expire within this window.
const REFRESH_WINDOW_HOURS: i64 = 24;

/// Fields returned by the OAuth token endpoint. Missing fields keep their
/// stored value.
#[derive(Debug, Default, PartialEq)]
pub struct TokenUpdate {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<String>,
}

/// True when `expires_at` is unparseable or falls within the refresh window.
pub fn needs_refresh(expires_at: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(expires_at.trim()) {
        Ok(expiry) => expiry.with_timezone(&Utc) - now < ChronoDuration::hours(REFRESH_WINDOW_HOURS),
        Err(_) => true,
    }
}

/// Parse a token endpoint response, either url-encoded or JSON.
pub fn parse_token_response(body: &str) -> Result<TokenUpdate> {
    let body = body.trim();
    let mut update = TokenUpdate::default();

    if body.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(body)?;
        let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);
        update.access_token = field("access_token");
        update.refresh_token = field("refresh_token");
        update.expires_at = field("expires_at");
    } else {
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "access_token" => update.access_token = Some(value.into_owned()),
                "refresh_token" => update.refresh_token = Some(value.into_owned()),
                "expires_at" => update.expires_at = Some(value.into_owned()),
                _ => {}
            }
        }
    }

    if update.access_token.is_none() {
        return Err(ServerError::UnexpectedResponse(
            "token response has no access_token".to_string(),
        ));
    }
    Ok(update)
}

/// Refresh the WakaTime token if it is close to expiry.
/// Returns whether a refresh happened.
pub async fn refresh_once(pool: &SqlitePool, client: &Client, redirect_uri: &str) -> Result<bool> {
    let config = database::server_config(pool)
        .await?
        .ok_or_else(|| ServerError::Config("server config record is missing".to_string()))?;
    let wakatime = config.wakatime;

    if !needs_refresh(&wakatime.expires_at, Utc::now()) {
        log::debug!("WakaTime token valid until {}", wakatime.expires_at);
        return Ok(false);
    }

    log::info!("Refreshing WakaTime access token");
    let update = request_new_token(client, &wakatime, redirect_uri).await?;

    database::update_wakatime_tokens(
        pool,
        update.access_token.as_deref().unwrap_or(&wakatime.access_token),
        update.refresh_token.as_deref().unwrap_or(&wakatime.refresh_token),
        update.expires_at.as_deref().unwrap_or(&wakatime.expires_at),
    )
    .await?;

    log::info!("WakaTime access token refreshed");
    Ok(true)
}

async fn request_new_token(
    client: &Client,
    wakatime: &WakatimeConfig,
    redirect_uri: &str,
) -> Result<TokenUpdate> {
    let form = [
        ("client_id", wakatime.client_id.as_str()),
        ("client_secret", wakatime.client_secret.as_str()),
        ("redirect_uri", redirect_uri),
        ("refresh_token", wakatime.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let resp = client.post(&wakatime.refresh_url).form(&form).send().await?;
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(ServerError::ApiError { status: status.as_u16(), body });
    }

    parse_token_response(&body)
}

/// Background loop. Failures are logged and the loop carries on.
pub async fn run(pool: SqlitePool, client: Client, interval: Duration, redirect_uri: String) {
    log::info!("Token refresh task started, interval {:?}", interval);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

    loop {
        ticker.tick().await;
        if let Err(e) = refresh_once(&pool, &client, &redirect_uri).await {
            log::error!("WakaTime token refresh failed: {}", e);
        }
    }
}
