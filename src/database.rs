// src/database.rs
use crate::errors::{Result, ServerError};
use crate::models::{
    CommitAuthor, LanguageRelease, NewCommit, ReleaseFile, ReleaseVersion, ServerConfig,
    WakatimeConfig,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Open (creating if needed) the SQLite database at `database_url` and run
/// the embedded migrations.
pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    if let Some(path) = db_file_path(database_url) {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
            log::info!("Database directory: {}", parent.display());
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    log::info!("Database connected: {}", database_url);
    migrate(&pool).await?;
    Ok(pool)
}

/// A private in-memory database, used by tests and local experiments.
pub async fn init_memory_db() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ServerError::Database(e.into()))?;
    log::info!("Database migrations completed");
    Ok(())
}

fn db_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

// ---- releases ----

pub async fn insert_release(pool: &SqlitePool, release: &LanguageRelease) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO releases (release_id, version_value, is_prerelease, prerelease, title, content, idx, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&release.release_id)
    .bind(&release.version.value)
    .bind(release.version.is_prerelease)
    .bind(&release.version.prerelease)
    .bind(&release.title)
    .bind(&release.content)
    .bind(release.index)
    .bind(&release.created_at)
    .execute(&mut *tx)
    .await?;

    for (position, file) in release.files.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO release_files (release_id, file_id, platform, target, downloads, path, position)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&release.release_id)
        .bind(&file.id)
        .bind(&file.platform)
        .bind(&file.target)
        .bind(file.downloads)
        .bind(&file.path)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn list_releases(pool: &SqlitePool) -> Result<Vec<LanguageRelease>> {
    let file_rows = sqlx::query(
        r#"
        SELECT release_id, file_id, platform, target, downloads, path
        FROM release_files
        ORDER BY release_id, position
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut files: HashMap<String, Vec<ReleaseFile>> = HashMap::new();
    for row in file_rows {
        let release_id: String = row.try_get("release_id")?;
        files.entry(release_id).or_default().push(ReleaseFile {
            id: row.try_get("file_id")?,
            platform: row.try_get("platform")?,
            target: row.try_get("target")?,
            downloads: row.try_get("downloads")?,
            path: row.try_get("path")?,
        });
    }

    let rows = sqlx::query(
        r#"
        SELECT release_id, version_value, is_prerelease, prerelease, title, content, idx, created_at
        FROM releases
        ORDER BY idx
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut releases = Vec::with_capacity(rows.len());
    for row in rows {
        let release_id: String = row.try_get("release_id")?;
        releases.push(LanguageRelease {
            files: files.remove(&release_id).unwrap_or_default(),
            release_id,
            version: ReleaseVersion {
                value: row.try_get("version_value")?,
                is_prerelease: row.try_get("is_prerelease")?,
                prerelease: row.try_get("prerelease")?,
            },
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            index: row.try_get("idx")?,
            created_at: row.try_get("created_at")?,
        });
    }

    Ok(releases)
}

pub async fn count_releases(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM releases")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Increment the download counter of one file of a release.
pub async fn record_download(pool: &SqlitePool, release_id: &str, platform_id: &str) -> Result<()> {
    let release = sqlx::query("SELECT 1 FROM releases WHERE release_id = ?")
        .bind(release_id)
        .fetch_optional(pool)
        .await?;
    if release.is_none() {
        return Err(ServerError::ReleaseNotFound);
    }

    let updated = sqlx::query(
        "UPDATE release_files SET downloads = downloads + 1 WHERE release_id = ? AND file_id = ?",
    )
    .bind(release_id)
    .bind(platform_id)
    .execute(pool)
    .await?;

    match updated.rows_affected() {
        0 => Err(ServerError::PlatformNotFound),
        1 => Ok(()),
        n => Err(ServerError::Database(sqlx::Error::Protocol(format!(
            "download update touched {} rows",
            n
        )))),
    }
}

// ---- commits ----

pub async fn insert_commits(pool: &SqlitePool, commits: &[NewCommit]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for commit in commits {
        inserted += sqlx::query(
            r#"
            INSERT INTO commits (id, title, message, author_name, author_email, repository, site, timestamp, git_ref)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&commit.id)
        .bind(&commit.title)
        .bind(&commit.message)
        .bind(&commit.author.name)
        .bind(&commit.author.email)
        .bind(&commit.repository)
        .bind(&commit.site)
        .bind(&commit.timestamp)
        .bind(&commit.git_ref)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// The most recently inserted commit.
pub async fn latest_commit(pool: &SqlitePool) -> Result<Option<NewCommit>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, message, author_name, author_email, repository, site, timestamp, git_ref
        FROM commits
        ORDER BY seq DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(NewCommit {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        author: CommitAuthor {
            name: row.try_get("author_name")?,
            email: row.try_get("author_email")?,
        },
        repository: row.try_get("repository")?,
        site: row.try_get("site")?,
        timestamp: row.try_get("timestamp")?,
        git_ref: row.try_get("git_ref")?,
    }))
}

// ---- server config ----

pub async fn server_config(pool: &SqlitePool) -> Result<Option<ServerConfig>> {
    let row = sqlx::query(
        r#"
        SELECT wakatime_access_token, wakatime_refresh_token, wakatime_expires_at,
               wakatime_client_secret, wakatime_client_id, wakatime_refresh_url
        FROM server_config
        WHERE id = 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(ServerConfig {
        wakatime: WakatimeConfig {
            access_token: row.try_get("wakatime_access_token")?,
            refresh_token: row.try_get("wakatime_refresh_token")?,
            expires_at: row.try_get("wakatime_expires_at")?,
            client_secret: row.try_get("wakatime_client_secret")?,
            client_id: row.try_get("wakatime_client_id")?,
            refresh_url: row.try_get("wakatime_refresh_url")?,
        },
    }))
}

/// Insert or replace the single server-config record.
pub async fn save_server_config(pool: &SqlitePool, config: &ServerConfig) -> Result<()> {
    let w = &config.wakatime;
    sqlx::query(
        r#"
        INSERT INTO server_config (id, wakatime_access_token, wakatime_refresh_token, wakatime_expires_at,
                                   wakatime_client_secret, wakatime_client_id, wakatime_refresh_url)
        VALUES (1, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            wakatime_access_token = excluded.wakatime_access_token,
            wakatime_refresh_token = excluded.wakatime_refresh_token,
            wakatime_expires_at = excluded.wakatime_expires_at,
            wakatime_client_secret = excluded.wakatime_client_secret,
            wakatime_client_id = excluded.wakatime_client_id,
            wakatime_refresh_url = excluded.wakatime_refresh_url
        "#,
    )
    .bind(&w.access_token)
    .bind(&w.refresh_token)
    .bind(&w.expires_at)
    .bind(&w.client_secret)
    .bind(&w.client_id)
    .bind(&w.refresh_url)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_wakatime_tokens(
    pool: &SqlitePool,
    access_token: &str,
    refresh_token: &str,
    expires_at: &str,
) -> Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE server_config
        SET wakatime_access_token = ?, wakatime_refresh_token = ?, wakatime_expires_at = ?
        WHERE id = 1
        "#,
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    if updated.rows_affected() != 1 {
        return Err(ServerError::Database(sqlx::Error::RowNotFound));
    }
    Ok(())
}
