// src/api/handlers/mod.rs
mod health;
mod compile;
mod releases;
mod commits;
mod stats;

pub use health::health_check;
pub use compile::compile;
pub use releases::{list_releases, release_count, downloaded_release};
pub use commits::{new_commits, latest_commit};
pub use stats::project_stats;
