use actix_web::{middleware, web, App, HttpServer};
use qat_server::api::{configure_routes, cors, AppState};
use qat_server::config::AppConfig;
use qat_server::{banner, database, token_refresh};
use std::io;
use std::path::{Path, PathBuf};

/// Usage: `qat-server [root_dir] [compiler_dir]`
#[actix_web::main]
async fn main() -> io::Result<()> {
    banner::print_banner();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let root_dir = args.first().map(PathBuf::from);
    let compiler_dir = args.get(1).map(PathBuf::from);

    let env_file = root_dir
        .as_deref()
        .map(|root| root.join(".env"))
        .unwrap_or_else(|| PathBuf::from(".env"));
    let env_loaded = dotenvy::from_path(&env_file);

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Err(e) = env_loaded {
        log::warn!("Could not load {}: {}", env_file.display(), e);
    }

    let config = match std::env::var("SERVER_CONFIG_FILE") {
        Ok(path) => AppConfig::from_toml_file(Path::new(&path)),
        Err(_) => AppConfig::from_env(),
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?
    .with_args(root_dir.as_deref(), compiler_dir.as_deref());

    let pool = database::init_db(&config.database_url)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;

    let state = AppState::new(config.clone(), pool.clone());

    let cwd = std::env::current_dir()?;
    let mut protected = vec![cwd.as_path()];
    protected.extend(root_dir.as_deref());
    protected.extend(config.compiler_dir.as_deref());
    state
        .compiler
        .workspaces()
        .purge_base(&protected)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;
    log::info!("Compile workspaces under {}", config.compile_dir.display());

    actix_rt::spawn(token_refresh::run(
        pool,
        state.client.clone(),
        config.token_refresh_interval(),
        config.wakatime_redirect_uri.clone(),
    ));

    log::info!("Starting server on {}:{}", config.host, config.port);

    let bind = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors(&config))
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}
