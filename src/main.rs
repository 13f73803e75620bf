use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

use leavebot::api::AppService;
use leavebot::config::Config;
use leavebot::db::init_db;
use leavebot::docs::ApiDoc;
use leavebot::lifecycle::LeaveService;
use leavebot::model::holiday::Holidays;
use leavebot::notify::LogNotifier;
use leavebot::policy::PolicyEngine;
use leavebot::policy::calendar::Calendar;
use leavebot::routes;
use leavebot::store::{MemoryStore, MySqlStore, Store};
use leavebot::utils::UserRegistry;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave bot is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let holidays = match config.holidays_file.as_deref() {
        Some(path) => Holidays::load(path)?,
        None => {
            warn!("HOLIDAYS_FILE not set; only weekends are non-working days");
            Holidays::default()
        }
    };
    info!(
        public = holidays.public.len(),
        restricted = holidays.restricted.len(),
        "Holiday calendar loaded"
    );
    let engine = PolicyEngine::new(Calendar::new(&holidays));

    let (store, registry, warmup_pool) = match config.database_url.as_deref() {
        Some(url) => {
            let pool = init_db(url).await?;
            (
                Store::MySql(MySqlStore::new(pool.clone())),
                UserRegistry::cold(),
                Some(pool),
            )
        }
        None => {
            warn!("DATABASE_URL not set; data is kept in memory only");
            (Store::Memory(MemoryStore::new()), UserRegistry::empty(), None)
        }
    };

    let service: Data<AppService> = Data::new(LeaveService::new(
        store,
        LogNotifier,
        engine,
        config.approver_channel.clone(),
        registry,
    ));

    if let Some(pool) = warmup_pool {
        let service = service.clone().into_inner();
        actix_web::rt::spawn(async move {
            if let Err(e) = service.registry().warmup(&pool).await {
                error!(error = %e, "Failed to warm up user registry");
            }
        });
    }

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
