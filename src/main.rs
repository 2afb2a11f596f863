use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use gradly_engine::config::Settings;
use gradly_engine::core::TieredSelector;
use gradly_engine::routes::{self, AppState};
use gradly_engine::services::{
    self, CacheManager, ConversationService, CreditService, MatchService, PostgresClient,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(
    err: error::JsonPayloadError,
    req: &actix_web::HttpRequest,
) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(
    err: error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Gradly engine...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize cache manager (optional, the engine works without it)
    let cache = match &settings.cache.redis_url {
        Some(redis_url) => {
            let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
            let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(10_000);

            match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
                Ok(c) => {
                    info!(
                        "Cache manager initialized (L1: {} entries, TTL: {}s)",
                        l1_cache_size, cache_ttl
                    );
                    Some(Arc::new(c))
                }
                Err(e) => {
                    warn!("Failed to connect to Redis ({}), running without cache", e);
                    None
                }
            }
        }
        None => {
            info!("No Redis URL configured, running without cache");
            None
        }
    };

    // Initialize PostgreSQL client
    let postgres = Arc::new(
        PostgresClient::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
        )
        .await
        .unwrap_or_else(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            panic!("PostgreSQL connection error: {}", e);
        }),
    );

    info!("PostgreSQL client initialized");

    // Wire services; PostgresClient implements all the store traits
    let profiles: Arc<dyn services::ProfileStore> = postgres.clone();
    let matches: Arc<dyn services::MatchStore> = postgres.clone();
    let conversations: Arc<dyn services::ConversationStore> = postgres.clone();
    let credit_store: Arc<dyn services::CreditStore> = postgres.clone();

    let credits = Arc::new(CreditService::new(profiles.clone(), credit_store));

    let selector = TieredSelector::new(settings.matching.global_tier_cap);

    let matching = Arc::new(MatchService::new(
        profiles.clone(),
        matches.clone(),
        credits.clone(),
        selector,
        cache.clone(),
    ));

    let conversation_service = Arc::new(ConversationService::new(
        profiles,
        matches,
        conversations,
        credits,
        cache,
        settings.chat.welcome_message.clone(),
    ));

    info!(
        "Matching services initialized (global tier cap: {})",
        settings.matching.global_tier_cap
    );

    // Build application state
    let app_state = AppState {
        postgres,
        matching,
        conversations: conversation_service,
        cron_secret: settings.internal.cron_secret.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
