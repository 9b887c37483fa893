use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{
    http::header::{HeaderName, HeaderValue, CONTENT_TYPE},
    http::Method,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use mm_common::db::{create_pool_from_url_checked, run_migrations, PgProfileStore};
use mm_common::embed::{create_provider, EmbedConfig, EmbeddingProvider};
use mm_common::gaps::{GapConfig, SkillGapAnalyzer, SkillTaxonomy};
use mm_common::index::{rebuild_from_store, BruteForceIndex, VectorIndex};
use mm_common::logging::{init_tracing_subscriber, install_tracing_panic_hook};
use mm_common::matching::{EngineConfig, MatchEngine};
use mm_common::notify::{NotificationSink, TracingSink};
use mm_common::store::{MemoryProfileStore, ProfileStore};

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{gaps, health, matches, profiles};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "mm-api", about = "HTTP API for the mentor/mentee matching engine")]
struct Cli {
    /// PostgreSQL connection string; omit to run on the in-memory store
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "MM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Embedding provider name
    #[arg(long, env = "MM_EMBED_PROVIDER", default_value = "hash")]
    embed_provider: String,

    /// Optional JSON skill-taxonomy file; the built-in taxonomy otherwise
    #[arg(long, env = "MM_TAXONOMY_PATH")]
    taxonomy_path: Option<String>,

    /// Blended score at or above which a match_found event is emitted
    #[arg(long, env = "MM_NOTIFY_THRESHOLD", default_value_t = 0.75)]
    notify_threshold: f64,

    /// Per-request deadline propagated into the engine
    #[arg(long, env = "MM_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    request_timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub embed_provider: String,
    pub taxonomy_path: Option<String>,
    pub notify_threshold: f64,
    pub request_timeout_ms: u64,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "MM_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        if !(0.0..=1.0).contains(&cli.notify_threshold) {
            return Err(ApiError::BadRequest(
                "MM_NOTIFY_THRESHOLD must be within [0, 1]".into(),
            ));
        }

        if cli.request_timeout_ms == 0 {
            return Err(ApiError::BadRequest(
                "MM_REQUEST_TIMEOUT_MS must be positive".into(),
            ));
        }

        Ok(Self {
            database_url: cli.database_url,
            port: cli.port,
            cors_origins,
            embed_provider: cli.embed_provider,
            taxonomy_path: cli.taxonomy_path,
            notify_threshold: cli.notify_threshold,
            request_timeout_ms: cli.request_timeout_ms,
        })
    }

    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            port: 8080,
            cors_origins: vec!["http://localhost:3000".into()],
            embed_provider: "hash".into(),
            taxonomy_path: None,
            notify_threshold: 0.75,
            request_timeout_ms: 5000,
        }
    }
}

pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub index: Arc<dyn VectorIndex>,
    pub engine: Arc<MatchEngine>,
    pub analyzer: Arc<SkillGapAnalyzer>,
    pub provider: Arc<dyn EmbeddingProvider>,
    pub sink: Arc<dyn NotificationSink>,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let request_id_header = HeaderName::from_static("x-request-id");

    let api_routes = Router::new()
        .route("/profiles", post(profiles::register))
        .route(
            "/profiles/:id",
            get(profiles::get_profile).delete(profiles::delete_profile),
        )
        .route("/profiles/:id/skill-gaps", get(gaps::analyze_gaps))
        .route("/matches/:user_id", get(matches::find_matches));

    Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

fn load_taxonomy(config: &AppConfig) -> Result<SkillTaxonomy, ApiError> {
    match &config.taxonomy_path {
        Some(path) => Ok(SkillTaxonomy::from_json_file(path)?),
        None => Ok(SkillTaxonomy::default()),
    }
}

fn assemble_state(
    store: Arc<dyn ProfileStore>,
    config: AppConfig,
) -> Result<SharedState, ApiError> {
    let provider: Arc<dyn EmbeddingProvider> =
        create_provider(&config.embed_provider, EmbedConfig::from_env()).into();
    let index: Arc<dyn VectorIndex> = Arc::new(BruteForceIndex::new(provider.dimension()));

    let engine = Arc::new(MatchEngine::new(
        store.clone(),
        index.clone(),
        EngineConfig::from_env(),
    )?);
    let analyzer = Arc::new(SkillGapAnalyzer::new(
        store.clone(),
        engine.clone(),
        load_taxonomy(&config)?,
        GapConfig::from_env(),
    ));

    Ok(Arc::new(AppState {
        store,
        index,
        engine,
        analyzer,
        provider,
        sink: Arc::new(TracingSink),
        config,
        readiness: Arc::new(AtomicBool::new(true)),
    }))
}

/// Fresh in-memory state for integration tests.
pub fn test_state() -> SharedState {
    assemble_state(Arc::new(MemoryProfileStore::new()), AppConfig::for_tests())
        .expect("default config is valid")
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber("mm-api");
    install_tracing_panic_hook("mm-api");

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;

    let store: Arc<dyn ProfileStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool_from_url_checked(url)
                .await
                .map_err(|err| ApiError::Internal(format!("failed to create pool: {err}")))?;
            run_migrations(&pool)
                .await
                .map_err(|err| ApiError::Internal(format!("failed to run migrations: {err}")))?;
            Arc::new(PgProfileStore::new(pool))
        }
        None => {
            info!("no DATABASE_URL set; using in-memory profile store");
            Arc::new(MemoryProfileStore::new())
        }
    };

    let state = assemble_state(store, config.clone())?;

    // The index is in-memory regardless of store backend; with a durable
    // store it has to be repopulated on boot.
    if config.database_url.is_some() {
        rebuild_from_store(state.store.as_ref(), state.index.as_ref()).await?;
    }

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, provider = %config.embed_provider, "mm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
