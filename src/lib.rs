pub mod catalog;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod openapi;
pub mod settings;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{create_booking, healthz_live, healthz_ready, list_bookings, list_classes, root};
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::{Catalog, CatalogError, parse_timezone};
use crate::error::handle_panic;
use crate::ledger::BookingLedger;
use crate::openapi::ApiDoc;
use crate::settings::Settings;

/// Shared store handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) settings: Settings,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) ledger: Arc<BookingLedger>,
}

impl AppState {
    /// Seeds the default class catalog in the configured studio timezone.
    pub fn new(settings: Settings) -> Result<Self, CatalogError> {
        let reference = parse_timezone(&settings.studio_timezone)?;
        let catalog = Catalog::with_default_classes(reference)?;
        Ok(Self::with_catalog(settings, catalog))
    }

    pub fn with_catalog(settings: Settings, catalog: Catalog) -> Self {
        let catalog = Arc::new(catalog);
        Self {
            settings,
            ledger: Arc::new(BookingLedger::new(Arc::clone(&catalog))),
            catalog,
        }
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let level = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let state = AppState::new(settings)?;
    info!(
        "Seeded {} classes in {}",
        state.catalog.sessions().len(),
        state.catalog.reference_timezone()
    );

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Fitness Studio Booking API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, discarding {} bookings", state.ledger.len());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/classes", get(list_classes))
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/book", post(create_booking))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    with_service_layers(router)
}

/// Request tracing plus the panic catch-all, applied to every route.
fn with_service_layers(router: Router) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    router.layer(
        ServiceBuilder::new()
            .layer(trace_layer)
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}
