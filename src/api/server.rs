use std::sync::{Arc, RwLock};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::classify::{BraintrustClassifier, Classifier};
use crate::core::AppConfig;
use crate::labels::WorkflowPolicy;
use crate::nylas::NylasClient;
use crate::workflow::{DedupCache, EventProcessor, SystemClock};

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        // API routes
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

/// Wire up the event processor from config. The classifier is optional;
/// without it the service still keeps workflow labels consistent.
fn build_processor(config: &AppConfig) -> Arc<EventProcessor> {
    let provider = Arc::new(NylasClient::new(
        &config.nylas_api_url,
        &config.nylas_api_key,
        &config.nylas_grant_id,
    ));

    let classifier: Option<Arc<dyn Classifier>> = match (
        &config.braintrust_api_key,
        &config.braintrust_project,
        &config.braintrust_slug,
    ) {
        (Some(api_key), Some(project), Some(slug)) => Some(Arc::new(
            BraintrustClassifier::new(&config.braintrust_api_url, api_key, project, slug),
        )),
        _ => None,
    };
    match &classifier {
        Some(_) => tracing::info!("email classification enabled"),
        None => tracing::info!(
            "email classification disabled, set the BRAINTRUST_* env vars to enable"
        ),
    }

    Arc::new(EventProcessor::new(
        provider,
        classifier,
        DedupCache::new(Arc::new(SystemClock)),
        WorkflowPolicy::new(config.workflow_labels.clone()),
        config.category_prefix.clone(),
    ))
}

// Run the server
pub async fn serve(host: String, port: String, config: AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let processor = build_processor(&config);
    let app_state = AppState::new(config, processor);
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .unwrap();

    tracing::debug!(
        "Server started. Listening on {}",
        listener.local_addr().unwrap()
    );

    axum::serve(listener, app).await.unwrap();
}
