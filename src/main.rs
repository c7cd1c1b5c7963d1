#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod identity;
mod model;
mod moderation;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
#[cfg(test)]
mod test;
mod trace;
mod visibility;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{
	body::Body,
	extract::Request,
	http::{header, HeaderValue, Method},
	Extension, Router, ServiceExt,
};
use tower::Layer;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	identity::Identity,
	moderation::Engine,
	store::{ContentStore, IdentityStore, MemoryStore, PgStore},
	visibility::Visibility,
};

pub type AppState = State;

/// The shared application state.
///
/// Every component here is a thin handle over the stores; handlers pull out
/// the one they need with `State<Engine>`, `State<Visibility>` and so on.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub moderation: Engine,
	pub visibility: Visibility,
	pub identity: Identity,
	pub hasher: Argon2<'static>,
}

impl State {
	pub fn new(content: Arc<dyn ContentStore>, identity: Arc<dyn IdentityStore>) -> Self {
		Self {
			moderation: Engine::new(content.clone()),
			visibility: Visibility::new(content),
			identity: Identity::new(identity),
			hasher: Argon2::default(),
		}
	}
}

/// Builds the API router along with its `OpenAPI` document.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/auth", route::auth::routes())
		.nest("/posts", route::post::routes())
		.nest("/comments", route::comment::routes())
		.nest("/moderation", route::moderation::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.with_state(state)
}

fn cors(config: &Config) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST])
		.allow_headers([header::CONTENT_TYPE])
		.allow_credentials(true);

	match &config.cors_origin {
		Some(origin) => layer.allow_origin(
			origin
				.parse::<HeaderValue>()
				.expect("CORS_ORIGIN must be a valid origin"),
		),
		None => layer,
	}
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for the shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(config.log_level, config.otlp)
		.expect("failed to initialize tracing");

	let state = if let Some(url) = &config.database_url {
		let store = Arc::new(
			PgStore::connect(url)
				.await
				.expect("failed to connect to database"),
		);

		State::new(store.clone(), store)
	} else {
		tracing::warn!("DATABASE_URL is not set, content is kept in memory and lost on exit");

		let store = Arc::new(MemoryStore::new());

		State::new(store.clone(), store)
	};

	if let Some(admin) = &config.bootstrap_admin {
		route::auth::bootstrap_admin(&state, admin)
			.await
			.expect("failed to create the bootstrap admin");
	}

	let limits = ratelimit::from_config(&config).expect("rate limits must be positive");
	ratelimit::cleanup_old_limits(&limits);

	let app = app(state)
		.layer(GovernorLayer { config: limits })
		.layer(CompressionLayer::new())
		.layer(cors(&config))
		.layer(
			TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
				let request_id = request
					.headers()
					.get("x-request-id")
					.and_then(|id| id.to_str().ok())
					.unwrap_or_default();

				tracing::info_span!(
					"request",
					method = %request.method(),
					uri = %request.uri(),
					request_id = request_id,
				)
			}),
		)
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

	// has to wrap the router, a layer inside it runs after routing
	let app = NormalizePathLayer::trim_trailing_slash().layer(app);

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await
	.expect("server error");
}
