//! Shared helpers for the HTTP tests.

use std::sync::Arc;

pub use axum::http::{header, HeaderValue, StatusCode};
pub use axum_test::{TestResponse, TestServer};
pub use serde_json::{json, Value};
use uuid::Uuid;

pub use crate::{
	identity::Principal,
	model::{ItemKind, PrincipalKind, Status},
};
use crate::{
	app, session,
	store::{IdentityStore, MemoryStore, NewAccount},
	State,
};

/// The full router over a fresh in-memory store.
pub struct TestApp {
	pub server: TestServer,
	pub state: State,
	store: Arc<MemoryStore>,
}

impl TestApp {
	pub fn new() -> Self {
		let store = Arc::new(MemoryStore::new());
		let state = State::new(store.clone(), store.clone());
		let server = TestServer::new(app(state.clone())).unwrap();

		Self {
			server,
			state,
			store,
		}
	}

	/// Creates an account that cannot log in with a password.
	pub async fn principal(&self, kind: PrincipalKind, name: &str) -> Principal {
		self.store
			.insert_account(NewAccount {
				kind,
				name: name.into(),
				email: format!("{}@college.edu", name.to_lowercase()),
				password: Vec::new(),
				salt: Uuid::new_v4(),
			})
			.await
			.unwrap()
			.principal()
	}

	/// A `Cookie` header value holding a new session for `principal`.
	pub async fn cookie(&self, principal: &Principal) -> HeaderValue {
		let id = self.store.create_session(principal.id).await.unwrap();

		HeaderValue::from_str(&format!("{}={id}", session::COOKIE_NAME)).unwrap()
	}

	pub async fn login_as(&self, kind: PrincipalKind, name: &str) -> (Principal, HeaderValue) {
		let principal = self.principal(kind, name).await;
		let cookie = self.cookie(&principal).await;

		(principal, cookie)
	}
}

/// Asserts a `success: true` envelope and returns the body.
pub fn success(response: &TestResponse) -> Value {
	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<Value>();

	assert_eq!(body["success"], true, "{body}");
	body
}

/// Asserts an in-band failure and returns its message.
pub fn failure(response: &TestResponse) -> String {
	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<Value>();

	assert_eq!(body["success"], false, "{body}");
	body["message"].as_str().unwrap_or_default().to_owned()
}
