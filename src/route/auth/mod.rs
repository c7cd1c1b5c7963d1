use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use argon2::Argon2;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	config::BootstrapAdmin,
	error,
	identity::Identity,
	model::PrincipalKind,
	store::{Account, NewAccount},
	AppState,
};

pub mod model;
pub mod route;

pub const KEY_LENGTH: usize = 32;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid email or password")]
	InvalidCredentials,
	#[error("password hashing failed: {0}")]
	Argon(#[from] argon2::Error),
	#[error("Please log in to continue")]
	NoSession,
	#[error("Your session has expired, please log in again")]
	InvalidSession,
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::OK,
		}
	}

	fn message(&self) -> String {
		match self {
			Self::Argon(..) => "Internal server error".into(),
			_ => self.to_string(),
		}
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.api_route("/session", get_with(get_session, get_session_docs))
}

/// Hashes a password with Argon2, salted with the account's salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	salt: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), salt.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Creates an account with a fresh salt.
pub async fn create_account(
	identity: &Identity,
	hasher: &Argon2<'_>,
	kind: PrincipalKind,
	name: &str,
	email: &str,
	password: &str,
) -> Result<Account, RouteError> {
	let salt = Uuid::new_v4();
	let password = hash_password(hasher, password, &salt).map_err(Error::Argon)?;

	Ok(identity
		.store()
		.insert_account(NewAccount {
			kind,
			name: name.trim().to_owned(),
			email: normalize_email(email),
			password: password.to_vec(),
			salt,
		})
		.await?)
}

/// Makes sure the configured admin account exists. An existing account is
/// left as it is, password included.
pub async fn bootstrap_admin(state: &AppState, admin: &BootstrapAdmin) -> Result<(), RouteError> {
	let email = normalize_email(&admin.email);

	if state
		.identity
		.store()
		.account(PrincipalKind::Admin, &email)
		.await?
		.is_some()
	{
		tracing::debug!(email = %email, "bootstrap admin already exists");

		return Ok(());
	}

	let account = create_account(
		&state.identity,
		&state.hasher,
		PrincipalKind::Admin,
		&admin.name,
		&email,
		&admin.password,
	)
	.await?;

	tracing::info!(account.id = account.id, email = %email, "created bootstrap admin");

	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test::*;

	const PASSWORD: &str = "correct horse battery";

	async fn account(app: &TestApp, kind: PrincipalKind, email: &str) -> Account {
		create_account(
			&app.state.identity,
			&app.state.hasher,
			kind,
			"Ada",
			email,
			PASSWORD,
		)
		.await
		.unwrap()
	}

	async fn login(app: &TestApp, kind: &str, email: &str, password: &str) -> TestResponse {
		app.server
			.post("/auth/login")
			.json(&json!({
				"kind": kind,
				"email": email,
				"password": password,
			}))
			.await
	}

	/// The `name=value` part of the response's session cookie.
	fn session_cookie(response: &TestResponse) -> HeaderValue {
		let set_cookie = response.header(header::SET_COOKIE);
		let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();

		HeaderValue::from_str(pair).unwrap()
	}

	#[tokio::test]
	async fn test_login_flow() {
		let app = TestApp::new();
		account(&app, PrincipalKind::Student, "ada@college.edu").await;

		let response = login(&app, "student", "Ada@College.edu", PASSWORD).await;
		let body = success(&response);

		assert_eq!(body["message"], "Login successful");
		assert_eq!(body["principal"]["display_name"], "Ada");

		let cookie = session_cookie(&response);

		let me = app
			.server
			.get("/auth/me")
			.add_header(header::COOKIE, cookie.clone())
			.await;

		assert_eq!(success(&me)["principal"]["kind"], "student");

		let logout = app
			.server
			.get("/auth/logout")
			.add_header(header::COOKIE, cookie.clone())
			.await;

		assert_eq!(success(&logout)["message"], "Logged out successfully");
		assert!(logout
			.header(header::SET_COOKIE)
			.to_str()
			.unwrap()
			.contains("Max-Age=0"));

		let me = app
			.server
			.get("/auth/me")
			.add_header(header::COOKIE, cookie)
			.await;

		assert_eq!(
			failure(&me),
			"Your session has expired, please log in again"
		);
	}

	#[tokio::test]
	async fn test_wrong_credentials_are_reported_in_band() {
		let app = TestApp::new();
		account(&app, PrincipalKind::Student, "ada@college.edu").await;

		let wrong_password = login(&app, "student", "ada@college.edu", "not the password").await;
		let wrong_kind = login(&app, "admin", "ada@college.edu", PASSWORD).await;
		let unknown = login(&app, "student", "bob@college.edu", PASSWORD).await;

		for response in [wrong_password, wrong_kind, unknown] {
			assert_eq!(failure(&response), "Invalid email or password");
		}
	}

	#[tokio::test]
	async fn test_malformed_login_lists_field_errors() {
		let app = TestApp::new();

		let response = login(&app, "student", "not an email", "short").await;

		assert_eq!(failure(&response), "Invalid input");
		assert_eq!(
			response.json::<Value>()["errors"]
				.as_array()
				.unwrap()
				.len(),
			2
		);
	}

	#[tokio::test]
	async fn test_session_check_never_fails() {
		let app = TestApp::new();

		let anonymous = app.server.get("/auth/session").await;
		let body = success(&anonymous);

		assert_eq!(body["logged_in"], false);
		assert!(body.get("principal").is_none());

		let admin = app.principal(PrincipalKind::Admin, "Grace").await;
		let known = app
			.server
			.get("/auth/session")
			.add_header(header::COOKIE, app.cookie(&admin).await)
			.await;

		assert_eq!(success(&known)["logged_in"], true);

		let garbage = app
			.server
			.get("/auth/session")
			.add_header(header::COOKIE, HeaderValue::from_static("session=nonsense"))
			.await;

		assert_eq!(success(&garbage)["logged_in"], false);
	}

	#[tokio::test]
	async fn test_me_requires_a_session() {
		let app = TestApp::new();

		assert_eq!(
			failure(&app.server.get("/auth/me").await),
			"Please log in to continue"
		);
	}

	#[tokio::test]
	async fn test_bootstrap_admin_is_idempotent() {
		let app = TestApp::new();
		let admin = BootstrapAdmin {
			email: "Dean@College.edu".into(),
			password: PASSWORD.into(),
			name: "Dean".into(),
		};

		bootstrap_admin(&app.state, &admin).await.unwrap();
		bootstrap_admin(&app.state, &admin).await.unwrap();

		let response = login(&app, "admin", "dean@college.edu", PASSWORD).await;

		assert_eq!(success(&response)["principal"]["kind"], "admin");
	}
}
