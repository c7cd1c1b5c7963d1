use aide::axum::{routing::get_with, ApiRouter};

use crate::{error, moderation, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<moderation::Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/me", get_with(get_own_feed, get_own_feed_docs))
		.api_route("/:id", get_with(get_post, get_post_docs))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_student_post_waits_for_review() {
		let app = TestApp::new();
		let (_, student) = app.login_as(PrincipalKind::Student, "Ada").await;
		let (_, admin) = app.login_as(PrincipalKind::Admin, "Grace").await;

		let response = app
			.server
			.post("/posts")
			.add_header(header::COOKIE, student.clone())
			.json(&json!({ "title": "Hello", "content": "World" }))
			.await;
		let created = success(&response);

		assert_eq!(created["message"], "Post submitted for review");

		let id = created["id"].as_i64().unwrap();
		let public = success(&app.server.get("/posts").await);

		assert_eq!(public["posts"], json!([]));

		let own = success(
			&app.server
				.get("/posts/me")
				.add_header(header::COOKIE, student.clone())
				.await,
		);

		assert_eq!(own["posts"][0]["id"], id);
		assert_eq!(own["posts"][0]["status"], "pending");

		let approve = app
			.server
			.post("/moderation/approve")
			.add_header(header::COOKIE, admin.clone())
			.json(&json!({ "id": id, "type": "post" }))
			.await;

		assert_eq!(success(&approve)["message"], "Post approved");

		let public = success(&app.server.get("/posts").await);

		assert_eq!(public["posts"][0]["id"], id);
		assert_eq!(public["posts"][0]["author_name"], "Ada");

		let again = app
			.server
			.post("/moderation/approve")
			.add_header(header::COOKIE, admin)
			.json(&json!({ "id": id, "type": "post" }))
			.await;

		assert_eq!(
			failure(&again),
			"Post is already approved, refresh and try again"
		);
		assert_eq!(success(&app.server.get("/posts").await)["posts"][0]["status"], "approved");
	}

	#[tokio::test]
	async fn test_admin_post_is_published() {
		let app = TestApp::new();
		let (_, admin) = app.login_as(PrincipalKind::Admin, "Grace").await;

		let response = app
			.server
			.post("/posts")
			.add_header(header::COOKIE, admin)
			.json(&json!({
				"title": "  Welcome  ",
				"content": "Term starts Monday",
				"image": "uploads/welcome.png",
			}))
			.await;

		assert_eq!(success(&response)["message"], "Post published");

		let public = success(&app.server.get("/posts").await);

		assert_eq!(public["posts"][0]["title"], "Welcome");
		assert_eq!(public["posts"][0]["image"], "uploads/welcome.png");
	}

	#[tokio::test]
	async fn test_blank_and_anonymous_posts_are_refused() {
		let app = TestApp::new();
		let (_, student) = app.login_as(PrincipalKind::Student, "Ada").await;

		let blank = app
			.server
			.post("/posts")
			.add_header(header::COOKIE, student)
			.json(&json!({ "title": "   ", "content": "World" }))
			.await;

		assert_eq!(failure(&blank), "Title must not be empty");

		let anonymous = app
			.server
			.post("/posts")
			.json(&json!({ "title": "Hello", "content": "World" }))
			.await;

		assert_eq!(failure(&anonymous), "Please log in to continue");
	}

	#[tokio::test]
	async fn test_single_post_visibility() {
		let app = TestApp::new();
		let (author, author_cookie) = app.login_as(PrincipalKind::Student, "Ada").await;
		let (_, other) = app.login_as(PrincipalKind::Student, "Bob").await;

		let post = app
			.state
			.moderation
			.create_post(&author, "Hello", "World", None)
			.await
			.unwrap();
		let path = format!("/posts/{}", post.id);

		let own = app
			.server
			.get(&path)
			.add_header(header::COOKIE, author_cookie)
			.await;

		assert_eq!(success(&own)["post"]["title"], "Hello");

		let stranger = app.server.get(&path).add_header(header::COOKIE, other).await;

		assert_eq!(failure(&stranger), "Post not found, refresh and try again");
		assert_eq!(
			failure(&app.server.get("/posts/9999").await),
			"Post not found, refresh and try again"
		);
	}
}
