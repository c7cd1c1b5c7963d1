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
			get_with(get_all_comments, get_all_comments_docs)
				.post_with(create_comment, create_comment_docs),
		)
		.api_route("/public", get_with(get_public_comments, get_public_comments_docs))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_comment_lifecycle() {
		let app = TestApp::new();
		let (admin, admin_cookie) = app.login_as(PrincipalKind::Admin, "Grace").await;
		let (_, student) = app.login_as(PrincipalKind::Student, "Ada").await;

		let post = app
			.state
			.moderation
			.create_post(&admin, "Notice", "Library hours", None)
			.await
			.unwrap();

		let response = app
			.server
			.post("/comments")
			.add_header(header::COOKIE, student.clone())
			.json(&json!({ "post_id": post.id, "content": "Thanks!" }))
			.await;
		let created = success(&response);

		assert_eq!(created["message"], "Comment submitted for review");

		let public = success(&app.server.get("/comments/public").await);

		assert_eq!(public["comments"], json!([]));

		let feed = success(&app.server.get("/posts").await);

		assert_eq!(feed["posts"][0]["comments"], json!([]));

		let own = success(
			&app.server
				.get("/posts/me")
				.add_header(header::COOKIE, student)
				.await,
		);

		assert_eq!(own["comments"][0]["status"], "pending");

		let all = success(
			&app.server
				.get("/comments")
				.add_header(header::COOKIE, admin_cookie.clone())
				.await,
		);

		assert_eq!(all["comments"][0]["id"], created["id"]);

		let approve = app
			.server
			.post("/moderation/approve")
			.add_header(header::COOKIE, admin_cookie)
			.json(&json!({ "id": created["id"], "type": "comment" }))
			.await;

		assert_eq!(success(&approve)["message"], "Comment approved");

		let public = success(&app.server.get("/comments/public").await);

		assert_eq!(public["comments"][0]["content"], "Thanks!");
	}

	#[tokio::test]
	async fn test_comment_on_missing_post() {
		let app = TestApp::new();
		let (_, student) = app.login_as(PrincipalKind::Student, "Ada").await;

		let response = app
			.server
			.post("/comments")
			.add_header(header::COOKIE, student)
			.json(&json!({ "post_id": 404, "content": "Hello?" }))
			.await;

		assert_eq!(failure(&response), "Post not found, refresh and try again");
	}

	#[tokio::test]
	async fn test_full_comment_listing_is_admin_only() {
		let app = TestApp::new();
		let (_, student) = app.login_as(PrincipalKind::Student, "Ada").await;

		let response = app
			.server
			.get("/comments")
			.add_header(header::COOKIE, student)
			.await;

		assert_eq!(failure(&response), "Only administrators can do this");
	}
}
