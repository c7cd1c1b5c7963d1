use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};

use crate::{error, moderation, AppState};

pub mod model;
pub mod route;

pub type RouteError = error::RouteError<moderation::Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/approve", post_with(approve, approve_docs))
		.api_route("/edit", post_with(edit, edit_docs))
		.api_route("/delete", post_with(delete, delete_docs))
		.api_route(
			"/pending/posts",
			get_with(get_pending_posts, get_pending_posts_docs),
		)
		.api_route(
			"/pending/comments",
			get_with(get_pending_comments, get_pending_comments_docs),
		)
}
