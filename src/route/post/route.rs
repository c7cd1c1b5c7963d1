use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Session, Viewer},
	model::{CreatePost, ItemKind},
	moderation::{creation_message, Engine},
	openapi::tag,
	route::model::{Created, IdInput},
	visibility::Visibility,
};

use super::{model, RouteError};

/// Get public feed
/// Returns approved posts, newest first. Each post carries its approved
/// comments, or all of them if the caller wrote the post or is an admin.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(visibility): State<Visibility>,
	Viewer(viewer): Viewer,
) -> Result<Json<model::Feed>, RouteError> {
	let posts = visibility.public_threads(viewer.as_ref()).await?;

	Ok(Json(model::Feed {
		success: true,
		posts,
	}))
}

/// Get own feed
/// Returns your posts and comments in any status, newest first, so you can
/// follow what is still waiting for review.
#[route(tag = tag::POST)]
pub async fn get_own_feed(
	State(visibility): State<Visibility>,
	session: Session,
) -> Result<Json<model::OwnFeed>, RouteError> {
	let feed = visibility.own_feed(&session.principal).await?;

	Ok(Json(model::OwnFeed {
		success: true,
		posts: feed.posts,
		comments: feed.comments,
	}))
}

/// Get single post
/// Returns a post with its comments. Pending posts are only visible to their
/// author and to admins.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(visibility): State<Visibility>,
	Viewer(viewer): Viewer,
	Path(IdInput { id }): Path<IdInput>,
) -> Result<Json<model::Thread>, RouteError> {
	let post = visibility.thread(viewer.as_ref(), id).await?;

	Ok(Json(model::Thread {
		success: true,
		post,
	}))
}

/// Create post
/// Creates a post. Posts by admins are published at once, posts by students
/// wait for an admin to approve them.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(engine): State<Engine>,
	session: Session,
	Json(input): Json<CreatePost>,
) -> Result<Json<Created>, RouteError> {
	let post = engine
		.create_post(&session.principal, &input.title, &input.content, input.image)
		.await?;

	Ok(Json(Created {
		success: true,
		message: creation_message(ItemKind::Post, post.status),
		id: post.id,
	}))
}
