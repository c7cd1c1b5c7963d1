use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Session},
	moderation::Engine,
	openapi::tag,
	route::model::Acknowledgement,
	visibility::Visibility,
};

use super::{model, RouteError};

/// Approve item
/// Publishes a pending post or comment. Admins only. Approving an item twice
/// is an error, so a stale review queue is noticed.
#[route(tag = tag::MODERATION)]
pub async fn approve(
	State(engine): State<Engine>,
	session: Session,
	Json(input): Json<model::ItemInput>,
) -> Result<Json<Acknowledgement>, RouteError> {
	engine
		.approve(&session.principal, input.kind, input.id)
		.await?;

	Ok(Json(Acknowledgement::new(format!(
		"{} approved",
		input.kind.title()
	))))
}

/// Edit item
/// Replaces the content of a post or comment, and the title of a post. Admins
/// may edit anything, students only what they wrote. The status is unchanged.
#[route(tag = tag::MODERATION)]
pub async fn edit(
	State(engine): State<Engine>,
	session: Session,
	Json(input): Json<model::EditInput>,
) -> Result<Json<Acknowledgement>, RouteError> {
	engine
		.edit(
			&session.principal,
			input.kind,
			input.id,
			&input.content,
			input.title.as_deref(),
		)
		.await?;

	Ok(Json(Acknowledgement::new(format!(
		"{} updated",
		input.kind.title()
	))))
}

/// Delete item
/// Deletes a post or comment. Deleting a post deletes its comments too.
/// Admins may delete anything, students only what they wrote.
#[route(tag = tag::MODERATION)]
pub async fn delete(
	State(engine): State<Engine>,
	session: Session,
	Json(input): Json<model::ItemInput>,
) -> Result<Json<Acknowledgement>, RouteError> {
	engine
		.remove(&session.principal, input.kind, input.id)
		.await?;

	Ok(Json(Acknowledgement::new(format!(
		"{} deleted",
		input.kind.title()
	))))
}

/// Get pending posts
/// Returns the posts waiting for review, oldest first. Admins only.
#[route(tag = tag::MODERATION)]
pub async fn get_pending_posts(
	State(visibility): State<Visibility>,
	session: Session,
) -> Result<Json<model::PendingPosts>, RouteError> {
	Ok(Json(model::PendingPosts {
		success: true,
		posts: visibility.pending_posts(&session.principal).await?,
	}))
}

/// Get pending comments
/// Returns the comments waiting for review, oldest first. Admins only.
#[route(tag = tag::MODERATION)]
pub async fn get_pending_comments(
	State(visibility): State<Visibility>,
	session: Session,
) -> Result<Json<model::PendingComments>, RouteError> {
	Ok(Json(model::PendingComments {
		success: true,
		comments: visibility.pending_comments(&session.principal).await?,
	}))
}
