use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Session},
	model::{CreateComment, ItemKind},
	moderation::{creation_message, Engine},
	openapi::tag,
	route::model::Created,
	visibility::Visibility,
};

use super::{model, RouteError};

/// Get public comments
/// Returns approved comments on any post, newest first.
#[route(tag = tag::COMMENT)]
pub async fn get_public_comments(
	State(visibility): State<Visibility>,
) -> Result<Json<model::Comments>, RouteError> {
	Ok(Json(model::Comments {
		success: true,
		comments: visibility.public_comments().await?,
	}))
}

/// Get all comments
/// Returns every comment regardless of its status, newest first. Admins only.
#[route(tag = tag::COMMENT)]
pub async fn get_all_comments(
	State(visibility): State<Visibility>,
	session: Session,
) -> Result<Json<model::Comments>, RouteError> {
	Ok(Json(model::Comments {
		success: true,
		comments: visibility.all_comments(&session.principal).await?,
	}))
}

/// Create comment
/// Comments on an existing post. Comments by students wait for an admin to
/// approve them.
#[route(tag = tag::COMMENT)]
pub async fn create_comment(
	State(engine): State<Engine>,
	session: Session,
	Json(input): Json<CreateComment>,
) -> Result<Json<Created>, RouteError> {
	let comment = engine
		.create_comment(&session.principal, input.post_id, &input.content)
		.await?;

	Ok(Json(Created {
		success: true,
		message: creation_message(ItemKind::Comment, comment.status),
		id: comment.id,
	}))
}
