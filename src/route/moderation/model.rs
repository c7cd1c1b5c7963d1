pub use crate::route::model::ItemInput;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::{Comment, ItemKind, Post};

/// New text for a post or comment.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct EditInput {
	pub id: i64,
	#[serde(rename = "type")]
	pub kind: ItemKind,
	#[validate(length(max = 10000))]
	pub content: String,
	/// Only used for posts, ignored for comments.
	#[validate(length(max = 255))]
	pub title: Option<String>,
}

#[derive(Serialize, JsonSchema)]
pub struct PendingPosts {
	pub success: bool,
	/// Oldest first.
	pub posts: Vec<Post>,
}

#[derive(Serialize, JsonSchema)]
pub struct PendingComments {
	pub success: bool,
	/// Oldest first.
	pub comments: Vec<Comment>,
}
