use schemars::JsonSchema;
use serde::Serialize;

use crate::model::{Comment, PostThread};

#[derive(Serialize, JsonSchema)]
pub struct Feed {
	pub success: bool,
	/// Newest first.
	pub posts: Vec<PostThread>,
}

#[derive(Serialize, JsonSchema)]
pub struct OwnFeed {
	pub success: bool,
	/// Own posts in any status, newest first, each with all of its comments.
	pub posts: Vec<PostThread>,
	/// Own comments in any status, newest first.
	pub comments: Vec<Comment>,
}

#[derive(Serialize, JsonSchema)]
pub struct Thread {
	pub success: bool,
	pub post: PostThread,
}
