use schemars::JsonSchema;
use serde::Serialize;

use crate::model::Comment;

#[derive(Serialize, JsonSchema)]
pub struct Comments {
	pub success: bool,
	/// Newest first.
	pub comments: Vec<Comment>,
}
