use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::ItemKind;

/// A successful operation without a payload.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Acknowledgement {
	/// Always `true`.
	pub success: bool,
	pub message: String,
}

impl Acknowledgement {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
		}
	}
}

/// A newly created post or comment.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Created {
	pub success: bool,
	/// Says whether the item was published or is waiting for review.
	pub message: String,
	/// The id of the new item.
	pub id: i64,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: i64,
}

/// Names a post or a comment.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct ItemInput {
	pub id: i64,
	#[serde(rename = "type")]
	pub kind: ItemKind,
}
