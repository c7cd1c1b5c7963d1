use std::fmt;

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// The two kinds of principal that can author content.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "principal_kind", rename_all = "lowercase")]
pub enum PrincipalKind {
	Admin,
	#[default]
	Student,
}

impl fmt::Display for PrincipalKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Admin => "admin",
			Self::Student => "student",
		})
	}
}

/// Moderation status of a post or comment.
///
/// `Pending -> Approved` is the only transition.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "content_status", rename_all = "lowercase")]
pub enum Status {
	#[default]
	Pending,
	Approved,
}

/// Which table an item id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
	Post,
	Comment,
}

impl ItemKind {
	/// The kind name with a leading capital, for client messages.
	pub fn title(self) -> &'static str {
		match self {
			Self::Post => "Post",
			Self::Comment => "Comment",
		}
	}
}

impl fmt::Display for ItemKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Post => "post",
			Self::Comment => "comment",
		})
	}
}

/// Identifies the principal that owns an item. Set once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorRef {
	pub id: i64,
	pub kind: PrincipalKind,
}

/// A post, authored by an admin or a student.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The title of the post.
	#[validate(length(min = 1, max = 255))]
	pub title: String,
	/// The body of the post.
	#[validate(length(min = 1, max = 10000))]
	pub content: String,
	/// A reference to an uploaded image, if any.
	#[validate(length(max = 2048))]
	pub image: Option<String>,
	/// The id of the author, scoped by `author_type`.
	#[serde(skip_deserializing)]
	pub author_id: i64,
	#[serde(skip_deserializing)]
	pub author_type: PrincipalKind,
	/// The author's display name when the post was created.
	#[serde(skip_deserializing)]
	pub author_name: String,
	#[serde(skip_deserializing)]
	pub status: Status,
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
	pub fn author(&self) -> AuthorRef {
		AuthorRef {
			id: self.author_id,
			kind: self.author_type,
		}
	}
}

/// A comment on a post.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[serde(skip_deserializing)]
	pub id: i64,
	/// The post this comment belongs to.
	pub post_id: i64,
	#[serde(skip_deserializing)]
	pub author_id: i64,
	#[serde(skip_deserializing)]
	pub author_type: PrincipalKind,
	#[serde(skip_deserializing)]
	pub author_name: String,
	/// The body of the comment.
	#[validate(length(min = 1, max = 10000))]
	pub content: String,
	#[serde(skip_deserializing)]
	pub status: Status,
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
	pub fn author(&self) -> AuthorRef {
		AuthorRef {
			id: self.author_id,
			kind: self.author_type,
		}
	}
}

/// A post together with the comments the viewer is allowed to see.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PostThread {
	#[serde(flatten)]
	pub post: Post,
	/// Comments on the post, oldest first.
	pub comments: Vec<Comment>,
}
