//! Durable storage for posts, comments, accounts and sessions.
//!
//! Every method is atomic on its own: a status flip and a content edit on the
//! same row never interleave, and deleting a post removes its comments in the
//! same unit of work.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use uuid::Uuid;

use crate::{
	identity::Principal,
	model::{AuthorRef, Comment, ItemKind, Post, PrincipalKind, Status},
};

/// Attempts at sweeping a post's comments before a delete is abandoned.
pub const CASCADE_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("{remaining} comments of post {post_id} survived every delete attempt")]
	PartialDelete { post_id: i64, remaining: u64 },
}

/// Which rows a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
	All,
	Status(Status),
	Author(AuthorRef),
}

impl Filter {
	pub fn matches(self, status: Status, author: AuthorRef) -> bool {
		match self {
			Self::All => true,
			Self::Status(wanted) => status == wanted,
			Self::Author(wanted) => author == wanted,
		}
	}
}

/// Listing order by `created_at`, ties broken by id in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
	NewestFirst,
	OldestFirst,
}

/// Outcome of an approval attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
	Approved,
	AlreadyApproved,
	Missing,
}

#[derive(Debug, Clone)]
pub struct NewPost {
	pub title: String,
	pub content: String,
	pub image: Option<String>,
	pub author: Principal,
	pub status: Status,
}

#[derive(Debug, Clone)]
pub struct NewComment {
	pub post_id: i64,
	pub content: String,
	pub author: Principal,
	pub status: Status,
}

/// A content edit. `title` only applies to posts.
#[derive(Debug, Clone, Copy)]
pub struct Edit<'a> {
	pub content: &'a str,
	pub title: Option<&'a str>,
}

/// A login-capable admin or student.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
	pub id: i64,
	pub kind: PrincipalKind,
	pub name: String,
	pub email: String,
	/// Argon2 hash of the password, salted with `salt`.
	pub password: Vec<u8>,
	pub salt: Uuid,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Account {
	pub fn principal(&self) -> Principal {
		Principal {
			id: self.id,
			kind: self.kind,
			display_name: self.name.clone(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct NewAccount {
	pub kind: PrincipalKind,
	pub name: String,
	pub email: String,
	pub password: Vec<u8>,
	pub salt: Uuid,
}

#[axum::async_trait]
pub trait ContentStore: Send + Sync {
	async fn insert_post(&self, post: NewPost) -> Result<Post, Error>;

	/// Returns `None` if the target post does not exist.
	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error>;

	async fn post(&self, id: i64) -> Result<Option<Post>, Error>;

	async fn author(&self, kind: ItemKind, id: i64) -> Result<Option<AuthorRef>, Error>;

	/// Flips a pending item to approved. Two concurrent calls for the same
	/// item never both return [`Approval::Approved`].
	async fn approve(&self, kind: ItemKind, id: i64) -> Result<Approval, Error>;

	/// Returns `false` if the item does not exist. Never touches `status`.
	async fn update(&self, kind: ItemKind, id: i64, edit: Edit<'_>) -> Result<bool, Error>;

	async fn delete_comment(&self, id: i64) -> Result<bool, Error>;

	/// Deletes a post and all of its comments, returning the number of
	/// comments removed, or `None` if the post does not exist.
	async fn delete_post(&self, id: i64) -> Result<Option<u64>, Error>;

	async fn posts(&self, filter: Filter, order: Order) -> Result<Vec<Post>, Error>;

	async fn comments(&self, filter: Filter, order: Order) -> Result<Vec<Comment>, Error>;

	/// All comments on the given posts, oldest first.
	async fn comments_on(&self, post_ids: &[i64]) -> Result<Vec<Comment>, Error>;
}

#[axum::async_trait]
pub trait IdentityStore: Send + Sync {
	async fn account(&self, kind: PrincipalKind, email: &str) -> Result<Option<Account>, Error>;

	async fn insert_account(&self, account: NewAccount) -> Result<Account, Error>;

	async fn create_session(&self, account_id: i64) -> Result<Uuid, Error>;

	async fn resolve_session(&self, id: Uuid) -> Result<Option<Principal>, Error>;

	async fn delete_session(&self, id: Uuid) -> Result<(), Error>;
}
