//! Creation, approval, editing and removal of posts and comments.
//!
//! Admins moderate the whole corpus: their content is published directly and
//! they may approve, edit or delete anything. Students may only edit or delete
//! what they wrote, and what they write waits in the review queue until an
//! admin approves it.

use std::{fmt, sync::Arc};

use axum::http::StatusCode;

use crate::{
	error,
	identity::Principal,
	model::{Comment, ItemKind, Post, Status},
	store::{self, Approval, ContentStore, Edit, NewComment, NewPost},
};

/// Why an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
	/// The operation is reserved for admins.
	AdminOnly,
	/// Students may only touch their own items.
	NotOwner(ItemKind),
}

impl fmt::Display for Denial {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::AdminOnly => f.write_str("Only administrators can do this"),
			Self::NotOwner(kind) => write!(f, "You can only modify your own {kind}s"),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Validation(&'static str),
	#[error("{0}")]
	Authorization(Denial),
	#[error("{kind} {id} does not exist")]
	NotFound { kind: ItemKind, id: i64 },
	#[error("{kind} {id} is already approved")]
	InvalidState { kind: ItemKind, id: i64 },
	#[error("post {post_id} could not be deleted")]
	PartialDelete { post_id: i64 },
	#[error("store error: {0}")]
	Store(store::Error),
}

impl From<store::Error> for Error {
	fn from(error: store::Error) -> Self {
		match error {
			store::Error::PartialDelete { post_id, remaining } => {
				tracing::error!(post_id, remaining, "cascade delete left comments behind");

				Self::PartialDelete { post_id }
			}
			error => Self::Store(error),
		}
	}
}

impl From<Error> for error::RouteError<Error> {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::OK,
		}
	}

	fn message(&self) -> String {
		match self {
			Self::NotFound { kind, .. } => {
				format!("{} not found, refresh and try again", kind.title())
			}
			Self::InvalidState { kind, .. } => {
				format!("{} is already approved, refresh and try again", kind.title())
			}
			Self::PartialDelete { .. } => "The post could not be deleted, try again later".into(),
			Self::Store(..) => "Internal server error".into(),
			_ => self.to_string(),
		}
	}
}

/// Trims `value`, failing with `message` when nothing is left.
fn required<'a>(value: &'a str, message: &'static str) -> Result<&'a str, Error> {
	match value.trim() {
		"" => Err(Error::Validation(message)),
		value => Ok(value),
	}
}

/// The moderation state machine and permission matrix.
#[derive(Clone)]
pub struct Engine {
	store: Arc<dyn ContentStore>,
}

impl Engine {
	pub fn new(store: Arc<dyn ContentStore>) -> Self {
		Self { store }
	}

	/// Admins and the item's author may edit or delete it.
	async fn authorize_change(
		&self,
		principal: &Principal,
		kind: ItemKind,
		id: i64,
	) -> Result<(), Error> {
		let author = self
			.store
			.author(kind, id)
			.await?
			.ok_or(Error::NotFound { kind, id })?;

		if principal.is_admin() || principal.owns(author) {
			Ok(())
		} else {
			Err(Error::Authorization(Denial::NotOwner(kind)))
		}
	}

	#[tracing::instrument(skip_all, fields(principal.id = principal.id, principal.kind = %principal.kind))]
	pub async fn create_post(
		&self,
		principal: &Principal,
		title: &str,
		content: &str,
		image: Option<String>,
	) -> Result<Post, Error> {
		let title = required(title, "Title must not be empty")?;
		let content = required(content, "Content must not be empty")?;

		let post = self
			.store
			.insert_post(NewPost {
				title: title.to_owned(),
				content: content.to_owned(),
				image: image.filter(|image| !image.trim().is_empty()),
				author: principal.clone(),
				status: principal.initial_status(),
			})
			.await?;

		tracing::info!(
			post.id = post.id,
			status = ?post.status,
			monotonic_counter.posts_created = 1_u64,
			"post created"
		);

		Ok(post)
	}

	#[tracing::instrument(skip_all, fields(principal.id = principal.id, principal.kind = %principal.kind, post.id = post_id))]
	pub async fn create_comment(
		&self,
		principal: &Principal,
		post_id: i64,
		content: &str,
	) -> Result<Comment, Error> {
		let content = required(content, "Content must not be empty")?;

		let comment = self
			.store
			.insert_comment(NewComment {
				post_id,
				content: content.to_owned(),
				author: principal.clone(),
				status: principal.initial_status(),
			})
			.await?
			.ok_or(Error::NotFound {
				kind: ItemKind::Post,
				id: post_id,
			})?;

		tracing::info!(
			comment.id = comment.id,
			status = ?comment.status,
			monotonic_counter.comments_created = 1_u64,
			"comment created"
		);

		Ok(comment)
	}

	/// Moves a pending item to approved.
	///
	/// Approving twice is an error rather than a no-op, so racing approvals
	/// show up: of two concurrent calls exactly one succeeds.
	#[tracing::instrument(skip_all, fields(principal.id = principal.id, kind = %kind, id = id))]
	pub async fn approve(&self, principal: &Principal, kind: ItemKind, id: i64) -> Result<(), Error> {
		if !principal.is_admin() {
			return Err(Error::Authorization(Denial::AdminOnly));
		}

		match self.store.approve(kind, id).await? {
			Approval::Approved => {
				tracing::info!(monotonic_counter.approvals = 1_u64, "approved");

				Ok(())
			}
			Approval::AlreadyApproved => {
				tracing::warn!("approval of an already approved item");

				Err(Error::InvalidState { kind, id })
			}
			Approval::Missing => Err(Error::NotFound { kind, id }),
		}
	}

	/// Replaces the content (and, for posts, optionally the title) of an item.
	///
	/// The status is left alone: an approved item stays approved.
	#[tracing::instrument(skip_all, fields(principal.id = principal.id, principal.kind = %principal.kind, kind = %kind, id = id))]
	pub async fn edit(
		&self,
		principal: &Principal,
		kind: ItemKind,
		id: i64,
		content: &str,
		title: Option<&str>,
	) -> Result<(), Error> {
		self.authorize_change(principal, kind, id).await?;

		let content = required(content, "Content must not be empty")?;
		let title = match (kind, title) {
			(ItemKind::Post, Some(title)) => Some(required(title, "Title must not be empty")?),
			_ => None,
		};

		if !self
			.store
			.update(kind, id, Edit { content, title })
			.await?
		{
			return Err(Error::NotFound { kind, id });
		}

		tracing::info!("edited");

		Ok(())
	}

	/// Deletes an item. Deleting a post also deletes every comment on it.
	#[tracing::instrument(skip_all, fields(principal.id = principal.id, principal.kind = %principal.kind, kind = %kind, id = id))]
	pub async fn remove(&self, principal: &Principal, kind: ItemKind, id: i64) -> Result<(), Error> {
		self.authorize_change(principal, kind, id).await?;

		match kind {
			ItemKind::Post => {
				let comments = self
					.store
					.delete_post(id)
					.await?
					.ok_or(Error::NotFound { kind, id })?;

				tracing::info!(comments, monotonic_counter.deletions = 1_u64, "post deleted");
			}
			ItemKind::Comment => {
				if !self.store.delete_comment(id).await? {
					return Err(Error::NotFound { kind, id });
				}

				tracing::info!(monotonic_counter.deletions = 1_u64, "comment deleted");
			}
		}

		Ok(())
	}
}

/// Client message for a freshly created item.
pub fn creation_message(kind: ItemKind, status: Status) -> String {
	match status {
		Status::Approved => format!("{} published", kind.title()),
		Status::Pending => format!("{} submitted for review", kind.title()),
	}
}
