//! Which posts and comments each audience gets to see.

use std::{collections::HashMap, sync::Arc};

use crate::{
	identity::Principal,
	model::{Comment, ItemKind, Post, PostThread, Status},
	moderation::{Denial, Error},
	store::{ContentStore, Filter, Order},
};

/// Everything a principal has written, whatever its status.
#[derive(Debug)]
pub struct OwnFeed {
	/// Own posts, newest first, each with all of its comments.
	pub posts: Vec<PostThread>,
	/// Own comments on any post, newest first.
	pub comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct Visibility {
	store: Arc<dyn ContentStore>,
}

impl Visibility {
	pub fn new(store: Arc<dyn ContentStore>) -> Self {
		Self { store }
	}

	/// Approved posts, newest first.
	pub async fn public_posts(&self) -> Result<Vec<Post>, Error> {
		Ok(self
			.store
			.posts(Filter::Status(Status::Approved), Order::NewestFirst)
			.await?)
	}

	/// Approved comments, newest first.
	pub async fn public_comments(&self) -> Result<Vec<Comment>, Error> {
		Ok(self
			.store
			.comments(Filter::Status(Status::Approved), Order::NewestFirst)
			.await?)
	}

	/// Approved posts with the comments `viewer` may see on each.
	pub async fn public_threads(&self, viewer: Option<&Principal>) -> Result<Vec<PostThread>, Error> {
		let posts = self.public_posts().await?;

		self.threads(posts, viewer).await
	}

	/// A single post with its visible comments.
	///
	/// Pending posts are only visible to their author and to admins; to
	/// anyone else they do not exist.
	pub async fn thread(&self, viewer: Option<&Principal>, id: i64) -> Result<PostThread, Error> {
		let not_found = || Error::NotFound {
			kind: ItemKind::Post,
			id,
		};

		let post = self
			.store
			.post(id)
			.await?
			.filter(|post| post.status == Status::Approved || sees_everything_on(viewer, post))
			.ok_or_else(not_found)?;

		self.threads(vec![post], viewer)
			.await?
			.pop()
			.ok_or_else(not_found)
	}

	/// Everything `principal` authored, newest first.
	pub async fn own_feed(&self, principal: &Principal) -> Result<OwnFeed, Error> {
		let author = Filter::Author(principal.author());

		let posts = self.store.posts(author, Order::NewestFirst).await?;
		let comments = self.store.comments(author, Order::NewestFirst).await?;

		Ok(OwnFeed {
			posts: self.threads(posts, Some(principal)).await?,
			comments,
		})
	}

	/// Pending posts, oldest first. Admins only.
	pub async fn pending_posts(&self, principal: &Principal) -> Result<Vec<Post>, Error> {
		require_admin(principal)?;

		Ok(self
			.store
			.posts(Filter::Status(Status::Pending), Order::OldestFirst)
			.await?)
	}

	/// Pending comments, oldest first. Admins only.
	pub async fn pending_comments(&self, principal: &Principal) -> Result<Vec<Comment>, Error> {
		require_admin(principal)?;

		Ok(self
			.store
			.comments(Filter::Status(Status::Pending), Order::OldestFirst)
			.await?)
	}

	/// Every comment regardless of status, newest first. Admins only.
	pub async fn all_comments(&self, principal: &Principal) -> Result<Vec<Comment>, Error> {
		require_admin(principal)?;

		Ok(self.store.comments(Filter::All, Order::NewestFirst).await?)
	}

	/// Attaches comments to `posts`, keeping their order.
	async fn threads(
		&self,
		posts: Vec<Post>,
		viewer: Option<&Principal>,
	) -> Result<Vec<PostThread>, Error> {
		let ids = posts.iter().map(|post| post.id).collect::<Vec<_>>();
		let mut by_post = HashMap::<i64, Vec<Comment>>::new();

		for comment in self.store.comments_on(&ids).await? {
			by_post.entry(comment.post_id).or_default().push(comment);
		}

		Ok(posts
			.into_iter()
			.map(|post| {
				let mut comments = by_post.remove(&post.id).unwrap_or_default();

				if !sees_everything_on(viewer, &post) {
					comments.retain(|comment| comment.status == Status::Approved);
				}

				PostThread { post, comments }
			})
			.collect())
	}
}

fn require_admin(principal: &Principal) -> Result<(), Error> {
	if principal.is_admin() {
		Ok(())
	} else {
		Err(Error::Authorization(Denial::AdminOnly))
	}
}

/// Admins and the post's author see pending comments on it too.
fn sees_everything_on(viewer: Option<&Principal>, post: &Post) -> bool {
	viewer.is_some_and(|viewer| viewer.is_admin() || viewer.owns(post.author()))
}
