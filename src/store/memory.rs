use std::{
	collections::{BTreeMap, HashMap},
	sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use uuid::Uuid;

use super::{
	Account, Approval, ContentStore, Edit, Error, Filter, IdentityStore, NewAccount, NewComment,
	NewPost, Order,
};
use crate::{
	identity::Principal,
	model::{AuthorRef, Comment, ItemKind, Post, PrincipalKind, Status},
};

#[derive(Default)]
struct Tables {
	posts: BTreeMap<i64, Post>,
	comments: BTreeMap<i64, Comment>,
	accounts: BTreeMap<i64, Account>,
	sessions: HashMap<Uuid, i64>,
	last_post_id: i64,
	last_comment_id: i64,
	last_account_id: i64,
}

/// A process-local store. All tables sit behind one mutex, so every
/// operation is atomic with respect to every other.
#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn tables(&self) -> MutexGuard<'_, Tables> {
		// no operation leaves the tables half-written, so a poisoned lock is still usable
		self.tables.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

fn sort<T>(items: &mut [T], order: Order, key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) {
	items.sort_by_key(|item| key(item));

	if order == Order::NewestFirst {
		items.reverse();
	}
}

#[axum::async_trait]
impl ContentStore for MemoryStore {
	async fn insert_post(&self, post: NewPost) -> Result<Post, Error> {
		let mut tables = self.tables();

		tables.last_post_id += 1;

		let post = Post {
			id: tables.last_post_id,
			title: post.title,
			content: post.content,
			image: post.image,
			author_id: post.author.id,
			author_type: post.author.kind,
			author_name: post.author.display_name,
			status: post.status,
			created_at: Utc::now(),
		};

		tables.posts.insert(post.id, post.clone());

		Ok(post)
	}

	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let mut tables = self.tables();

		if !tables.posts.contains_key(&comment.post_id) {
			return Ok(None);
		}

		tables.last_comment_id += 1;

		let comment = Comment {
			id: tables.last_comment_id,
			post_id: comment.post_id,
			author_id: comment.author.id,
			author_type: comment.author.kind,
			author_name: comment.author.display_name,
			content: comment.content,
			status: comment.status,
			created_at: Utc::now(),
		};

		tables.comments.insert(comment.id, comment.clone());

		Ok(Some(comment))
	}

	async fn post(&self, id: i64) -> Result<Option<Post>, Error> {
		Ok(self.tables().posts.get(&id).cloned())
	}

	async fn author(&self, kind: ItemKind, id: i64) -> Result<Option<AuthorRef>, Error> {
		let tables = self.tables();

		Ok(match kind {
			ItemKind::Post => tables.posts.get(&id).map(Post::author),
			ItemKind::Comment => tables.comments.get(&id).map(Comment::author),
		})
	}

	async fn approve(&self, kind: ItemKind, id: i64) -> Result<Approval, Error> {
		let mut tables = self.tables();

		let status = match kind {
			ItemKind::Post => tables.posts.get_mut(&id).map(|post| &mut post.status),
			ItemKind::Comment => tables.comments.get_mut(&id).map(|comment| &mut comment.status),
		};

		Ok(match status {
			None => Approval::Missing,
			Some(Status::Approved) => Approval::AlreadyApproved,
			Some(status) => {
				*status = Status::Approved;
				Approval::Approved
			}
		})
	}

	async fn update(&self, kind: ItemKind, id: i64, edit: Edit<'_>) -> Result<bool, Error> {
		let mut tables = self.tables();

		match kind {
			ItemKind::Post => {
				let Some(post) = tables.posts.get_mut(&id) else {
					return Ok(false);
				};

				post.content = edit.content.to_owned();

				if let Some(title) = edit.title {
					post.title = title.to_owned();
				}
			}
			ItemKind::Comment => {
				let Some(comment) = tables.comments.get_mut(&id) else {
					return Ok(false);
				};

				comment.content = edit.content.to_owned();
			}
		}

		Ok(true)
	}

	async fn delete_comment(&self, id: i64) -> Result<bool, Error> {
		Ok(self.tables().comments.remove(&id).is_some())
	}

	async fn delete_post(&self, id: i64) -> Result<Option<u64>, Error> {
		let mut tables = self.tables();

		if tables.posts.remove(&id).is_none() {
			return Ok(None);
		}

		let before = tables.comments.len();
		tables.comments.retain(|_, comment| comment.post_id != id);

		Ok(Some((before - tables.comments.len()) as u64))
	}

	async fn posts(&self, filter: Filter, order: Order) -> Result<Vec<Post>, Error> {
		let mut posts = self
			.tables()
			.posts
			.values()
			.filter(|post| filter.matches(post.status, post.author()))
			.cloned()
			.collect::<Vec<_>>();

		sort(&mut posts, order, |post| (post.created_at, post.id));

		Ok(posts)
	}

	async fn comments(&self, filter: Filter, order: Order) -> Result<Vec<Comment>, Error> {
		let mut comments = self
			.tables()
			.comments
			.values()
			.filter(|comment| filter.matches(comment.status, comment.author()))
			.cloned()
			.collect::<Vec<_>>();

		sort(&mut comments, order, |comment| (comment.created_at, comment.id));

		Ok(comments)
	}

	async fn comments_on(&self, post_ids: &[i64]) -> Result<Vec<Comment>, Error> {
		let mut comments = self
			.tables()
			.comments
			.values()
			.filter(|comment| post_ids.contains(&comment.post_id))
			.cloned()
			.collect::<Vec<_>>();

		sort(&mut comments, Order::OldestFirst, |comment| {
			(comment.created_at, comment.id)
		});

		Ok(comments)
	}
}

#[axum::async_trait]
impl IdentityStore for MemoryStore {
	async fn account(&self, kind: PrincipalKind, email: &str) -> Result<Option<Account>, Error> {
		Ok(self
			.tables()
			.accounts
			.values()
			.find(|account| account.kind == kind && account.email == email)
			.cloned())
	}

	async fn insert_account(&self, account: NewAccount) -> Result<Account, Error> {
		let mut tables = self.tables();

		tables.last_account_id += 1;

		let account = Account {
			id: tables.last_account_id,
			kind: account.kind,
			name: account.name,
			email: account.email,
			password: account.password,
			salt: account.salt,
			created_at: Utc::now(),
		};

		tables.accounts.insert(account.id, account.clone());

		Ok(account)
	}

	async fn create_session(&self, account_id: i64) -> Result<Uuid, Error> {
		let id = Uuid::new_v4();

		self.tables().sessions.insert(id, account_id);

		Ok(id)
	}

	async fn resolve_session(&self, id: Uuid) -> Result<Option<Principal>, Error> {
		let tables = self.tables();

		Ok(tables
			.sessions
			.get(&id)
			.and_then(|account_id| tables.accounts.get(account_id))
			.map(Account::principal))
	}

	async fn delete_session(&self, id: Uuid) -> Result<(), Error> {
		self.tables().sessions.remove(&id);

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn student() -> Principal {
		Principal {
			id: 1,
			kind: PrincipalKind::Student,
			display_name: "Ada".into(),
		}
	}

	async fn post(store: &MemoryStore) -> Post {
		store
			.insert_post(NewPost {
				title: "Hello".into(),
				content: "World".into(),
				image: None,
				author: student(),
				status: Status::Pending,
			})
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn test_approve_only_flips_once() {
		let store = MemoryStore::new();
		let post = post(&store).await;

		assert_eq!(
			store.approve(ItemKind::Post, post.id).await.unwrap(),
			Approval::Approved
		);
		assert_eq!(
			store.approve(ItemKind::Post, post.id).await.unwrap(),
			Approval::AlreadyApproved
		);
		assert_eq!(
			store.approve(ItemKind::Comment, post.id).await.unwrap(),
			Approval::Missing
		);
	}

	#[tokio::test]
	async fn test_comment_requires_existing_post() {
		let store = MemoryStore::new();

		let comment = store
			.insert_comment(NewComment {
				post_id: 42,
				content: "orphan".into(),
				author: student(),
				status: Status::Pending,
			})
			.await
			.unwrap();

		assert!(comment.is_none());
	}

	#[tokio::test]
	async fn test_delete_post_cascades() {
		let store = MemoryStore::new();
		let kept = post(&store).await;
		let doomed = post(&store).await;

		for post_id in [kept.id, doomed.id, doomed.id] {
			store
				.insert_comment(NewComment {
					post_id,
					content: "hi".into(),
					author: student(),
					status: Status::Pending,
				})
				.await
				.unwrap();
		}

		assert_eq!(store.delete_post(doomed.id).await.unwrap(), Some(2));
		assert_eq!(store.delete_post(doomed.id).await.unwrap(), None);

		let left = store.comments(Filter::All, Order::OldestFirst).await.unwrap();

		assert_eq!(left.len(), 1);
		assert_eq!(left[0].post_id, kept.id);
	}

	#[tokio::test]
	async fn test_listing_order_breaks_ties_by_id() {
		let store = MemoryStore::new();
		let first = post(&store).await;
		let second = post(&store).await;

		let newest = store.posts(Filter::All, Order::NewestFirst).await.unwrap();
		let oldest = store.posts(Filter::All, Order::OldestFirst).await.unwrap();

		assert_eq!(
			newest.iter().map(|p| p.id).collect::<Vec<_>>(),
			[second.id, first.id]
		);
		assert_eq!(
			oldest.iter().map(|p| p.id).collect::<Vec<_>>(),
			[first.id, second.id]
		);
	}

	#[tokio::test]
	async fn test_sessions_resolve_to_current_account_name() {
		let store = MemoryStore::new();
		let account = store
			.insert_account(NewAccount {
				kind: PrincipalKind::Admin,
				name: "Grace".into(),
				email: "grace@college.edu".into(),
				password: Vec::new(),
				salt: Uuid::new_v4(),
			})
			.await
			.unwrap();

		let session = store.create_session(account.id).await.unwrap();
		let principal = store.resolve_session(session).await.unwrap().unwrap();

		assert_eq!(principal.display_name, "Grace");
		assert!(principal.is_admin());

		store.delete_session(session).await.unwrap();

		assert!(store.resolve_session(session).await.unwrap().is_none());
	}
}
