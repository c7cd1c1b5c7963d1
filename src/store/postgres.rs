use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{
	Account, Approval, ContentStore, Edit, Error, Filter, IdentityStore, NewAccount, NewComment,
	NewPost, Order, CASCADE_ATTEMPTS,
};
use crate::{
	identity::Principal,
	model::{AuthorRef, Comment, ItemKind, Post, PrincipalKind, Status},
};

const COMMENT_POST_FOREIGN_KEY: &str = "comment_post_id_fkey";

/// A store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Connects to the database and brings its schema up to date.
	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPoolOptions::new().connect(url).await?;

		sqlx::migrate!("./migrations").run(&pool).await?;

		Ok(Self::new(pool))
	}
}

fn table(kind: ItemKind) -> &'static str {
	match kind {
		ItemKind::Post => "post",
		ItemKind::Comment => "comment",
	}
}

fn direction(order: Order) -> &'static str {
	match order {
		Order::NewestFirst => "DESC",
		Order::OldestFirst => "ASC",
	}
}

fn listing(table: &str, filter: Filter, order: Order) -> String {
	let clause = match filter {
		Filter::All => "",
		Filter::Status(..) => "WHERE status = $1",
		Filter::Author(..) => "WHERE author_id = $1 AND author_type = $2",
	};
	let direction = direction(order);

	format!("SELECT * FROM {table} {clause} ORDER BY created_at {direction}, id {direction}")
}

#[axum::async_trait]
impl ContentStore for PgStore {
	async fn insert_post(&self, post: NewPost) -> Result<Post, Error> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (title, content, image, author_id, author_type, author_name, status)
				VALUES ($1, $2, $3, $4, $5, $6, $7)
				RETURNING *
			"#,
		)
		.bind(post.title)
		.bind(post.content)
		.bind(post.image)
		.bind(post.author.id)
		.bind(post.author.kind)
		.bind(post.author.display_name)
		.bind(post.status)
		.fetch_one(&self.pool)
		.await?;

		Ok(post)
	}

	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let result = sqlx::query_as::<_, Comment>(
			r#"
				INSERT INTO comment (post_id, author_id, author_type, author_name, content, status)
				SELECT id, $2, $3, $4, $5, $6 FROM post WHERE id = $1
				RETURNING *
			"#,
		)
		.bind(comment.post_id)
		.bind(comment.author.id)
		.bind(comment.author.kind)
		.bind(comment.author.display_name)
		.bind(comment.content)
		.bind(comment.status)
		.fetch_optional(&self.pool)
		.await;

		match result {
			Ok(comment) => Ok(comment),
			// the post was deleted between the existence check and the insert
			Err(sqlx::Error::Database(ref e)) if e.constraint() == Some(COMMENT_POST_FOREIGN_KEY) => {
				Ok(None)
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn post(&self, id: i64) -> Result<Option<Post>, Error> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn author(&self, kind: ItemKind, id: i64) -> Result<Option<AuthorRef>, Error> {
		let sql = format!(
			"SELECT author_id, author_type FROM {} WHERE id = $1",
			table(kind)
		);

		let author = sqlx::query_as::<_, (i64, PrincipalKind)>(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(author.map(|(id, kind)| AuthorRef { id, kind }))
	}

	async fn approve(&self, kind: ItemKind, id: i64) -> Result<Approval, Error> {
		let table = table(kind);

		// the status predicate makes the flip a compare-and-set on the row
		let flipped = sqlx::query(&format!(
			"UPDATE {table} SET status = $1 WHERE id = $2 AND status = $3"
		))
		.bind(Status::Approved)
		.bind(id)
		.bind(Status::Pending)
		.execute(&self.pool)
		.await?;

		if flipped.rows_affected() > 0 {
			return Ok(Approval::Approved);
		}

		let exists = sqlx::query_scalar::<_, i64>(&format!("SELECT id FROM {table} WHERE id = $1"))
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(match exists {
			Some(..) => Approval::AlreadyApproved,
			None => Approval::Missing,
		})
	}

	async fn update(&self, kind: ItemKind, id: i64, edit: Edit<'_>) -> Result<bool, Error> {
		let updated = match kind {
			ItemKind::Post => {
				sqlx::query(
					r#"
						UPDATE post
						SET content = $1, title = COALESCE($2, title)
						WHERE id = $3
					"#,
				)
				.bind(edit.content)
				.bind(edit.title)
				.bind(id)
				.execute(&self.pool)
				.await?
			}
			ItemKind::Comment => {
				sqlx::query("UPDATE comment SET content = $1 WHERE id = $2")
					.bind(edit.content)
					.bind(id)
					.execute(&self.pool)
					.await?
			}
		};

		Ok(updated.rows_affected() > 0)
	}

	async fn delete_comment(&self, id: i64) -> Result<bool, Error> {
		let deleted = sqlx::query("DELETE FROM comment WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(deleted.rows_affected() > 0)
	}

	async fn delete_post(&self, id: i64) -> Result<Option<u64>, Error> {
		let mut tx = self.pool.begin().await?;

		// locking the post blocks new comments from referencing it until we commit
		let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM post WHERE id = $1 FOR UPDATE")
			.bind(id)
			.fetch_optional(&mut *tx)
			.await?;

		if exists.is_none() {
			return Ok(None);
		}

		let mut removed = 0;

		for attempt in 1..=CASCADE_ATTEMPTS {
			removed += sqlx::query("DELETE FROM comment WHERE post_id = $1")
				.bind(id)
				.execute(&mut *tx)
				.await?
				.rows_affected();

			let remaining =
				sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comment WHERE post_id = $1")
					.bind(id)
					.fetch_one(&mut *tx)
					.await?;

			if remaining == 0 {
				break;
			}

			if attempt == CASCADE_ATTEMPTS {
				tx.rollback().await?;

				return Err(Error::PartialDelete {
					post_id: id,
					remaining: remaining.unsigned_abs(),
				});
			}

			tracing::warn!(post_id = id, attempt, remaining, "comments survived cascade sweep, retrying");
		}

		sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(Some(removed))
	}

	async fn posts(&self, filter: Filter, order: Order) -> Result<Vec<Post>, Error> {
		let sql = listing("post", filter, order);
		let query = sqlx::query_as::<_, Post>(&sql);

		let query = match filter {
			Filter::All => query,
			Filter::Status(status) => query.bind(status),
			Filter::Author(author) => query.bind(author.id).bind(author.kind),
		};

		Ok(query.fetch_all(&self.pool).await?)
	}

	async fn comments(&self, filter: Filter, order: Order) -> Result<Vec<Comment>, Error> {
		let sql = listing("comment", filter, order);
		let query = sqlx::query_as::<_, Comment>(&sql);

		let query = match filter {
			Filter::All => query,
			Filter::Status(status) => query.bind(status),
			Filter::Author(author) => query.bind(author.id).bind(author.kind),
		};

		Ok(query.fetch_all(&self.pool).await?)
	}

	async fn comments_on(&self, post_ids: &[i64]) -> Result<Vec<Comment>, Error> {
		let comments = sqlx::query_as::<_, Comment>(
			r#"
				SELECT * FROM comment
				WHERE post_id = ANY($1)
				ORDER BY created_at ASC, id ASC
			"#,
		)
		.bind(post_ids.to_vec())
		.fetch_all(&self.pool)
		.await?;

		Ok(comments)
	}
}

#[axum::async_trait]
impl IdentityStore for PgStore {
	async fn account(&self, kind: PrincipalKind, email: &str) -> Result<Option<Account>, Error> {
		let account =
			sqlx::query_as::<_, Account>("SELECT * FROM account WHERE kind = $1 AND email = $2")
				.bind(kind)
				.bind(email)
				.fetch_optional(&self.pool)
				.await?;

		Ok(account)
	}

	async fn insert_account(&self, account: NewAccount) -> Result<Account, Error> {
		let account = sqlx::query_as::<_, Account>(
			r#"
				INSERT INTO account (kind, name, email, password, salt)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(account.kind)
		.bind(account.name)
		.bind(account.email)
		.bind(account.password)
		.bind(account.salt)
		.fetch_one(&self.pool)
		.await?;

		Ok(account)
	}

	async fn create_session(&self, account_id: i64) -> Result<Uuid, Error> {
		let id = sqlx::query_scalar::<_, Uuid>(
			"INSERT INTO session (id, account_id) VALUES ($1, $2) RETURNING id",
		)
		.bind(Uuid::new_v4())
		.bind(account_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(id)
	}

	async fn resolve_session(&self, id: Uuid) -> Result<Option<Principal>, Error> {
		let principal = sqlx::query_as::<_, Principal>(
			r#"
				SELECT account.id, account.kind, account.name AS display_name
				FROM session
				JOIN account ON account.id = session.account_id
				WHERE session.id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(principal)
	}

	async fn delete_session(&self, id: Uuid) -> Result<(), Error> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

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

	#[sqlx::test]
	#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
	async fn test_delete_post_cascades(pool: PgPool) {
		let store = PgStore::new(pool);

		let post = store
			.insert_post(NewPost {
				title: "Hello".into(),
				content: "World".into(),
				image: None,
				author: student(),
				status: Status::Pending,
			})
			.await
			.unwrap();

		for _ in 0..3 {
			store
				.insert_comment(NewComment {
					post_id: post.id,
					content: "hi".into(),
					author: student(),
					status: Status::Pending,
				})
				.await
				.unwrap()
				.unwrap();
		}

		assert_eq!(store.delete_post(post.id).await.unwrap(), Some(3));
		assert!(store.comments_on(&[post.id]).await.unwrap().is_empty());
	}

	#[sqlx::test]
	#[ignore = "needs a PostgreSQL server at DATABASE_URL"]
	async fn test_approve_is_compare_and_set(pool: PgPool) {
		let store = PgStore::new(pool);

		let post = store
			.insert_post(NewPost {
				title: "Hello".into(),
				content: "World".into(),
				image: None,
				author: student(),
				status: Status::Pending,
			})
			.await
			.unwrap();

		let (first, second) = tokio::join!(
			store.approve(ItemKind::Post, post.id),
			store.approve(ItemKind::Post, post.id)
		);

		let mut outcomes = [first.unwrap(), second.unwrap()];
		outcomes.sort_by_key(|outcome| *outcome == Approval::Approved);

		assert_eq!(outcomes, [Approval::AlreadyApproved, Approval::Approved]);
		assert_eq!(
			store.approve(ItemKind::Comment, post.id).await.unwrap(),
			Approval::Missing
		);
	}
}
