use std::sync::Arc;

use schemars::JsonSchema;
use serde::Serialize;
use uuid::Uuid;

use crate::{
	model::{AuthorRef, PrincipalKind, Status},
	store::{self, IdentityStore},
};

/// The authenticated caller of a request.
///
/// This is a snapshot taken when the request is resolved; the author fields
/// of any content it creates are copied from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Principal {
	pub id: i64,
	pub kind: PrincipalKind,
	pub display_name: String,
}

impl Principal {
	pub fn is_admin(&self) -> bool {
		self.kind == PrincipalKind::Admin
	}

	pub fn author(&self) -> AuthorRef {
		AuthorRef {
			id: self.id,
			kind: self.kind,
		}
	}

	/// Whether this principal authored the item owned by `author`.
	pub fn owns(&self, author: AuthorRef) -> bool {
		self.author() == author
	}

	/// Admins publish directly, everything else waits for review.
	pub fn initial_status(&self) -> Status {
		match self.kind {
			PrincipalKind::Admin => Status::Approved,
			PrincipalKind::Student => Status::Pending,
		}
	}
}

/// Resolves session ids into principals.
///
/// Holds no state of its own; every call goes to the session store.
#[derive(Clone)]
pub struct Identity {
	store: Arc<dyn IdentityStore>,
}

impl Identity {
	pub fn new(store: Arc<dyn IdentityStore>) -> Self {
		Self { store }
	}

	/// Returns `None` when the session is unknown, i.e. the caller is unauthenticated.
	pub async fn resolve(&self, session_id: Uuid) -> Result<Option<Principal>, store::Error> {
		self.store.resolve_session(session_id).await
	}

	pub fn store(&self) -> &dyn IdentityStore {
		self.store.as_ref()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn principal(id: i64, kind: PrincipalKind) -> Principal {
		Principal {
			id,
			kind,
			display_name: "someone".into(),
		}
	}

	#[test]
	fn test_ownership_compares_kind_and_id() {
		let student = principal(7, PrincipalKind::Student);

		assert!(student.owns(AuthorRef {
			id: 7,
			kind: PrincipalKind::Student
		}));
		assert!(!student.owns(AuthorRef {
			id: 7,
			kind: PrincipalKind::Admin
		}));
		assert!(!student.owns(AuthorRef {
			id: 8,
			kind: PrincipalKind::Student
		}));
	}

	#[test]
	fn test_initial_status() {
		assert_eq!(
			principal(1, PrincipalKind::Admin).initial_status(),
			Status::Approved
		);
		assert_eq!(
			principal(1, PrincipalKind::Student).initial_status(),
			Status::Pending
		);
	}
}
