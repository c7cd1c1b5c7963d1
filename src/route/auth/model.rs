use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{identity::Principal, model::PrincipalKind};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	/// Which kind of account to log in to. Admins and students have separate accounts.
	#[serde(default)]
	pub kind: PrincipalKind,
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Serialize, JsonSchema)]
pub struct LoginResponse {
	pub success: bool,
	pub message: String,
	/// The principal the session belongs to.
	pub principal: Principal,
}

#[derive(Serialize, JsonSchema)]
pub struct Me {
	pub success: bool,
	pub principal: Principal,
}

#[derive(Serialize, JsonSchema)]
pub struct SessionStatus {
	/// Always `true`, even for anonymous callers.
	pub success: bool,
	pub logged_in: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub principal: Option<Principal>,
}
