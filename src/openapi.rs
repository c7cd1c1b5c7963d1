use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error::ErrorResponse, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const MODERATION: &str = "Moderation";
}

fn described(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("College Portal API")
		.summary("Posts, comments and their moderation")
		.description(include_str!("../README.md"))
		.tag(described(tag::AUTH, "Logging in and out"))
		.tag(described(tag::POST, "Posts and the feeds built from them"))
		.tag(described(tag::COMMENT, "Comments on posts"))
		.tag(described(
			tag::MODERATION,
			"Approving, editing and deleting content",
		))
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A session cookie, set by logging in".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<ErrorResponse>, _>(|res| {
			res.description("The request failed; `message` says why.")
				.example(ErrorResponse::new("Post not found, refresh and try again"))
		})
}
