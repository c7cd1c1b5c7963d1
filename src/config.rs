//! Runtime configuration, read from the environment (and `.env`, if present).

use std::{env, net::IpAddr, str::FromStr};

use tracing::level_filters::LevelFilter;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} is not valid: {value:?}")]
	Invalid { name: &'static str, value: String },
	#[error("{0} must be set together with the other BOOTSTRAP_ADMIN_* variables")]
	PartialBootstrap(&'static str),
}

/// An admin account ensured at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
	pub email: String,
	pub password: String,
	pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// No database means the in-memory store.
	pub database_url: Option<String>,
	pub cors_origin: Option<String>,
	pub log_level: LevelFilter,
	/// Whether spans and metrics are exported over OTLP.
	pub otlp: bool,
	/// Requests replenished per second, per peer.
	pub rate_limit_per_second: u64,
	pub rate_limit_burst: u32,
	pub bootstrap_admin: Option<BootstrapAdmin>,
}

fn var(name: &'static str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
	match var(name) {
		Some(value) => value.trim().parse().map_err(|_| Error::Invalid { name, value }),
		None => Ok(default),
	}
}

fn positive<T: FromStr + Default + PartialEq + ToString>(
	name: &'static str,
	default: T,
) -> Result<T, Error> {
	let value = parsed(name, default)?;

	if value == T::default() {
		return Err(Error::Invalid {
			name,
			value: value.to_string(),
		});
	}

	Ok(value)
}

impl Config {
	/// Reads the configuration, loading `.env` first.
	pub fn from_env() -> Result<Self, Error> {
		dotenvy::dotenv().ok();

		let bootstrap_admin = match (
			var("BOOTSTRAP_ADMIN_EMAIL"),
			var("BOOTSTRAP_ADMIN_PASSWORD"),
		) {
			(Some(email), Some(password)) => Some(BootstrapAdmin {
				email,
				password,
				name: var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
			}),
			(None, None) => None,
			(Some(_), None) => return Err(Error::PartialBootstrap("BOOTSTRAP_ADMIN_PASSWORD")),
			(None, Some(_)) => return Err(Error::PartialBootstrap("BOOTSTRAP_ADMIN_EMAIL")),
		};

		Ok(Self {
			host: parsed("HOST", IpAddr::from([127, 0, 0, 1]))?,
			port: parsed("PORT", 3000)?,
			database_url: var("DATABASE_URL"),
			cors_origin: var("CORS_ORIGIN"),
			log_level: parsed("LOG_LEVEL", LevelFilter::INFO)?,
			otlp: var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some(),
			rate_limit_per_second: positive("RATE_LIMIT_PER_SECOND", 10)?,
			rate_limit_burst: positive("RATE_LIMIT_BURST", 50)?,
			bootstrap_admin,
		})
	}
}
