// SPDX-License-Identifier: GPL-3.0-or-later

use dotenvy::var;
use std::{sync::OnceLock, time::Duration};

static CONFIG: OnceLock<Config> = OnceLock::new();

/// This LRS server configuration Singleton.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// A structure that provides the current configuration settings, loaded
/// once from the process environment (optionally via a `.env` file) and
/// thereafter treated as immutable.
#[derive(Debug)]
pub struct Config {
    pub(crate) db_server_url: String,
    pub(crate) db_url: String,
    pub(crate) db_max_connections: u32,
    pub(crate) db_acquire_timeout: Duration,

    /// `global.max_statements` — default/maximum number of Statements
    /// returned by a single multi-query GET.
    pub(crate) max_statements: i64,
    /// `global.voided_statement_id` — the reserved Verb IRI that designates
    /// a Statement as a voiding Statement.
    pub(crate) voided_verb_id: String,
    /// `quota.user_max_usage` — per-tenant byte ceiling.
    pub(crate) quota_user_max_usage: i64,
    /// The Canonicalizer's (C7) acceptance-priority list used when a request
    /// carries no `Accept-Language` header.
    pub(crate) canonical_default_languages: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        // best-effort; a missing `.env` is fine, env vars / built-in
        // defaults below still apply.
        let _ = dotenvy::dotenv();

        let db_server_url =
            var("DB_SERVER_URL").unwrap_or_else(|_| "postgres://postgres@localhost:5432".into());
        let db_name = var("DB_NAME").unwrap_or_else(|_| "xapi_lrs".into());
        let db_url = format!("{}/{}", db_server_url, db_name);

        let db_max_connections: u32 = var("DB_MAX_CONNECTIONS")
            .unwrap_or("8".to_string())
            .parse()
            .expect("Failed parsing DB_MAX_CONNECTIONS");
        let db_acquire_timeout = Duration::from_secs(
            var("DB_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or("8".to_string())
                .parse()
                .expect("Failed parsing DB_ACQUIRE_TIMEOUT_SECS"),
        );

        let max_statements: i64 = var("GLOBAL_MAX_STATEMENTS")
            .unwrap_or("50".to_string())
            .parse()
            .expect("Failed parsing GLOBAL_MAX_STATEMENTS");
        assert!(max_statements > 0, "GLOBAL_MAX_STATEMENTS must be > 0");

        let voided_verb_id = var("GLOBAL_VOIDED_STATEMENT_ID")
            .unwrap_or("http://adlnet.gov/expapi/verbs/voided".to_string());

        let quota_user_max_usage: i64 = var("QUOTA_USER_MAX_USAGE")
            .unwrap_or(i64::MAX.to_string())
            .parse()
            .expect("Failed parsing QUOTA_USER_MAX_USAGE");

        let canonical_default_languages: Vec<String> = var("GLOBAL_CANONICAL_DEFAULT_LANGUAGES")
            .unwrap_or_else(|_| "ja-JP,en-US".to_string())
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            db_server_url,
            db_url,
            db_max_connections,
            db_acquire_timeout,
            max_statements,
            voided_verb_id,
            quota_user_max_usage,
            canonical_default_languages,
        }
    }
}

impl Config {
    pub(crate) fn db_url(&self) -> &str {
        &self.db_url
    }
}
