//! Layered configuration: CLI flags override environment variables (loaded
//! from `.env` via `dotenvy`) override built-in defaults. `clap`'s `env`
//! attribute gives us that precedence for free; `Settings` adds the handful
//! of derived values (default database path) that don't come from a single
//! source.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Resolved configuration, independent of how each field was sourced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database_path: PathBuf,
    /// Accepted for forward compatibility with a networked backend; the
    /// only backend this crate implements is the local SQLite file named by
    /// `database_path`. See DESIGN.md for why Postgres support was dropped.
    pub database_url: Option<String>,
    pub cache_ttl_secs: i64,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub embedder_base_url: Option<String>,
    pub embedder_api_key: Option<String>,
    pub embedder_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            database_url: None,
            cache_ttl_secs: 3600,
            host: "127.0.0.1".to_string(),
            port: 8000,
            debug: false,
            embedder_base_url: None,
            embedder_api_key: None,
            embedder_model: "text-embedding-3-small".to_string(),
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("curio")
        .join("curio.db")
}

/// CLI-overridable options, merged onto `Settings` defaults/env values.
/// Every field is optional here; `None` means "use whatever `Settings`
/// already resolved from the environment or default".
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Path to the SQLite database file.
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Connection string for a networked backend, if one is ever wired up.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Seconds a hybrid search result page stays cached.
    #[arg(long, env = "CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<i64>,

    #[arg(long, env = "CURIO_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "CURIO_PORT")]
    pub port: Option<u16>,

    /// Enables permissive CORS and verbose logging.
    #[arg(long, env = "CURIO_DEBUG")]
    pub debug: bool,

    /// Base URL of an OpenAI-compatible embeddings endpoint.
    #[arg(long, env = "EMBEDDER_BASE_URL")]
    pub embedder_base_url: Option<String>,

    #[arg(long, env = "EMBEDDER_API_KEY")]
    pub embedder_api_key: Option<String>,

    #[arg(long, env = "EMBEDDER_MODEL")]
    pub embedder_model: Option<String>,
}

impl Settings {
    pub fn load(args: &ConfigArgs) -> Self {
        let mut settings = Settings::default();
        if let Some(v) = &args.database_path {
            settings.database_path = v.clone();
        }
        if let Some(v) = &args.database_url {
            settings.database_url = Some(v.clone());
        }
        if let Some(v) = args.cache_ttl_secs {
            settings.cache_ttl_secs = v;
        }
        if let Some(v) = &args.host {
            settings.host = v.clone();
        }
        if let Some(v) = args.port {
            settings.port = v;
        }
        if args.debug {
            settings.debug = true;
        }
        if let Some(v) = &args.embedder_base_url {
            settings.embedder_base_url = Some(v.clone());
        }
        if let Some(v) = &args.embedder_api_key {
            settings.embedder_api_key = Some(v.clone());
        }
        if let Some(v) = &args.embedder_model {
            settings.embedder_model = v.clone();
        }
        settings
    }

    pub fn ensure_database_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> ConfigArgs {
        ConfigArgs {
            database_path: None,
            database_url: None,
            cache_ttl_secs: None,
            host: None,
            port: None,
            debug: false,
            embedder_base_url: None,
            embedder_api_key: None,
            embedder_model: None,
        }
    }

    #[test]
    fn defaults_used_when_no_args_given() {
        let settings = Settings::load(&empty_args());
        assert_eq!(settings.cache_ttl_secs, 3600);
        assert_eq!(settings.port, 8080);
    }

    #[test]
    fn explicit_args_override_defaults() {
        let mut args = empty_args();
        args.port = Some(9000);
        args.cache_ttl_secs = Some(60);
        let settings = Settings::load(&args);
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.cache_ttl_secs, 60);
    }
}
