use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub container: String,
    pub public_base_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Image upload API backed by local blob storage")]
pub struct Args {
    /// Host to bind to (overrides IMAGE_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IMAGE_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where object payloads are stored (overrides IMAGE_STORE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides IMAGE_STORE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Container uploads land in (overrides IMAGE_STORE_CONTAINER)
    #[arg(long)]
    pub container: Option<String>,

    /// Base URL returned in upload responses (overrides IMAGE_STORE_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("IMAGE_STORE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("IMAGE_STORE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing IMAGE_STORE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading IMAGE_STORE_PORT"),
        };
        let env_storage =
            env::var("IMAGE_STORE_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = env::var("IMAGE_STORE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/image_store.db".into());
        let env_container = env::var("IMAGE_STORE_CONTAINER").unwrap_or_else(|_| "profilepics".into());
        let env_base_url = env::var("IMAGE_STORE_PUBLIC_BASE_URL").ok();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            container: args.container.unwrap_or(env_container),
            public_base_url: args.public_base_url.or(env_base_url),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL under which stored objects are advertised.
    ///
    /// Falls back to the bind address, substituting loopback for wildcard
    /// hosts so the returned URLs are actually resolvable from a browser.
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = match self.host.as_str() {
                    "0.0.0.0" | "::" => "127.0.0.1",
                    other => other,
                };
                format!("http://{}:{}", host, self.port)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(host: &str, base_url: Option<&str>) -> AppConfig {
        AppConfig {
            host: host.into(),
            port: 3000,
            storage_dir: "./data/objects".into(),
            database_url: "sqlite::memory:".into(),
            container: "profilepics".into(),
            public_base_url: base_url.map(str::to_string),
        }
    }

    #[test]
    fn explicit_base_url_wins_and_is_trimmed() {
        let cfg = config_with("0.0.0.0", Some("https://img.example.com/"));
        assert_eq!(cfg.public_base_url(), "https://img.example.com");
    }

    #[test]
    fn wildcard_host_falls_back_to_loopback() {
        let cfg = config_with("0.0.0.0", None);
        assert_eq!(cfg.public_base_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn concrete_host_is_kept() {
        let cfg = config_with("img.internal", None);
        assert_eq!(cfg.public_base_url(), "http://img.internal:3000");
    }
}
