use std::path::PathBuf;

use blog_core::model::THUMBNAIL_BUCKET;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    pub storage_dir: PathBuf,
    pub storage_buckets: Vec<String>,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            lookup("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let token_ttl_secs = lookup("TOKEN_TTL_SECS")
            .unwrap_or_else(|| "3600".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_SECS: {}", e))?;
        let cors_origins = split_list(&lookup("CORS_ORIGINS").unwrap_or_else(|| "*".into()));
        let storage_dir = lookup("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./storage"));
        let storage_buckets =
            split_list(&lookup("STORAGE_BUCKETS").unwrap_or_else(|| THUMBNAIL_BUCKET.into()));
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid MAX_UPLOAD_BYTES: {}", e))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            token_ttl_secs,
            cors_origins,
            storage_dir,
            storage_buckets,
            max_upload_bytes,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
