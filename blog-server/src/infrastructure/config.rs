use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Without a database URL the server keeps everything in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_secs: i64,
    pub cors_origins: Vec<String>,
    pub feed_cache_ttl_secs: u64,
    pub admin_usernames: Vec<String>,
}

fn parse_var<T>(name: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {}: {}", name, e))
}

fn list_var(name: &str, default: &str) -> Vec<String> {
    std::env::var(name)
        .unwrap_or_else(|_| default.into())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = parse_var("PORT", "8080")?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let jwt_ttl_secs = parse_var("JWT_TTL_SECS", "3600")?;
        let cors_origins = list_var("CORS_ORIGINS", "*");
        let feed_cache_ttl_secs = parse_var("FEED_CACHE_TTL_SECS", "20")?;
        let admin_usernames = list_var("ADMIN_USERNAMES", "");

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            jwt_ttl_secs,
            cors_origins,
            feed_cache_ttl_secs,
            admin_usernames,
        })
    }

    pub fn feed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_cache_ttl_secs)
    }
}
