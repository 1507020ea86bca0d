use std::env;

/// Vote score at which a post summary is written to the cache.
pub const DEFAULT_CACHE_AFTER_UPVOTES: i64 = 1;
/// Posts shown on the first page of a subreddit.
pub const DEFAULT_INFINITE_SCROLL_PAGINATION_RESULTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub storage: StorageBackend,
    pub cache: CacheBackend,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub cache_after_upvotes: i64,
    pub infinite_scroll_pagination_results: u32,
    /// Connection attempts for Postgres and Redis at startup.
    pub startup_retries: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    InMemory,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheBackend {
    Redis { url: String, max_connections: usize },
    InMemory,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let storage = match env::var("DATABASE_URL") {
            Ok(database_url) if !database_url.is_empty() => StorageBackend::Postgres { database_url },
            _ => StorageBackend::InMemory,
        };

        let cache = match env::var("REDIS_URL") {
            Ok(url) if !url.is_empty() => CacheBackend::Redis {
                url,
                max_connections: parse_var("REDIS_MAX_CONNECTIONS", 16),
            },
            _ => CacheBackend::InMemory,
        };

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("PORT")
                .or_else(|_| env::var("SERVER_PORT"))
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            storage,
            cache,
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
            jwt_expiry_hours: parse_var("JWT_EXPIRY_HOURS", 24 * 7),
            cache_after_upvotes: parse_var("CACHE_AFTER_UPVOTES", DEFAULT_CACHE_AFTER_UPVOTES),
            infinite_scroll_pagination_results: parse_var(
                "INFINITE_SCROLL_PAGINATION_RESULTS",
                DEFAULT_INFINITE_SCROLL_PAGINATION_RESULTS,
            ),
            startup_retries: parse_var("STARTUP_RETRIES", 5),
        }
    }

    /// Config with in-memory storage and cache, used by tests and local runs.
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            storage: StorageBackend::InMemory,
            cache: CacheBackend::InMemory,
            jwt_secret: jwt_secret.into(),
            jwt_expiry_hours: 1,
            cache_after_upvotes: DEFAULT_CACHE_AFTER_UPVOTES,
            infinite_scroll_pagination_results: DEFAULT_INFINITE_SCROLL_PAGINATION_RESULTS,
            startup_retries: 1,
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_defaults() {
        let config = AppConfig::in_memory("secret");
        assert_eq!(config.storage, StorageBackend::InMemory);
        assert_eq!(config.cache, CacheBackend::InMemory);
        assert_eq!(config.cache_after_upvotes, 1);
        assert_eq!(config.infinite_scroll_pagination_results, 2);
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        std::env::set_var("LINK_AGGREGATOR_TEST_PARSE", "not-a-number");
        assert_eq!(parse_var("LINK_AGGREGATOR_TEST_PARSE", 7u32), 7);
        std::env::remove_var("LINK_AGGREGATOR_TEST_PARSE");
    }
}
