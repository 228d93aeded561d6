pub struct Env {
    pub jwt_secret: String,
    pub database_url: String,
    pub redis_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    /// Seconds a resolved identity stays in Redis.
    pub identity_cache_ttl: u64,
}

fn required(key: &str) -> String {
    std::env::var(key)
        .unwrap_or_else(|_| panic!("{key} must be set in .env file or environment variable"))
}

fn or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: &str) -> T {
    or_default(key, default)
        .parse::<T>()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

impl Env {
    fn new() -> Self {
        Env {
            jwt_secret: required("SECRET_KEY"),
            database_url: required("DATABASE_URL"),
            redis_url: required("REDIS_URL"),
            frontend_url: or_default("FRONTEND_URL", "http://localhost:5173"),
            ip: or_default("IP", "127.0.0.1"),
            port: parsed("PORT", "8080"),
            identity_cache_ttl: parsed("IDENTITY_CACHE_TTL", "300"),
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
