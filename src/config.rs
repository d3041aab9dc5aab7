use envconfig::Envconfig;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL", default = "sqlite://blog.db?mode=rwc")]
    pub database_url: String,

    #[envconfig(from = "BLOG_HTTP_PORT", default = "3000")]
    pub http_port: u16,

    #[envconfig(from = "BLOG_MAX_DB_CONNECTIONS", default = "5")]
    pub max_db_connections: u32,

    #[envconfig(from = "BLOG_MEDIA_ROOT", default = "./media")]
    pub media_root: String,

    #[envconfig(from = "BLOG_MEDIA_URL", default = "/media")]
    pub media_url: String,

    // 0 disables the index cache
    #[envconfig(from = "BLOG_INDEX_CACHE_SECONDS", default = "20")]
    pub index_cache_seconds: u64,

    #[envconfig(from = "BLOG_SESSION_TTL_SECONDS", default = "1209600")] // 14 days
    pub session_ttl_seconds: u64,

    #[envconfig(from = "BLOG_SITE_NAME", default = "Yatube")]
    pub site_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Self::init_from_env()
    }
}
