use std::env;
use std::path::PathBuf;

pub struct Config {
    pub portal_url: String,
    pub site_root: String,
    pub page_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_pages: Option<u32>,
    pub output_path: PathBuf,
    pub documents_dir: PathBuf,
    pub database_url: Option<String>,
    pub drive: DriveConfig,
}

pub struct DriveConfig {
    pub token_cache: PathBuf,
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            portal_url: var_or("PORTAL_URL", "https://www.escnj.us/members"),
            site_root: var_or("SITE_ROOT", "https://www.escnj.us"),
            page_delay_ms: var_or("PAGE_DELAY_MS", "500").parse()?,
            request_timeout_secs: var_or("REQUEST_TIMEOUT_SECS", "60").parse()?,
            max_pages: optional("MAX_PAGES").map(|v| v.parse()).transpose()?,
            output_path: var_or("OUTPUT_PATH", "contracts.jsonl").into(),
            documents_dir: var_or("DOCUMENTS_DIR", "documents").into(),
            database_url: optional("DATABASE_URL"),
            drive: DriveConfig {
                token_cache: var_or("DRIVE_TOKEN_CACHE", "token_drive_v3.json").into(),
                access_token: optional("DRIVE_ACCESS_TOKEN"),
                client_id: optional("DRIVE_CLIENT_ID"),
                client_secret: optional("DRIVE_CLIENT_SECRET"),
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
