//! CLI arguments and server configuration defaults.

use clap::Parser;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";
pub const UPLOAD_FIELD_NAME: &str = "files";
pub const DEFAULT_UPLOAD_WINDOW_SECS: u64 = 15 * 60;
pub const DEFAULT_UPLOAD_MAX_REQUESTS: u32 = 10;
pub const DEFAULT_LIST_WINDOW_SECS: u64 = 60;
pub const DEFAULT_LIST_MAX_REQUESTS: u32 = 30;
pub const LIMITER_PRUNE_INTERVAL_SECS: u64 = 300;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "updrop", version, about = "Updrop folder upload server")]
pub struct Args {
    #[arg(
        short = 'u',
        long,
        env = "UPDROP_UPLOAD_DIR",
        default_value = DEFAULT_UPLOAD_DIR,
        help = "Directory uploaded files are stored under"
    )]
    pub upload_dir: String,
    #[arg(
        short = 'b',
        long,
        env = "UPDROP_BIND",
        default_value = "0.0.0.0",
        help = "Bind address for HTTP"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "UPDROP_CORS_ORIGINS",
        help = "Comma separated CORS origins"
    )]
    pub cors_origins: Option<String>,
    #[arg(
        long,
        env = "UPDROP_UPLOAD_WINDOW_SECS",
        default_value_t = DEFAULT_UPLOAD_WINDOW_SECS,
        help = "Upload rate limit window in seconds"
    )]
    pub upload_window_secs: u64,
    #[arg(
        long,
        env = "UPDROP_UPLOAD_MAX_REQUESTS",
        default_value_t = DEFAULT_UPLOAD_MAX_REQUESTS,
        help = "Max upload requests per client per window"
    )]
    pub upload_max_requests: u32,
    #[arg(
        long,
        env = "UPDROP_LIST_WINDOW_SECS",
        default_value_t = DEFAULT_LIST_WINDOW_SECS,
        help = "Listing rate limit window in seconds"
    )]
    pub list_window_secs: u64,
    #[arg(
        long,
        env = "UPDROP_LIST_MAX_REQUESTS",
        default_value_t = DEFAULT_LIST_MAX_REQUESTS,
        help = "Max listing requests per client per window"
    )]
    pub list_max_requests: u32,
}
