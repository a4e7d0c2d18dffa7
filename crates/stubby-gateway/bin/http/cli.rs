use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "STUBBY_LISTEN_ADDR";
pub const ENVIRONMENT_ENV: &str = "STUBBY_ENV";
pub const STORAGE_BACKEND_ENV: &str = "STUBBY_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "STUBBY_DATABASE_URL";
pub const ALIAS_LENGTH_ENV: &str = "STUBBY_ALIAS_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "STUBBY_MAX_ATTEMPTS";
pub const REQUEST_TIMEOUT_ENV: &str = "STUBBY_REQUEST_TIMEOUT_MS";
pub const PUBLIC_BASE_URL_ENV: &str = "STUBBY_PUBLIC_BASE_URL";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://stubby.db";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080";

/// Deployment environment; selects the log format and default level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Local,
    Dev,
    Prod,
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Dev => write!(f, "dev"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "stubby", about = "URL shortener HTTP server")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(long, env = ENVIRONMENT_ENV, value_enum, default_value_t = Environment::Local)]
    pub env: Environment,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(long, env = ALIAS_LENGTH_ENV, default_value_t = stubby_generator::random::DEFAULT_LENGTH)]
    pub alias_length: usize,

    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = stubby_shortener::DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    #[arg(long, env = REQUEST_TIMEOUT_ENV, default_value_t = 3000)]
    pub request_timeout_ms: u64,

    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,
}
