use std::env;
use std::str::FromStr;

use anyhow::{bail, Context};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://diary.db";
pub const DEFAULT_MAX_IN_MEMORY_ENTRIES: usize = 2000;

/// Which repository implementation the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    InMemory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            other => bail!("unknown store backend '{other}' (expected 'sqlite' or 'memory')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub store_backend: StoreBackend,
    pub max_in_memory_entries: usize,
    pub seed_on_startup: bool,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            store_backend: parse_var("MOOD_STORE", StoreBackend::Sqlite)?,
            max_in_memory_entries: parse_var(
                "MAX_IN_MEMORY_ENTRIES",
                DEFAULT_MAX_IN_MEMORY_ENTRIES,
            )?,
            seed_on_startup: parse_var("SEED_ON_STARTUP", true)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            database_max_connections: 5,
            store_backend: StoreBackend::Sqlite,
            max_in_memory_entries: DEFAULT_MAX_IN_MEMORY_ENTRIES,
            seed_on_startup: true,
            host: "0.0.0.0".into(),
            port: 8080,
            frontend_url: "http://localhost:3000".into(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        _ => Ok(default),
    }
}
