use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

/// HTTP server configuration loaded from environment variables.
///
/// Graph and embedding settings live in [`aimkg_rs::AimkgConfig`]; this only
/// covers what the query API adds on top.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server. Env: `BIND_ADDR`, default `0.0.0.0:9089`.
    pub bind_addr: SocketAddr,
    /// How long a loaded embedding index is served before being re-read.
    /// Env: `INDEX_CACHE_TTL_SECS`, default 300.
    pub index_cache_ttl: Duration,
}

impl ServerConfig {
    /// # Errors
    /// Returns an error if `BIND_ADDR` is set but not a valid socket address,
    /// or if numeric env vars cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9089".to_string());
        let bind_addr = SocketAddr::from_str(&bind_addr)
            .map_err(|e| anyhow::anyhow!("Invalid BIND_ADDR '{}': {}", bind_addr, e))?;

        let ttl = parse_env_u64("INDEX_CACHE_TTL_SECS", 300)?;

        Ok(ServerConfig {
            bind_addr,
            index_cache_ttl: Duration::from_secs(ttl),
        })
    }
}

/// Inputs of one batch ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Source dump files, ingested in order. Env: `SOURCE_DUMPS`, comma-separated, required.
    pub source_dumps: Vec<PathBuf>,
    /// Optional task taxonomy for enrichment. Env: `TASK_TAXONOMY`.
    pub task_taxonomy: Option<PathBuf>,
}

impl IngestConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let dumps = std::env::var("SOURCE_DUMPS")
            .map_err(|_| anyhow::anyhow!("SOURCE_DUMPS must list at least one source dump"))?;
        let source_dumps: Vec<PathBuf> = dumps
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        if source_dumps.is_empty() {
            anyhow::bail!("SOURCE_DUMPS must list at least one source dump");
        }

        let task_taxonomy = std::env::var("TASK_TAXONOMY")
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(IngestConfig {
            source_dumps,
            task_taxonomy,
        })
    }
}

fn parse_env_u64(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(val) => val
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 4] = ["BIND_ADDR", "INDEX_CACHE_TTL_SECS", "SOURCE_DUMPS", "TASK_TAXONOMY"];

    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> =
            VARS.iter().map(|k| (*k, env::var(k).ok())).collect();
        for k in VARS {
            env::remove_var(k);
        }
        for (k, v) in vars {
            env::set_var(k, v);
        }
        f();
        for (k, v) in originals {
            match v {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }
    }

    #[test]
    fn server_defaults() {
        with_env(&[], || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.bind_addr.port(), 9089);
            assert_eq!(config.index_cache_ttl, Duration::from_secs(300));
        });
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        with_env(&[("BIND_ADDR", "not-an-addr")], || {
            assert!(ServerConfig::from_env().is_err());
        });
    }

    #[test]
    fn source_dumps_are_split_and_trimmed() {
        with_env(&[("SOURCE_DUMPS", "a.json, b.json,,"), ("TASK_TAXONOMY", " ")], || {
            let config = IngestConfig::from_env().unwrap();
            assert_eq!(
                config.source_dumps,
                vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
            );
            assert!(config.task_taxonomy.is_none());
        });
    }

    #[test]
    fn source_dumps_are_required() {
        with_env(&[], || assert!(IngestConfig::from_env().is_err()));
        with_env(&[("SOURCE_DUMPS", " , ")], || assert!(IngestConfig::from_env().is_err()));
    }
}
