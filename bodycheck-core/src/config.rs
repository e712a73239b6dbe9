//! Listener configuration: host and port, from defaults or HOST/PORT env.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8000;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// HOST and PORT env vars override the defaults; an unparsable PORT is ignored.
    pub fn from_env(default_host: &str, default_port: u16) -> Self {
        Self::from_lookup(default_host, default_port, |key| std::env::var(key).ok())
    }

    /// `from_env` over any variable source.
    pub fn from_lookup<F>(default_host: &str, default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| default_host.to_string());
        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(default_port);
        Self { host, port }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST, Self::DEFAULT_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let env = vars(&[]);
        let config = ServerConfig::from_lookup("127.0.0.1", 8000, |k| env.get(k).cloned());
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "127.0.0.1:8000");
    }

    #[test]
    fn host_and_port_override() {
        let env = vars(&[("HOST", "0.0.0.0"), ("PORT", "9090")]);
        let config = ServerConfig::from_lookup("127.0.0.1", 8000, |k| env.get(k).cloned());
        assert_eq!(config, ServerConfig::new("0.0.0.0", 9090));
    }

    #[test]
    fn unparsable_port_falls_back() {
        let env = vars(&[("PORT", "http")]);
        let config = ServerConfig::from_lookup("localhost", 3000, |k| env.get(k).cloned());
        assert_eq!(config, ServerConfig::new("localhost", 3000));

        let env = vars(&[("PORT", "70000")]);
        let config = ServerConfig::from_lookup("localhost", 3000, |k| env.get(k).cloned());
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn from_env_reads_process_environment() {
        let config = ServerConfig::from_env("127.0.0.1", 8000);
        match std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            Some(port) => assert_eq!(config.port, port),
            None => assert_eq!(config.port, 8000),
        }
    }
}
