use anyhow::{Context, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;

/// PostgreSQL connection parameters for the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub ssl_mode: SslMode,
    /// Skip certificate verification. Only honoured for `Prefer`/`Require`.
    pub accept_invalid_certs: bool,
    /// PEM file with extra root certificates.
    pub ca_cert_path: Option<String>,
    pub pool_size: usize,
}

/// Subset of libpq's sslmode that tokio-postgres understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => anyhow::bail!("Unsupported sslmode: {}", other),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 5432,
            database: String::from("openads"),
            user: String::from("postgres"),
            password: String::new(),
            ssl_mode: SslMode::default(),
            accept_invalid_certs: false,
            ca_cert_path: None,
            pool_size: 4,
        }
    }
}

impl ConnectionConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={} connect_timeout=10",
            quote_conn_value(&self.host),
            self.port,
            quote_conn_value(&self.database),
            quote_conn_value(&self.user),
            quote_conn_value(&self.password),
            self.ssl_mode.as_str()
        )
    }

    pub fn display_string(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

/// Build a connection pool. Connections are opened lazily on first use.
pub fn build_pool(config: &ConnectionConfig) -> Result<Pool> {
    let pg_config: tokio_postgres::Config = config
        .connection_string()
        .parse()
        .context("Invalid connection parameters")?;
    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };

    let manager = match config.ssl_mode {
        SslMode::Disable => Manager::from_config(pg_config, NoTls, manager_config),
        SslMode::Prefer | SslMode::Require => {
            Manager::from_config(pg_config, build_tls_connector(config)?, manager_config)
        }
    };

    tracing::debug!(target = %config.display_string(), size = config.pool_size, "building connection pool");
    Pool::builder(manager)
        .max_size(config.pool_size.max(1))
        .build()
        .context("Failed to build connection pool")
}

fn build_tls_connector(config: &ConnectionConfig) -> Result<MakeTlsConnector> {
    let mut builder = native_tls::TlsConnector::builder();

    if config.accept_invalid_certs {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    } else if let Some(ca_path) = &config.ca_cert_path {
        let pem = std::fs::read(ca_path)
            .with_context(|| format!("Failed to read CA certificate file: {}", ca_path))?;
        let cert = native_tls::Certificate::from_pem(&pem)
            .context("Failed to parse CA certificate")?;
        builder.add_root_certificate(cert);
    }

    let connector = builder.build().context("Failed to build TLS connector")?;
    Ok(MakeTlsConnector::new(connector))
}

/// Quote a value for a libpq key=value connection string.
fn quote_conn_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_quotes_values() {
        let config = ConnectionConfig {
            password: "it's\\secret".to_string(),
            ssl_mode: SslMode::Disable,
            ..ConnectionConfig::default()
        };
        assert_eq!(
            config.connection_string(),
            "host='localhost' port=5432 dbname='openads' user='postgres' \
             password='it\\'s\\\\secret' sslmode=disable connect_timeout=10"
        );
    }

    #[test]
    fn test_password_never_serialized() {
        let config = ConnectionConfig {
            password: "hunter2".to_string(),
            ..ConnectionConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("hunter2"));
        let back: ConnectionConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.password, "");
        assert_eq!(back.host, "localhost");
    }

    #[test]
    fn test_ssl_mode_from_str() {
        assert_eq!("REQUIRE".parse::<SslMode>().unwrap(), SslMode::Require);
        assert_eq!("disable".parse::<SslMode>().unwrap(), SslMode::Disable);
        assert!("verify-full".parse::<SslMode>().is_err());
    }

    #[test]
    fn test_display_string() {
        assert_eq!(
            ConnectionConfig::default().display_string(),
            "postgres@localhost:5432/openads"
        );
    }

    #[tokio::test]
    async fn test_pool_builds_without_connecting() {
        let config = ConnectionConfig {
            ssl_mode: SslMode::Disable,
            ..ConnectionConfig::default()
        };
        let pool = build_pool(&config).unwrap();
        assert_eq!(pool.status().max_size, 4);
    }
}
