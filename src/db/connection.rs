use anyhow::{Context, Result};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use postgres_native_tls::MakeTlsConnector;
use serde::{Deserialize, Serialize};
use tokio_postgres::NoTls;
use tracing::debug;

/// Where and how to reach PostgreSQL. Lives under `[database]` in the
/// config file; the password never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub ssl_mode: SslMode,
    /// Skip certificate verification. Only honoured for `Prefer`/`Require`.
    pub accept_invalid_certs: bool,
    /// PEM file with one or more CA certificates. System roots otherwise.
    pub ca_cert_path: Option<String>,
    pub pool_size: usize,
}

/// Mirrors libpq's `sslmode`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    fn as_libpq(self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }

    fn verifies_certificates(self) -> bool {
        matches!(self, SslMode::VerifyCa | SslMode::VerifyFull)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::from("localhost"),
            port: 5432,
            database: String::from("postgres"),
            username: String::from("postgres"),
            password: String::new(),
            ssl_mode: SslMode::default(),
            accept_invalid_certs: false,
            ca_cert_path: None,
            pool_size: 8,
        }
    }
}

impl ConnectionConfig {
    /// libpq key=value string. Every user-supplied value is quoted.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={} connect_timeout=10",
            quote_conn_value(&self.host),
            self.port,
            quote_conn_value(&self.database),
            quote_conn_value(&self.username),
            quote_conn_value(&self.password),
            self.ssl_mode.as_libpq()
        )
    }

    pub fn display_string(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }

    fn pg_config(&self) -> Result<tokio_postgres::Config> {
        self.connection_string()
            .parse()
            .context("Invalid connection settings")
    }
}

/// Build a connection pool. No connection is opened until the first
/// checkout.
pub fn build_pool(config: &ConnectionConfig) -> Result<Pool> {
    let pg_config = config.pg_config()?;
    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let manager = match config.ssl_mode {
        SslMode::Disable => Manager::from_config(pg_config, NoTls, manager_config),
        mode => Manager::from_config(
            pg_config,
            build_tls_connector(config, mode.verifies_certificates())?,
            manager_config,
        ),
    };
    debug!(server = %config.display_string(), size = config.pool_size, "building connection pool");
    Pool::builder(manager)
        .max_size(config.pool_size.max(1))
        .build()
        .context("Failed to build connection pool")
}

fn build_tls_connector(config: &ConnectionConfig, strict_verify: bool) -> Result<MakeTlsConnector> {
    let mut builder = native_tls::TlsConnector::builder();

    if config.accept_invalid_certs && !strict_verify {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    } else if let Some(ca_path) = &config.ca_cert_path {
        let pem = std::fs::read_to_string(ca_path)
            .with_context(|| format!("Failed to read CA certificate file: {}", ca_path))?;
        for block in pem_blocks(&pem) {
            let cert = native_tls::Certificate::from_pem(block.as_bytes())
                .with_context(|| format!("Invalid certificate in {}", ca_path))?;
            builder.add_root_certificate(cert);
        }
    }

    let connector = builder.build().context("Failed to build TLS connector")?;
    Ok(MakeTlsConnector::new(connector))
}

/// Split a PEM bundle into one string per certificate.
fn pem_blocks(pem: &str) -> Vec<String> {
    const BEGIN: &str = "-----BEGIN CERTIFICATE-----";
    const END: &str = "-----END CERTIFICATE-----";
    pem.split_inclusive(END)
        .filter(|block| block.ends_with(END))
        .filter_map(|block| block.find(BEGIN).map(|start| block[start..].to_string()))
        .collect()
}

/// Quote a value for a libpq key=value string: single quotes, with
/// backslashes and quotes escaped.
fn quote_conn_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}
