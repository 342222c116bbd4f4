use clap::{Parser, builder::BoolishValueParser};
use docx_api::ApiServerConfig;
use docx_core::services::{DocumentCacheConfig, ExportQueueConfig};
use docx_mcp::server::McpHttpServerConfig;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DB_NAMESPACE: &str = "docx";
const DEFAULT_DB_NAME: &str = "documents";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";
const DEFAULT_API_ADDR: &str = "127.0.0.1:4010";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_EXPORT_WORKERS: usize = 2;
const DEFAULT_EXPORT_QUEUE_DEPTH: usize = 64;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "docx-mcpd", version, about = "Docx MCP and REST daemon.")]
#[allow(clippy::struct_excessive_bools)]
struct CliArgs {
    #[arg(long, env = "DOCX_DB_NAMESPACE", default_value = DEFAULT_DB_NAMESPACE)]
    db_namespace: String,

    #[arg(long, env = "DOCX_DB_NAME", default_value = DEFAULT_DB_NAME)]
    db_name: String,

    #[arg(
        long,
        env = "DOCX_DB_IN_MEMORY",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    db_in_memory: bool,

    #[arg(long, env = "DOCX_DB_URI")]
    db_uri: Option<String>,

    #[arg(long, env = "DOCX_DB_USERNAME")]
    db_username: Option<String>,

    #[arg(long, env = "DOCX_DB_PASSWORD")]
    db_password: Option<String>,

    /// Directory for document, version and export blobs.
    #[arg(long, env = "DOCX_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[arg(
        long = "stdio",
        env = "DOCX_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "DOCX_MCP_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_serve: bool,

    #[arg(long, env = "DOCX_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(
        long,
        env = "DOCX_API_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    api_serve: bool,

    #[arg(long, env = "DOCX_API_ADDR", default_value = DEFAULT_API_ADDR)]
    api_addr: SocketAddr,

    #[arg(long, env = "DOCX_API_KEY")]
    api_key: Option<String>,

    #[arg(
        long,
        env = "DOCX_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(long, env = "DOCX_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    #[arg(
        long,
        env = "DOCX_MAX_DOCUMENT_BYTES",
        default_value_t = DEFAULT_MAX_DOCUMENT_BYTES
    )]
    max_document_bytes: usize,

    /// Idle time before an open document is evicted. Zero disables eviction.
    #[arg(long, env = "DOCX_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    cache_ttl_secs: u64,

    #[arg(long, env = "DOCX_CACHE_SWEEP_SECS")]
    cache_sweep_secs: Option<u64>,

    #[arg(long, env = "DOCX_CACHE_MAX")]
    cache_max_entries: Option<usize>,

    #[arg(long, env = "DOCX_EXPORT_WORKERS", default_value_t = DEFAULT_EXPORT_WORKERS)]
    export_workers: usize,

    #[arg(
        long,
        env = "DOCX_EXPORT_QUEUE_DEPTH",
        default_value_t = DEFAULT_EXPORT_QUEUE_DEPTH
    )]
    export_queue_depth: usize,

    /// `tracing` filter directives, e.g. `info,docx_core=debug`.
    #[arg(long, env = "DOCX_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    #[arg(
        long,
        env = "DOCX_LOG_JSON",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    log_json: bool,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct DocxConfig {
    pub db_namespace: String,
    pub db_name: String,
    pub db_in_memory: bool,
    pub db_uri: Option<String>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
    pub data_dir: PathBuf,
    pub enable_stdio: bool,
    pub mcp_serve: bool,
    pub mcp_http_addr: SocketAddr,
    pub api_serve: bool,
    pub api_addr: SocketAddr,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub max_document_bytes: usize,
    pub cache_ttl: Option<Duration>,
    pub cache_sweep_interval: Duration,
    pub cache_max_entries: Option<usize>,
    pub export_workers: usize,
    pub export_queue_depth: usize,
    pub log_filter: String,
    pub log_json: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn require_name(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(value)
}

fn require_positive(name: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidSetting {
            name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

impl DocxConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    /// The remote database endpoint, or `None` for the embedded store.
    pub fn db_endpoint(&self) -> Option<&str> {
        if self.db_in_memory {
            None
        } else {
            self.db_uri.as_deref()
        }
    }

    pub fn cache_config(&self) -> DocumentCacheConfig {
        let mut config =
            DocumentCacheConfig::default().with_sweep_interval(self.cache_sweep_interval);
        if let Some(ttl) = self.cache_ttl {
            config = config.with_ttl(ttl);
        }
        if let Some(max_entries) = self.cache_max_entries {
            config = config.with_max_entries(max_entries);
        }
        config
    }

    pub fn export_queue_config(&self) -> ExportQueueConfig {
        ExportQueueConfig::default()
            .with_workers(self.export_workers)
            .with_capacity(self.export_queue_depth)
    }

    pub fn api_config(&self) -> ApiServerConfig {
        ApiServerConfig::new(self.api_addr)
            .with_max_body_bytes(self.max_body_bytes)
            .with_request_timeout(self.request_timeout)
            .with_api_key(self.api_key.clone())
    }

    pub fn mcp_http_config(&self) -> McpHttpServerConfig {
        McpHttpServerConfig::new(self.mcp_http_addr)
    }
}

impl TryFrom<CliArgs> for DocxConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let db_uri = non_blank(args.db_uri);
        let db_username = non_blank(args.db_username);
        let db_password = non_blank(args.db_password);

        let db_in_memory = args.db_in_memory || db_uri.is_none();

        if !db_in_memory && db_username.is_some() != db_password.is_some() {
            return Err(ConfigError::MissingSetting(if db_username.is_none() {
                "DOCX_DB_USERNAME"
            } else {
                "DOCX_DB_PASSWORD"
            }));
        }

        let db_namespace = require_name("DOCX_DB_NAMESPACE", args.db_namespace)?;
        let db_name = require_name("DOCX_DB_NAME", args.db_name)?;

        if !args.enable_stdio && !args.mcp_serve && !args.api_serve {
            return Err(ConfigError::MissingSetting(
                "DOCX_ENABLE_STDIO, DOCX_MCP_SERVE or DOCX_API_SERVE",
            ));
        }

        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "DOCX_REQUEST_TIMEOUT_SECS",
                value: args.request_timeout_secs.to_string(),
            });
        }

        let cache_ttl = if args.cache_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.cache_ttl_secs))
        };
        let sweep_secs = args
            .cache_sweep_secs
            .unwrap_or_else(|| (args.cache_ttl_secs / 2).max(1));
        if sweep_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "DOCX_CACHE_SWEEP_SECS",
                value: sweep_secs.to_string(),
            });
        }

        Ok(Self {
            db_namespace,
            db_name,
            db_in_memory,
            db_uri,
            db_username,
            db_password,
            data_dir: args.data_dir,
            enable_stdio: args.enable_stdio,
            mcp_serve: args.mcp_serve,
            mcp_http_addr: args.mcp_http_addr,
            api_serve: args.api_serve,
            api_addr: args.api_addr,
            api_key: non_blank(args.api_key),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            max_body_bytes: require_positive("DOCX_MAX_BODY_BYTES", args.max_body_bytes)?,
            max_document_bytes: require_positive(
                "DOCX_MAX_DOCUMENT_BYTES",
                args.max_document_bytes,
            )?,
            cache_ttl,
            cache_sweep_interval: Duration::from_secs(sweep_secs),
            cache_max_entries: args.cache_max_entries,
            export_workers: require_positive("DOCX_EXPORT_WORKERS", args.export_workers)?,
            export_queue_depth: require_positive(
                "DOCX_EXPORT_QUEUE_DEPTH",
                args.export_queue_depth,
            )?,
            log_filter: args.log_filter,
            log_json: args.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            db_namespace: DEFAULT_DB_NAMESPACE.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            db_in_memory: true,
            db_uri: None,
            db_username: None,
            db_password: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            enable_stdio: false,
            mcp_serve: true,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            api_serve: true,
            api_addr: DEFAULT_API_ADDR.parse().expect("valid API addr"),
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_sweep_secs: None,
            cache_max_entries: None,
            export_workers: DEFAULT_EXPORT_WORKERS,
            export_queue_depth: DEFAULT_EXPORT_QUEUE_DEPTH,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
        }
    }

    #[test]
    fn defaults_to_in_memory_when_db_uri_missing() {
        let mut args = base_args();
        args.db_in_memory = false;

        let config = DocxConfig::try_from(args).expect("config should parse");

        assert!(config.db_in_memory);
        assert!(config.db_endpoint().is_none());
    }

    #[test]
    fn remote_credentials_must_be_paired() {
        let mut args = base_args();
        args.db_in_memory = false;
        args.db_uri = Some("ws://localhost:8000".to_string());
        args.db_username = Some("root".to_string());

        let err = DocxConfig::try_from(args).expect_err("password is missing");
        assert!(matches!(err, ConfigError::MissingSetting("DOCX_DB_PASSWORD")));
    }

    #[test]
    fn remote_endpoint_is_used_when_configured() {
        let mut args = base_args();
        args.db_in_memory = false;
        args.db_uri = Some("ws://localhost:8000".to_string());

        let config = DocxConfig::try_from(args).expect("config should parse");
        assert_eq!(config.db_endpoint(), Some("ws://localhost:8000"));
    }

    #[test]
    fn blank_names_and_zero_limits_are_rejected() {
        let mut args = base_args();
        args.db_namespace = "  ".to_string();
        assert!(matches!(
            DocxConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "DOCX_DB_NAMESPACE", .. })
        ));

        let mut args = base_args();
        args.export_workers = 0;
        assert!(matches!(
            DocxConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "DOCX_EXPORT_WORKERS", .. })
        ));
    }

    #[test]
    fn at_least_one_transport_is_required() {
        let mut args = base_args();
        args.mcp_serve = false;
        args.api_serve = false;
        assert!(matches!(
            DocxConfig::try_from(args),
            Err(ConfigError::MissingSetting(_))
        ));
    }

    #[test]
    fn cache_settings_follow_the_ttl() {
        let config = DocxConfig::try_from(base_args()).expect("config should parse");
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.cache_sweep_interval, Duration::from_secs(150));

        let mut args = base_args();
        args.cache_ttl_secs = 0;
        let config = DocxConfig::try_from(args).expect("config should parse");
        assert!(config.cache_config().ttl.is_none());
    }

    #[test]
    fn blank_api_key_disables_the_check() {
        let mut args = base_args();
        args.api_key = Some(String::new());
        let config = DocxConfig::try_from(args).expect("config should parse");
        assert!(config.api_config().api_key.is_none());
    }
}
