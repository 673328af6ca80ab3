use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Default hard character budget for `basic` chunking.
pub const DEFAULT_CHUNK_MAX_CHARACTERS: usize = 500;
/// Default request body ceiling; base64 documents routinely exceed axum's 2 MiB default.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docsplit server and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Backend used to partition decoded documents.
    pub partition_backend: PartitionBackend,
    /// Base URL of the hosted Unstructured API (required for the `unstructured` backend).
    pub unstructured_api_url: Option<String>,
    /// Optional API key sent to the hosted Unstructured API.
    pub unstructured_api_key: Option<String>,
    /// Optional request timeout for the hosted Unstructured API, in seconds.
    pub unstructured_api_timeout_secs: Option<u64>,
    /// Shape of the `POST /unstructured/partition` response body.
    pub response_shape: ResponseShape,
    /// Hard character limit for a single chunk.
    pub chunk_max_characters: usize,
    /// Soft limit after which a chunk is closed; defaults to `chunk_max_characters`.
    pub chunk_new_after_n_chars: Option<usize>,
    /// Characters of overlap carried between pieces of a split oversized element.
    pub chunk_overlap: usize,
    /// Maximum accepted request body size in bytes.
    pub max_request_bytes: usize,
}

/// Supported partitioning backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionBackend {
    /// In-process partitioner for text, Markdown, and DOCX documents.
    Native,
    /// Hosted Unstructured partition API.
    Unstructured,
}

/// Response body layouts for the partition endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `{ "chunks": ["text", ...] }`
    Chunks,
    /// `{ "data": [{ "category": "...", "text": "..." }, ...] }`
    Elements,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let partition_backend = match load_env_optional("PARTITION_BACKEND") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("PARTITION_BACKEND".to_string()))?,
            None => PartitionBackend::Native,
        };
        let unstructured_api_url = load_env_optional("UNSTRUCTURED_API_URL");
        if partition_backend == PartitionBackend::Unstructured && unstructured_api_url.is_none() {
            return Err(ConfigError::MissingVariable(
                "UNSTRUCTURED_API_URL".to_string(),
            ));
        }

        let chunk_max_characters = parse_optional::<usize>("CHUNK_MAX_CHARACTERS")?
            .unwrap_or(DEFAULT_CHUNK_MAX_CHARACTERS);
        if chunk_max_characters == 0 {
            return Err(ConfigError::InvalidValue(
                "CHUNK_MAX_CHARACTERS".to_string(),
            ));
        }

        Ok(Self {
            server_port: parse_optional("SERVER_PORT")?,
            partition_backend,
            unstructured_api_url,
            unstructured_api_key: load_env_optional("UNSTRUCTURED_API_KEY"),
            unstructured_api_timeout_secs: parse_optional("UNSTRUCTURED_API_TIMEOUT_SECS")?,
            response_shape: match load_env_optional("RESPONSE_SHAPE") {
                Some(value) => value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("RESPONSE_SHAPE".to_string()))?,
                None => ResponseShape::Chunks,
            },
            chunk_max_characters,
            chunk_new_after_n_chars: parse_optional("CHUNK_NEW_AFTER_N_CHARS")?,
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?.unwrap_or(0),
            max_request_bytes: parse_optional("MAX_REQUEST_BYTES")?
                .unwrap_or(DEFAULT_MAX_REQUEST_BYTES),
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for PartitionBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "unstructured" => Ok(Self::Unstructured),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for ResponseShape {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chunks" => Ok(Self::Chunks),
            "elements" | "data" => Ok(Self::Elements),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        backend = ?config.partition_backend,
        response_shape = ?config.response_shape,
        server_port = ?config.server_port,
        chunk_max_characters = config.chunk_max_characters,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!(
            "Unstructured".parse::<PartitionBackend>(),
            Ok(PartitionBackend::Unstructured)
        );
        assert_eq!(" native ".parse::<PartitionBackend>(), Ok(PartitionBackend::Native));
        assert!("ocr".parse::<PartitionBackend>().is_err());
    }

    #[test]
    fn response_shape_accepts_field_name_alias() {
        assert_eq!("chunks".parse::<ResponseShape>(), Ok(ResponseShape::Chunks));
        assert_eq!("ELEMENTS".parse::<ResponseShape>(), Ok(ResponseShape::Elements));
        assert_eq!("data".parse::<ResponseShape>(), Ok(ResponseShape::Elements));
        assert!("records".parse::<ResponseShape>().is_err());
    }
}
