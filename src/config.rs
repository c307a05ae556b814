/// Configuration management for the landing page service
use crate::error::{LandingError, LandingResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Origins allowed when `CORS_ORIGINS` is not set
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "https://landingclint-jlxhx55bu-narias-projects.vercel.app",
    "https://landingclint.vercel.app",
];

/// Default upload endpoint of the remote image host
pub const DEFAULT_IMAGE_HOST_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

/// Default request body cap for uploads (5 MiB)
pub const DEFAULT_UPLOAD_LIMIT: usize = 5 * 1024 * 1024;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub upload_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub blobstore: BlobstoreConfig,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlobstoreConfig {
    /// Files on local disk, served back under `/images`
    Disk { location: PathBuf },
    /// Third-party image host; bytes are staged in `tmp_location` first
    Remote {
        upload_url: String,
        api_key: String,
        tmp_location: PathBuf,
    },
}

/// CORS allow-list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> LandingResult<Self> {
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| LandingError::Config("Invalid port number".to_string()))?;
        let upload_limit = parse_upload_limit(env::var("UPLOAD_LIMIT_BYTES").ok())?;

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/landing.sqlite"));

        let upload_dir: PathBuf = env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "./uploads".to_string())
            .into();

        // A configured API key switches uploads to the remote host
        let blobstore = match env::var("IMAGE_HOST_API_KEY") {
            Ok(api_key) if !api_key.trim().is_empty() => BlobstoreConfig::Remote {
                upload_url: env::var("IMAGE_HOST_UPLOAD_URL")
                    .unwrap_or_else(|_| DEFAULT_IMAGE_HOST_UPLOAD_URL.to_string()),
                api_key,
                tmp_location: env::var("UPLOAD_TMP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| upload_dir.join("tmp")),
            },
            _ => BlobstoreConfig::Disk {
                location: upload_dir,
            },
        };

        let allowed_origins = match env::var("CORS_ORIGINS") {
            Ok(list) => parse_origins(&list),
            Err(_) => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                host,
                port,
                upload_limit,
            },
            storage: StorageConfig {
                database_path,
                blobstore,
            },
            cors: CorsConfig { allowed_origins },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> LandingResult<()> {
        if self.service.upload_limit == 0 {
            return Err(LandingError::Config(
                "Upload limit must be greater than zero".to_string(),
            ));
        }

        if let BlobstoreConfig::Remote { upload_url, .. } = &self.storage.blobstore {
            reqwest::Url::parse(upload_url).map_err(|e| {
                LandingError::Config(format!("Invalid image host URL {}: {}", upload_url, e))
            })?;
        }

        for origin in &self.cors.allowed_origins {
            if origin.parse::<axum::http::HeaderValue>().is_err() {
                return Err(LandingError::Config(format!("Invalid CORS origin: {}", origin)));
            }
        }

        Ok(())
    }

    /// Address the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }
}

/// Upload cap in bytes; unset means the default
fn parse_upload_limit(value: Option<String>) -> LandingResult<usize> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| LandingError::Config(format!("Invalid upload limit: {}", v))),
        None => Ok(DEFAULT_UPLOAD_LIMIT),
    }
}

/// Split a comma-separated origin list, dropping blanks
fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config(location: PathBuf) -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_limit: DEFAULT_UPLOAD_LIMIT,
        },
        storage: StorageConfig {
            database_path: location.join("test.sqlite"),
            blobstore: BlobstoreConfig::Disk { location },
        },
        cors: CorsConfig {
            allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}
