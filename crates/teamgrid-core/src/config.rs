//! Configuration module
//!
//! This module provides the application configuration loaded from environment
//! variables, including database, storage, authentication, and upload
//! settings.

use std::env;

use crate::constants;
use crate::storage_types::StorageBackend;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACCESS_EXPIRY_HOURS: i64 = 24;
const DEFAULT_REFRESH_EXPIRY_HOURS: i64 = 24 * 7;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    // Authentication
    pub jwt_secret: String,
    pub jwt_access_expiry_hours: i64,
    pub jwt_refresh_expiry_hours: i64,

    // Storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,

    // Upload pipeline
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub upload_workers: usize,
    pub upload_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| constants::DEFAULT_ALLOWED_EXTENSIONS.join(","))
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            cors_origins,
            environment,

            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| DEFAULT_CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_access_expiry_hours: env::var("JWT_ACCESS_EXPIRY_HOURS")
                .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(DEFAULT_ACCESS_EXPIRY_HOURS),
            jwt_refresh_expiry_hours: env::var("JWT_REFRESH_EXPIRY_HOURS")
                .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(DEFAULT_REFRESH_EXPIRY_HOURS),

            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),

            max_file_size_bytes: env::var("MAX_FILE_SIZE_BYTES")
                .unwrap_or_else(|_| constants::DEFAULT_MAX_FILE_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(constants::DEFAULT_MAX_FILE_SIZE_BYTES),
            allowed_extensions,
            upload_workers: env::var("UPLOAD_WORKERS")
                .unwrap_or_else(|_| constants::DEFAULT_UPLOAD_WORKERS.to_string())
                .parse()
                .unwrap_or(constants::DEFAULT_UPLOAD_WORKERS),
            upload_timeout_secs: env::var("UPLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| constants::DEFAULT_UPLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(constants::DEFAULT_UPLOAD_TIMEOUT_SECS),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Validate configuration consistency for the selected storage backend.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    anyhow::bail!("S3_BUCKET must be set when STORAGE_BACKEND=s3");
                }
                if self.s3_region.is_none() && self.s3_endpoint.is_none() {
                    anyhow::bail!(
                        "S3_REGION or S3_ENDPOINT must be set when STORAGE_BACKEND=s3"
                    );
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    anyhow::bail!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    );
                }
            }
        }
        if self.upload_workers == 0 {
            anyhow::bail!("UPLOAD_WORKERS must be at least 1");
        }
        Ok(())
    }
}
