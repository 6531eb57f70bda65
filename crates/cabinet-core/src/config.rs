//! Configuration module
//!
//! Settings are read once at startup from the environment (and an optional
//! `.env` file). `Config::validate` rejects inconsistent combinations before
//! anything is wired.

use std::env;
use std::path::PathBuf;

use crate::constants::DEFAULT_SUPER_TENANT;
use crate::storage_types::FileBackendKind;

const DEFAULT_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 20;
const DMS_TIMEOUT_SECS: u64 = 30;
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;
const PRESIGNED_URL_EXPIRY_SECS: u64 = 3600;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

/// Application settings
#[derive(Clone, Debug)]
pub struct CabinetConfig {
    pub base: BaseConfig,
    /// Absent selects the in-memory repository.
    pub database_url: Option<String>,
    pub super_tenant: String,
    pub upload_root: PathBuf,
    pub file_backend: FileBackendKind,
    pub dms_base_url: Option<String>,
    pub dms_timeout_seconds: u64,
    pub max_file_size_bytes: usize,
    pub object_storage_retry_attempts: u32,
    pub object_storage_retry_delay_ms: u64,
    pub presigned_url_expiry_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<CabinetConfig>);

impl Config {
    fn inner(&self) -> &CabinetConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = CabinetConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn super_tenant(&self) -> &str {
        &self.inner().super_tenant
    }

    pub fn upload_root(&self) -> &PathBuf {
        &self.inner().upload_root
    }

    pub fn file_backend(&self) -> FileBackendKind {
        self.inner().file_backend
    }

    pub fn dms_base_url(&self) -> Option<&str> {
        self.inner().dms_base_url.as_deref()
    }

    pub fn dms_timeout_seconds(&self) -> u64 {
        self.inner().dms_timeout_seconds
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.inner().max_file_size_bytes
    }

    pub fn object_storage_retry_attempts(&self) -> u32 {
        self.inner().object_storage_retry_attempts
    }

    pub fn object_storage_retry_delay_ms(&self) -> u64 {
        self.inner().object_storage_retry_delay_ms
    }

    pub fn presigned_url_expiry_secs(&self) -> u64 {
        self.inner().presigned_url_expiry_secs
    }
}

impl Default for CabinetConfig {
    /// Development defaults: in-memory repository, local files under `./uploads`.
    fn default() -> Self {
        Self {
            base: BaseConfig {
                server_port: DEFAULT_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                db_max_connections: MAX_CONNECTIONS,
                db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            },
            database_url: None,
            super_tenant: DEFAULT_SUPER_TENANT.to_string(),
            upload_root: PathBuf::from("./uploads"),
            file_backend: FileBackendKind::Local,
            dms_base_url: None,
            dms_timeout_seconds: DMS_TIMEOUT_SECS,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            object_storage_retry_attempts: RETRY_ATTEMPTS,
            object_storage_retry_delay_ms: RETRY_DELAY_MS,
            presigned_url_expiry_secs: PRESIGNED_URL_EXPIRY_SECS,
        }
    }
}

impl CabinetConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        };

        let file_backend = match env::var("FILE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => FileBackendKind::Local,
        };

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        Ok(CabinetConfig {
            base,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            super_tenant: env::var("SUPER_TENANT")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SUPER_TENANT.to_string()),
            upload_root: PathBuf::from(
                env::var("UPLOAD_ROOT").unwrap_or_else(|_| "./uploads".to_string()),
            ),
            file_backend,
            dms_base_url: env::var("DMS_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
            dms_timeout_seconds: env::var("DMS_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| DMS_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(DMS_TIMEOUT_SECS),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            object_storage_retry_attempts: env::var("OBJECT_STORAGE_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| RETRY_ATTEMPTS.to_string())
                .parse()
                .unwrap_or(RETRY_ATTEMPTS),
            object_storage_retry_delay_ms: env::var("OBJECT_STORAGE_RETRY_DELAY_MS")
                .unwrap_or_else(|_| RETRY_DELAY_MS.to_string())
                .parse()
                .unwrap_or(RETRY_DELAY_MS),
            presigned_url_expiry_secs: env::var("PRESIGNED_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| PRESIGNED_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(PRESIGNED_URL_EXPIRY_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        match self.file_backend {
            FileBackendKind::Local => {
                if self.upload_root.as_os_str().is_empty() {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_ROOT must be set when using the local file backend"
                    ));
                }
            }
            FileBackendKind::Dms => {
                let base = self.dms_base_url.as_deref().unwrap_or_default();
                if !base.starts_with("http://") && !base.starts_with("https://") {
                    return Err(anyhow::anyhow!(
                        "DMS_BASE_URL must be an http(s) URL when FILE_BACKEND=dms"
                    ));
                }
            }
        }

        if self.object_storage_retry_attempts == 0 {
            return Err(anyhow::anyhow!(
                "OBJECT_STORAGE_RETRY_ATTEMPTS must be at least 1"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config(Box::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.server_port(), 4000);
        assert_eq!(config.super_tenant(), "super");
        assert_eq!(config.max_file_size_bytes(), 20 * 1024 * 1024);
        assert_eq!(config.object_storage_retry_attempts(), 3);
        assert!(config.database_url().is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_dms_requires_base_url() {
        let mut inner = CabinetConfig {
            file_backend: FileBackendKind::Dms,
            ..Default::default()
        };
        assert!(inner.validate().is_err());

        inner.dms_base_url = Some("http://dms.internal:8080".to_string());
        assert!(inner.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_postgres_url() {
        let inner = CabinetConfig {
            database_url: Some("mysql://localhost/db".to_string()),
            ..Default::default()
        };
        assert!(inner.validate().is_err());
    }

    #[test]
    fn test_zero_retry_attempts_rejected() {
        let inner = CabinetConfig {
            object_storage_retry_attempts: 0,
            ..Default::default()
        };
        assert!(inner.validate().is_err());
    }
}
