use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Where attachment bytes live.
///
/// Selected once at startup from `FILE_BACKEND`; entity records only carry
/// relative paths and an optional remote reference, never the backend itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileBackendKind {
    #[default]
    Local,
    Dms,
}

impl FromStr for FileBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(FileBackendKind::Local),
            "dms" => Ok(FileBackendKind::Dms),
            _ => Err(anyhow::anyhow!("Invalid file backend: {}", s)),
        }
    }
}

impl Display for FileBackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileBackendKind::Local => write!(f, "local"),
            FileBackendKind::Dms => write!(f, "dms"),
        }
    }
}

/// Object storage products reachable through a tenant's storage connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStorageProvider {
    Garage,
    OxiCloud,
    Minio,
    LakeFs,
}

impl FromStr for ObjectStorageProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "garage" => Ok(ObjectStorageProvider::Garage),
            "oxicloud" => Ok(ObjectStorageProvider::OxiCloud),
            "minio" => Ok(ObjectStorageProvider::Minio),
            "lakefs" => Ok(ObjectStorageProvider::LakeFs),
            _ => Err(anyhow::anyhow!("Invalid object storage provider: {}", s)),
        }
    }
}

impl Display for ObjectStorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ObjectStorageProvider::Garage => write!(f, "garage"),
            ObjectStorageProvider::OxiCloud => write!(f, "oxicloud"),
            ObjectStorageProvider::Minio => write!(f, "minio"),
            ObjectStorageProvider::LakeFs => write!(f, "lakefs"),
        }
    }
}
