use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;

use crate::error::SecretError;

#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Resolves `id` to a non-empty value.
    async fn get_secret(&self, id: &str) -> Result<String, SecretError>;
}

/// Secrets injected as environment variables named after the secret id.
#[derive(Debug, Default, Clone)]
pub struct EnvSecrets;

#[async_trait]
impl SecretProvider for EnvSecrets {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        let value = std::env::var(id).map_err(|_| SecretError::Missing(id.to_string()))?;
        non_empty(id, value)
    }
}

/// Secrets mounted as one file per id, e.g. `/secrets/IFTTT_KEY`.
#[derive(Debug, Clone)]
pub struct MountedSecrets {
    dir: PathBuf,
}

impl MountedSecrets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretProvider for MountedSecrets {
    async fn get_secret(&self, id: &str) -> Result<String, SecretError> {
        match tokio::fs::read_to_string(self.dir.join(id)).await {
            Ok(raw) => non_empty(id, raw),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(SecretError::Missing(id.to_string()))
            }
            Err(source) => Err(SecretError::Io {
                id: id.to_string(),
                source,
            }),
        }
    }
}

fn non_empty(id: &str, value: String) -> Result<String, SecretError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SecretError::Empty(id.to_string()));
    }
    Ok(trimmed.to_string())
}
