//! Command implementations.
//!
//! Every command opens the data directory, acts as the local operator and
//! saves through the storefront's repositories.

pub mod admin;
pub mod orders;
pub mod products;
pub mod seed;
pub mod users;

use std::path::Path;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use eshop_admin::AdminError;
use eshop_storefront::Storefront;
use eshop_storefront::config::{ConfigError, StorefrontConfig};
use eshop_storefront::error::AppError;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{}", .0.user_message())]
    App(#[from] AppError),

    #[error("{0}")]
    Admin(#[from] AdminError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A command-line value did not parse.
    #[error("{0}")]
    InvalidArgument(String),

    /// Seeding would overwrite existing data.
    #[error("data directory already has data; pass --force to overwrite")]
    NotEmpty,

    #[error("catalog entry {index}: {reason}")]
    InvalidCatalog { index: usize, reason: String },
}

impl CliError {
    /// Send failures that are not the operator's fault to Sentry.
    pub fn report(&self) {
        match self {
            Self::App(err) => {
                err.report();
            }
            Self::Io(_) => {
                sentry::capture_error(self);
            }
            _ => tracing::debug!(error = %self, "Command rejected"),
        }
    }
}

pub(crate) fn open(config: StorefrontConfig) -> Result<Storefront, CliError> {
    Ok(Storefront::open(config)?)
}

/// Write `contents` to `output`, or to stdout when no file is given.
pub(crate) async fn write_output(output: Option<&Path>, contents: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            tokio::fs::write(path, contents).await?;
            tracing::info!(path = %path.display(), bytes = contents.len(), "Wrote file");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(contents.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

pub(crate) async fn read_input(path: &Path) -> Result<String, CliError> {
    tracing::info!(path = %path.display(), "Reading file");
    Ok(tokio::fs::read_to_string(path).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Config pointing at a fresh temporary data directory.
    pub(crate) fn temp_config() -> (tempfile::TempDir, StorefrontConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig {
            data_dir: dir.path().join("data"),
            ..StorefrontConfig::default()
        };
        (dir, config)
    }

    #[tokio::test]
    async fn test_write_and_read_file() {
        let (dir, _) = temp_config();
        let path = dir.path().join("out.json");
        write_output(Some(&path), "[]").await.unwrap();
        assert_eq!(read_input(&path).await.unwrap(), "[]");
    }

    #[test]
    fn test_app_errors_use_user_message() {
        let err = CliError::from(AppError::NotFound("order 9".into()));
        assert_eq!(err.to_string(), "Not found: order 9");
        let err = CliError::from(AppError::Internal("disk on fire".into()));
        assert_eq!(err.to_string(), "Something went wrong");
    }
}
