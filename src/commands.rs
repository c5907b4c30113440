use anyhow::{Context, Result};
use clap::Subcommand;
use futures::StreamExt;
use oss_events::{AppEvent, EventBus};
use oss_storage::{FileStore, DEFAULT_URL_EXPIRY_SECS};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// How a successful command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    /// `exists` found nothing
    Absent,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Done => ExitCode::SUCCESS,
            Status::Absent => ExitCode::FAILURE,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List keys, optionally restricted to a prefix
    Ls { prefix: Option<String> },

    /// Upload a file (or stdin when FILE is omitted or `-`)
    Put { key: String, file: Option<PathBuf> },

    /// Download a blob to a file (or stdout)
    Get { key: String, out: Option<PathBuf> },

    /// Delete a blob; missing keys are not an error
    Rm { key: String },

    /// Check whether a blob exists (exit status 1 when it does not)
    Exists { key: String },

    /// Print a signed, read-only download URL
    Url {
        key: String,

        /// Seconds until the URL expires
        #[arg(long, default_value_t = DEFAULT_URL_EXPIRY_SECS)]
        expiry: u64,
    },
}

pub async fn execute(command: Command, store: &dyn FileStore, events: &Arc<EventBus>) -> Result<Status> {
    match command {
        Command::Ls { prefix } => {
            let mut keys = store.list(prefix.as_deref());
            let mut count = 0;
            while let Some(key) = keys.next().await {
                let key = key.context("Listing failed")?;
                events.emit(AppEvent::KeyListed { key });
                count += 1;
            }
            events.emit(AppEvent::ListCompleted { count });
        }

        Command::Put { key, file } => {
            let source = match file.filter(|f| f.as_os_str() != "-") {
                Some(path) => {
                    store.upload_file(&key, &path).await?;
                    path.display().to_string()
                }
                None => {
                    let mut stdin = tokio::io::stdin();
                    store.upload_reader(&key, &mut stdin).await?;
                    "stdin".to_string()
                }
            };
            events.emit(AppEvent::Uploaded { key, source });
        }

        Command::Get { key, out } => {
            let target = match out {
                Some(path) => {
                    download_to_file(store, &key, &path).await?;
                    path.display().to_string()
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    store.download_to(&key, &mut stdout).await?;
                    "stdout".to_string()
                }
            };
            events.emit(AppEvent::Downloaded { key, target });
        }

        Command::Rm { key } => {
            store.delete(&key).await?;
            events.emit(AppEvent::Deleted { key });
        }

        Command::Exists { key } => {
            let exists = store.exists(&key).await?;
            events.emit(AppEvent::ExistsChecked { key, exists });
            if !exists {
                return Ok(Status::Absent);
            }
        }

        Command::Url { key, expiry } => {
            let url = store.generate_download_url(&key, expiry).await?;
            events.emit(AppEvent::UrlGenerated {
                key,
                url: url.to_string(),
                expiry_secs: expiry,
            });
        }
    }

    Ok(Status::Done)
}

/// Removes the partially written file when the download fails
async fn download_to_file(store: &dyn FileStore, key: &str, path: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Cannot create {}", path.display()))?;

    if let Err(e) = store.download_to(key, &mut file).await {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove {}: {}", path.display(), cleanup);
        }
        return Err(e.into());
    }

    Ok(())
}
