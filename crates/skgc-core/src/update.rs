//! Replace server binaries with a freshly downloaded release.
//!
//! There is no rollback: each step fails fast and the previous files stay in
//! `skgc/backup` for manual recovery.

use crate::{InstallationPaths, Result, SupervisorError};

use skgc_config::{METADATA_DIR, UpdateConfig};

use std::panic::Location;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use error_location::ErrorLocation;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;

/// Java server artifact name, in the root and in `skgc/download`.
pub const JAVA_ARTIFACT: &str = "server.jar";
pub const BEDROCK_ARCHIVE: &str = "server.zip";
/// Bedrock entries carried over from the backup into the new release.
pub const BEDROCK_PRESERVED: [&str; 4] = [
    "worlds",
    "server.properties",
    "permissions.json",
    "allowlist.json",
];

/// Fetches a release artifact to a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, destination: &Path) -> Result<()>;
}

/// `Downloader` over HTTP(S).
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    #[track_caller]
    pub fn new(config: &UpdateConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| SupervisorError::Http {
                url: String::new(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        let http_error = |e: reqwest::Error| SupervisorError::Http {
            url: url.to_string(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        };

        info!("Downloading {url}");
        let mut response = self.client.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SupervisorError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| SupervisorError::io(destination, e))?;

        let mut total = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(http_error)? {
            total += chunk.len();
            file.write_all(&chunk)
                .await
                .map_err(|e| SupervisorError::io(destination, e))?;
        }
        file.flush()
            .await
            .map_err(|e| SupervisorError::io(destination, e))?;

        debug!("Downloaded {total} bytes to {}", destination.display());
        Ok(())
    }
}

/// Swap `<root>/server.jar` for the artifact at `url`.
pub async fn update_java_server(
    paths: &InstallationPaths,
    downloader: &dyn Downloader,
    url: &str,
) -> Result<()> {
    let download_dir = paths.download_dir();
    let new_artifact = download_dir.join(JAVA_ARTIFACT);

    let dir = download_dir.clone();
    blocking(&download_dir, move || make_empty_directory(&dir)).await?;
    downloader.download(url, &new_artifact).await?;

    let root = paths.root().to_path_buf();
    let backup_dir = paths.backup_dir();
    blocking(paths.root(), move || {
        install_java_artifact(&root, &backup_dir, &new_artifact)
    })
    .await?;

    info!("Installed new {JAVA_ARTIFACT}");
    Ok(())
}

fn install_java_artifact(root: &Path, backup_dir: &Path, new_artifact: &Path) -> Result<()> {
    let current_artifact = root.join(JAVA_ARTIFACT);

    make_empty_directory(backup_dir)?;
    if current_artifact.exists() {
        move_into(&current_artifact, backup_dir)?;
    } else {
        warn!(
            "No {} to back up, installing fresh",
            current_artifact.display()
        );
    }
    move_into(new_artifact, root)
}

/// Replace every root entry except `skgc` with the archive at `url`,
/// keeping worlds and server settings from the previous release.
pub async fn update_bedrock_server(
    paths: &InstallationPaths,
    downloader: &dyn Downloader,
    url: &str,
) -> Result<()> {
    let root = paths.root().to_path_buf();
    let backup_dir = paths.backup_dir();
    let download_dir = paths.download_dir();
    let archive = download_dir.join(BEDROCK_ARCHIVE);

    let (from, to, dir) = (root.clone(), backup_dir.clone(), download_dir.clone());
    blocking(&root, move || {
        back_up_release(&from, &to)?;
        make_empty_directory(&dir)
    })
    .await?;

    downloader.download(url, &archive).await?;
    unpack_archive(&archive, &root).await?;

    let into = root.clone();
    blocking(&root, move || restore_preserved(&into, &backup_dir)).await?;

    info!("Installed new bedrock release");
    Ok(())
}

fn back_up_release(root: &Path, backup_dir: &Path) -> Result<()> {
    make_empty_directory(backup_dir)?;
    for entry in list_dir(root)? {
        if entry.file_name().is_some_and(|name| name == METADATA_DIR) {
            continue;
        }
        move_into(&entry, backup_dir)?;
    }
    Ok(())
}

fn restore_preserved(root: &Path, backup_dir: &Path) -> Result<()> {
    for name in BEDROCK_PRESERVED {
        delete_item(&root.join(name))?;
    }
    for name in BEDROCK_PRESERVED {
        let saved = backup_dir.join(name);
        if !saved.exists() {
            debug!("{name} not in backup, keeping none");
            continue;
        }
        copy_item(&saved, &root.join(name))?;
    }
    Ok(())
}

async fn unpack_archive(archive: &Path, destination: &Path) -> Result<()> {
    let archive_path = archive.to_path_buf();
    let destination = destination.to_path_buf();

    blocking(archive, move || {
        let file = std::fs::File::open(&archive_path)
            .map_err(|e| SupervisorError::io(&archive_path, e))?;
        let mut zip =
            zip::ZipArchive::new(file).map_err(|e| archive_error(&archive_path, e))?;

        debug!(
            "Unpacking {} entries from {}",
            zip.len(),
            archive_path.display()
        );
        zip.extract(&destination)
            .map_err(|e| archive_error(&archive_path, e))
    })
    .await
}

/// Run filesystem work off the async workers.
async fn blocking<F>(context: &Path, work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SupervisorError::io(context, std::io::Error::other(e)))?
}

#[track_caller]
fn archive_error(path: &Path, source: zip::result::ZipError) -> SupervisorError {
    SupervisorError::Archive {
        path: path.to_path_buf(),
        source,
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Remove `path` if present, then create it empty.
fn make_empty_directory(path: &Path) -> Result<()> {
    delete_item(path)?;
    std::fs::create_dir_all(path).map_err(|e| SupervisorError::io(path, e))
}

/// Remove a file or directory tree; missing paths are fine.
fn delete_item(path: &Path) -> Result<()> {
    let result = match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|e| SupervisorError::io(path, e))
}

/// Copy a file or directory tree to `destination`.
fn copy_item(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        return std::fs::copy(source, destination)
            .map(drop)
            .map_err(|e| SupervisorError::io(source, e));
    }

    std::fs::create_dir_all(destination).map_err(|e| SupervisorError::io(destination, e))?;
    for entry in list_dir(source)? {
        if let Some(name) = entry.file_name() {
            copy_item(&entry, &destination.join(name))?;
        }
    }
    Ok(())
}

/// Move `source` into directory `directory`, keeping its name.
fn move_into(source: &Path, directory: &Path) -> Result<()> {
    let Some(name) = source.file_name() else {
        return Err(SupervisorError::invalid_argument(format!(
            "cannot move {}",
            source.display()
        )));
    };

    move_item_with(source, &directory.join(name), |from, to| {
        std::fs::rename(from, to)
    })
}

/// Rename, or copy then delete when `rename` reports a cross-device move.
pub(crate) fn move_item_with<R>(source: &Path, destination: &Path, rename: R) -> Result<()>
where
    R: FnOnce(&Path, &Path) -> std::io::Result<()>,
{
    match rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            debug!(
                "{} is on another filesystem, copying",
                destination.display()
            );
            copy_item(source, destination)?;
            delete_item(source)
        }
        Err(e) => Err(SupervisorError::io(source, e)),
    }
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>> {
    std::fs::read_dir(path)
        .and_then(|entries| entries.map(|entry| entry.map(|e| e.path())).collect())
        .map_err(|e| SupervisorError::io(path, e))
}
