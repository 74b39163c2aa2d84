//! File-backed session token store. This is the optimistic "store" flag:
//! loaded from disk on start and flipped immediately on login/logout.

use crate::{
    backend::BackendError,
    watchdog::{AuthFlagSource, SharedFlag},
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    token: RwLock<Option<SecretString>>,
    flag: SharedFlag,
}

impl TokenStore {
    /// Load the persisted token, if any. A missing file means logged out.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let token = read_token(&path).await?;
        let flag = SharedFlag::new(token.is_some());

        debug!(path = %path.display(), authenticated = flag.get(), "token store loaded");

        Ok(Self {
            path,
            token: RwLock::new(token),
            flag,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn flag(&self) -> SharedFlag {
        self.flag.clone()
    }

    /// Persist `token` and mark the store authenticated.
    ///
    /// # Errors
    /// Returns an error if the token file cannot be written.
    pub async fn login(&self, token: SecretString) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io_error)?;
            }
        }
        fs::write(&self.path, token.expose_secret())
            .await
            .map_err(io_error)?;
        restrict_permissions(&self.path).await?;

        self.set(Some(token));
        info!("store: logged in");
        Ok(())
    }

    /// Drop the token from memory and disk. Returns whether a token was held.
    ///
    /// # Errors
    /// Returns an error if the token file exists but cannot be removed.
    pub async fn remove(&self) -> Result<bool, BackendError> {
        let had_token = self.token().is_some();
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(e)),
        }
        self.set(None);
        info!(had_token, "store: token removed");
        Ok(had_token)
    }

    /// Re-read the token file, picking up a login made by another client.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub async fn reload(&self) -> Result<Option<SecretString>, BackendError> {
        let token = read_token(&self.path).await?;
        self.set(token.clone());
        Ok(token)
    }

    fn set(&self, token: Option<SecretString>) {
        self.flag.set(token.is_some());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl AuthFlagSource for TokenStore {
    fn is_authenticated(&self) -> bool {
        self.flag.get()
    }
}

async fn read_token(path: &Path) -> Result<Option<SecretString>, BackendError> {
    match fs::read_to_string(path).await {
        Ok(contents) => {
            let token = contents.trim();
            if token.is_empty() {
                Ok(None)
            } else {
                Ok(Some(SecretString::from(token.to_string())))
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(e)),
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), BackendError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(io_error)
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), BackendError> {
    Ok(())
}

fn io_error(e: std::io::Error) -> BackendError {
    BackendError::Store(e.to_string())
}
