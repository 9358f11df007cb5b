//! Per-application storage root resolution.
//!
//! A thin wrapper bound to the application that resolves where documents
//! and cached data for this application live on disk. The directories are
//! created on first use.

use std::path::PathBuf;
use std::sync::Weak;
use std::{env, fs};

use atrium_core::logging::targets;
use directories::BaseDirs;

use crate::application::Application;
use crate::settings::config_root;

/// Resolves document and cache roots for one application.
pub struct Storage {
    app: Weak<Application>,
}

impl Storage {
    pub(crate) fn new(app: Weak<Application>) -> Self {
        Self { app }
    }

    /// The directory this application's documents live in, created on
    /// demand. `None` if the application has been dropped or the directory
    /// could not be created.
    pub fn documents_root(&self) -> Option<PathBuf> {
        self.ensure(self.documents_path()?)
    }

    /// The directory this application's cached data lives in, created on
    /// demand. `None` if the application has been dropped or the directory
    /// could not be created.
    pub fn cache_root(&self) -> Option<PathBuf> {
        self.ensure(self.cache_path()?)
    }

    pub(crate) fn documents_path(&self) -> Option<PathBuf> {
        let id = self.app_id()?;
        Some(config_root().join("storage").join(id).join("documents"))
    }

    pub(crate) fn cache_path(&self) -> Option<PathBuf> {
        let id = self.app_id()?;
        let base = match BaseDirs::new() {
            Some(dirs) => dirs.cache_dir().to_path_buf(),
            None => env::temp_dir(),
        };
        Some(base.join("atrium").join(id))
    }

    fn app_id(&self) -> Option<String> {
        self.app.upgrade().map(|app| app.unique_id())
    }

    fn ensure(&self, path: PathBuf) -> Option<PathBuf> {
        if let Err(err) = fs::create_dir_all(&path) {
            tracing::error!(
                target: targets::STORAGE,
                path = %path.display(),
                %err,
                "could not create the storage directory"
            );
            return None;
        }
        Some(path)
    }
}
