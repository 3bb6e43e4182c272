//! JSON export of profiles and their tasks.
//!
//! # Invariants
//! - Password hashes are never written (skipped by `Profile` serialization).
//! - Each export writes a new file; existing exports are never overwritten.

use super::ServiceResult;
use crate::clock::Clock;
use crate::model::profile::Profile;
use crate::model::task::Task;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::task_repo::TaskRepository;
use log::info;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Suffixes tried after the plain name is taken.
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: i64,
    pub profiles: Vec<ProfileExport>,
}

#[derive(Debug, Serialize)]
pub struct ProfileExport {
    pub profile: Profile,
    pub tasks: Vec<Task>,
}

pub struct ExportService<'c, P: ProfileRepository, T: TaskRepository> {
    profiles: P,
    tasks: T,
    clock: &'c dyn Clock,
}

impl<'c, P: ProfileRepository, T: TaskRepository> ExportService<'c, P, T> {
    pub fn new(profiles: P, tasks: T, clock: &'c dyn Clock) -> Self {
        Self {
            profiles,
            tasks,
            clock,
        }
    }

    pub fn build_document(&self) -> ServiceResult<ExportDocument> {
        let mut profiles = Vec::new();
        for profile in self.profiles.list_profiles()? {
            let tasks = self.tasks.list_tasks(profile.id)?;
            profiles.push(ProfileExport { profile, tasks });
        }
        Ok(ExportDocument {
            version: EXPORT_FORMAT_VERSION,
            exported_at: self.clock.now_ms(),
            profiles,
        })
    }

    /// Writes `taskdeck-export-<epoch_ms>.json` under `export_dir` and
    /// returns its path. When that name is taken, `-1`, `-2`, ... is appended
    /// to the stem.
    pub fn export_to_dir(&self, export_dir: &Path) -> ServiceResult<PathBuf> {
        let document = self.build_document()?;
        std::fs::create_dir_all(export_dir)?;

        let payload = serde_json::to_vec_pretty(&document)?;
        let (path, mut file) = create_export_file(export_dir, document.exported_at)?;
        file.write_all(&payload)?;
        file.sync_all()?;

        info!(
            "event=export_data module=service status=ok profiles={} bytes={}",
            document.profiles.len(),
            payload.len()
        );
        Ok(path)
    }
}

fn create_export_file(export_dir: &Path, exported_at: i64) -> std::io::Result<(PathBuf, File)> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("taskdeck-export-{exported_at}.json")
        } else {
            format!("taskdeck-export-{exported_at}-{attempt}.json")
        };
        let path = export_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
