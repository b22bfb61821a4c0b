use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{Result, SocialMapError};
use crate::graph::{ContactRecord, UserId};

pub const DEFAULT_PATTERN: &str = ".contacts.json";

/// Files found under a dump root, sorted by path.
#[derive(Debug, Default)]
pub struct Discovery {
    pub names: Vec<PathBuf>,
    /// entries below the root that could not be walked
    pub skipped: usize,
}

/// Finds every file under `root` whose name ends with `suffix`.
///
/// An unwalkable root is always an error. Below it, `keep_going` turns
/// walk errors into warnings.
pub fn discover(root: &Path, suffix: &str, keep_going: bool) -> Result<Discovery> {
    let mut found = Discovery::default();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if keep_going && e.depth() > 0 => {
                warn!("skipping: {}", e);
                found.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().ends_with(suffix) {
            found.names.push(entry.into_path());
        }
    }

    found.names.sort();
    Ok(found)
}

/// The owning user is the leading segment of the base name: `42.contacts.json` is user 42.
pub fn owner_id(path: &Path) -> Result<UserId> {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .and_then(|segment| segment.parse::<UserId>().ok())
        .ok_or_else(|| SocialMapError::OwnerId {
            path: path.to_path_buf(),
        })
}

pub fn read_contacts(path: &Path) -> Result<(UserId, Vec<ContactRecord>)> {
    let owner = owner_id(path)?;

    let contents = fs::read(path).map_err(|source| SocialMapError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    let contacts = serde_json::from_slice(&contents).map_err(|source| SocialMapError::Parse {
        source,
        path: path.to_path_buf(),
    })?;

    Ok((owner, contacts))
}

/// Lazily reads one contact list per discovered file.
pub fn records(names: &[PathBuf]) -> impl Iterator<Item = Result<(UserId, Vec<ContactRecord>)>> + '_ {
    names.iter().map(|name| read_contacts(name))
}
