//! Uid to user-name resolution through a cached `/etc/passwd`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Label used when the owner of an entity cannot be determined.
pub const UNKNOWN_USER: &str = "?";

/// Lazily loaded uid → name table.
#[derive(Debug, Clone)]
pub struct UserCache {
    passwd: PathBuf,
    names: HashMap<u32, String>,
    loaded: bool,
}

impl Default for UserCache {
    fn default() -> Self {
        Self::new("/etc/passwd")
    }
}

impl UserCache {
    /// Creates a cache backed by the given passwd file.
    pub fn new(passwd: impl Into<PathBuf>) -> Self {
        Self { passwd: passwd.into(), names: HashMap::new(), loaded: false }
    }

    /// Returns the passwd file this cache reads.
    #[must_use]
    pub fn passwd_path(&self) -> &Path {
        &self.passwd
    }

    /// Resolves a uid, falling back to its decimal form.
    pub fn name_of(&mut self, uid: u32) -> String {
        if !self.loaded {
            self.loaded = true;
            if let Ok(content) = std::fs::read_to_string(&self.passwd) {
                self.names = parse_passwd(&content);
            }
        }
        self.names.get(&uid).cloned().unwrap_or_else(|| uid.to_string())
    }

    /// Resolves an optional uid; `None` means the entity vanished.
    pub fn resolve(&mut self, uid: Option<u32>) -> String {
        uid.map_or_else(|| UNKNOWN_USER.to_string(), |uid| self.name_of(uid))
    }
}

/// Parses `name:x:uid:...` lines, keeping the first name per uid.
#[must_use]
pub fn parse_passwd(content: &str) -> HashMap<u32, String> {
    let mut names = HashMap::new();
    for line in content.lines() {
        if line.starts_with('#') {
            continue;
        }
        let mut fields = line.split(':');
        let (Some(name), Some(_), Some(uid)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if let Ok(uid) = uid.parse::<u32>() {
            names.entry(uid).or_insert_with(|| name.to_string());
        }
    }
    names
}
