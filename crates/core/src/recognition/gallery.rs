use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryStoreError {
    #[error("gallery I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("gallery file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("gallery file is corrupt: {faces} feature vectors but {names} names")]
    Corrupt { faces: usize, names: usize },
}

/// One enrolled identity. Duplicate names are allowed and act as extra
/// reference photos for the same person.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryEntry {
    pub name: String,
    pub features: Vec<f32>,
}

/// The set of enrolled identities, in enrollment order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

/// On-disk layout: parallel arrays, kept for compatibility with existing
/// gallery files.
#[derive(Serialize, Deserialize)]
struct StoredGallery {
    faces: Vec<Vec<f32>>,
    names: Vec<String>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: GalleryEntry) {
        self.entries.push(entry);
    }

    /// Removes the first entry with the given name. Returns whether an
    /// entry was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a gallery from disk. A missing file is an empty gallery, not
    /// an error, so first runs need no setup step.
    pub fn load(path: &Path) -> Result<Self, GalleryStoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        let stored: StoredGallery = serde_json::from_str(&contents)?;
        if stored.faces.len() != stored.names.len() {
            return Err(GalleryStoreError::Corrupt {
                faces: stored.faces.len(),
                names: stored.names.len(),
            });
        }
        let entries = stored
            .names
            .into_iter()
            .zip(stored.faces)
            .map(|(name, features)| GalleryEntry { name, features })
            .collect();
        Ok(Self { entries })
    }

    /// Persist the gallery, writing to a temp file then renaming so a
    /// crash mid-write never leaves a truncated gallery behind.
    pub fn save(&self, path: &Path) -> Result<(), GalleryStoreError> {
        let stored = StoredGallery {
            faces: self.entries.iter().map(|e| e.features.clone()).collect(),
            names: self.entries.iter().map(|e| e.name.clone()).collect(),
        };
        let json = serde_json::to_string(&stored)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
