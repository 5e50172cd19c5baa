// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The index-to-video mapping store.
//!
//! This module owns the association between controller indices (0-255) and
//! local video files. Added files are copied into a managed `videos` library
//! directory so that mappings keep working when the original source file is
//! moved or deleted.
//!
//! # Persistence
//!
//! The mapping is persisted as a plain text file of `index=path` lines, one
//! per entry, and is rewritten in full after every mutation. The first `=`
//! on a line separates the index from the path, so paths containing `=` are
//! stored without escaping. Entries whose file has disappeared are dropped
//! on load rather than treated as an error.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

const MAPPINGS_FILE: &str = "mappings.txt";
const LIBRARY_DIR: &str = "videos";

#[derive(Debug, Error)]
pub(crate) enum MappingError {
    #[error("index {0} is outside 0-255")]
    InvalidIndex(i64),

    #[error("no mapping for index {0}")]
    NotFound(u8),

    #[error("the video for index {0} is no longer on disk")]
    MediaUnavailable(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A display row for the mapping table.
#[derive(Debug, Clone)]
pub(crate) struct MappingRow {
    pub(crate) index: u8,
    pub(crate) file_name: String,
    pub(crate) duration: Option<Duration>,
}

/// The persisted index-to-video association.
pub(crate) struct MappingStore {
    entries: BTreeMap<u8, PathBuf>,
    mappings_file: PathBuf,
    library_dir: PathBuf,
}

impl MappingStore {
    /// Opens (or creates) the store rooted at the given data directory.
    ///
    /// Creates the managed library directory if necessary and loads any
    /// previously persisted entries, silently dropping entries whose video
    /// file no longer exists.
    pub(crate) fn open(data_dir: &Path) -> Result<Self, MappingError> {
        let library_dir = data_dir.join(LIBRARY_DIR);
        fs::create_dir_all(&library_dir)?;

        let mappings_file = data_dir.join(MAPPINGS_FILE);
        let entries = if mappings_file.exists() {
            load_entries(&mappings_file)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            entries,
            mappings_file,
            library_dir,
        })
    }

    /// Maps an index to a video file, replacing any existing mapping for
    /// that index.
    ///
    /// The source file is copied into the managed library directory and the
    /// mapping records the managed copy, not the original path. The full
    /// mapping file is rewritten before this returns.
    ///
    /// # Errors
    ///
    /// Fails with [`MappingError::InvalidIndex`] if `index` is outside
    /// 0-255, or with an I/O error if the copy or the rewrite fails.
    pub(crate) fn add(&mut self, index: i64, source: &Path) -> Result<u8, MappingError> {
        if !(0..=255).contains(&index) {
            return Err(MappingError::InvalidIndex(index));
        }
        let index = index as u8;

        let target = self.library_target(source);
        fs::copy(source, &target)?;

        self.entries.insert(index, target);
        self.persist()?;

        Ok(index)
    }

    /// Removes the mapping for an index and rewrites the mapping file.
    ///
    /// The managed library copy is left on disk; only the association is
    /// deleted.
    pub(crate) fn remove(&mut self, index: u8) -> Result<(), MappingError> {
        self.entries
            .remove(&index)
            .ok_or(MappingError::NotFound(index))?;
        self.persist()?;

        Ok(())
    }

    /// All mappings, ordered by index ascending.
    pub(crate) fn all(&self) -> impl Iterator<Item = (u8, &Path)> + '_ {
        self.entries.iter().map(|(index, path)| (*index, path.as_path()))
    }

    /// Resolves an index to a playable file.
    ///
    /// Staleness is detected here, at use time: a mapped entry whose file
    /// has been deleted since it was persisted fails with
    /// [`MappingError::MediaUnavailable`].
    pub(crate) fn resolve(&self, index: u8) -> Result<&Path, MappingError> {
        let path = self
            .entries
            .get(&index)
            .ok_or(MappingError::NotFound(index))?;

        if !path.is_file() {
            return Err(MappingError::MediaUnavailable(index));
        }

        Ok(path)
    }

    // Picks a library file name for a source file. Plain file names are kept
    // as-is; when a different import already occupies that name, the copy is
    // tagged with a hash of the source path so imports never clobber each
    // other.
    fn library_target(&self, source: &Path) -> PathBuf {
        let file_name = source.file_name().unwrap_or(OsStr::new("video"));
        let plain = self.library_dir.join(file_name);
        if !plain.exists() {
            return plain;
        }

        let tag = xxh3_64(source.to_string_lossy().as_bytes());
        let stem = plain
            .file_stem()
            .unwrap_or(OsStr::new("video"))
            .to_string_lossy()
            .into_owned();
        let tagged = match plain.extension() {
            Some(ext) => format!("{stem}-{tag:016x}.{}", ext.to_string_lossy()),
            None => format!("{stem}-{tag:016x}"),
        };

        self.library_dir.join(tagged)
    }

    // Rewrites the whole mapping file from the in-memory entries.
    fn persist(&self) -> Result<(), MappingError> {
        let mut out = String::new();
        for (index, path) in &self.entries {
            out.push_str(&format!("{index}={}\n", path.display()));
        }
        fs::write(&self.mappings_file, out)?;

        Ok(())
    }
}

// Parses the persisted mapping file. Unparsable lines and entries pointing
// at files that have since disappeared are skipped, not errors.
fn load_entries(mappings_file: &Path) -> Result<BTreeMap<u8, PathBuf>, MappingError> {
    let text = fs::read_to_string(mappings_file)?;

    let mut entries = BTreeMap::new();
    for line in text.lines() {
        let Some((index, path)) = line.split_once('=') else {
            continue;
        };
        let Ok(index) = index.trim().parse::<u8>() else {
            continue;
        };

        let path = PathBuf::from(path);
        if !path.is_file() {
            eprintln!("plcue: dropping mapping {index}: {} is gone", path.display());
            continue;
        }

        entries.insert(index, path);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really a video").expect("source file");
        path
    }

    #[test]
    fn add_then_all_contains_the_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");
        let source = source_file(dir.path(), "intro.mp4");

        store.add(7, &source).expect("add");

        let all: Vec<_> = store.all().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, 7);
        assert_eq!(all[0].1.file_name().unwrap(), "intro.mp4");
    }

    #[test]
    fn add_rejects_an_out_of_range_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");
        let source = source_file(dir.path(), "intro.mp4");

        assert!(matches!(
            store.add(300, &source),
            Err(MappingError::InvalidIndex(300))
        ));
        assert!(matches!(
            store.add(-1, &source),
            Err(MappingError::InvalidIndex(-1))
        ));
        assert_eq!(store.all().count(), 0);
    }

    #[test]
    fn add_replaces_an_existing_mapping_for_the_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");
        let first = source_file(dir.path(), "first.mp4");
        let second = source_file(dir.path(), "second.mp4");

        store.add(3, &first).expect("add first");
        store.add(3, &second).expect("add second");

        let all: Vec<_> = store.all().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].1.file_name().unwrap(), "second.mp4");
    }

    #[test]
    fn remove_drops_the_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");
        let source = source_file(dir.path(), "intro.mp4");

        store.add(7, &source).expect("add");
        store.remove(7).expect("remove");

        assert_eq!(store.all().count(), 0);
    }

    #[test]
    fn remove_of_an_unmapped_index_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");

        assert!(matches!(store.remove(42), Err(MappingError::NotFound(42))));
    }

    #[test]
    fn entries_survive_a_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = source_file(dir.path(), "intro.mp4");

        {
            let mut store = MappingStore::open(dir.path()).expect("store");
            store.add(5, &source).expect("add");
        }

        let store = MappingStore::open(dir.path()).expect("reopen");
        let all: Vec<_> = store.all().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, 5);
    }

    #[test]
    fn reload_skips_entries_whose_file_is_gone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kept = source_file(dir.path(), "kept.mp4");
        let mappings = dir.path().join(MAPPINGS_FILE);
        fs::write(
            &mappings,
            format!("1={}\n2={}\n", dir.path().join("vanished.mp4").display(), kept.display()),
        )
        .expect("mapping file");

        let store = MappingStore::open(dir.path()).expect("store");
        let all: Vec<_> = store.all().collect();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, 2);
    }

    #[test]
    fn the_first_equals_sign_separates_index_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let odd = source_file(dir.path(), "a=b.mp4");
        let mappings = dir.path().join(MAPPINGS_FILE);
        fs::write(&mappings, format!("9={}\n", odd.display())).expect("mapping file");

        let store = MappingStore::open(dir.path()).expect("store");

        assert!(store.resolve(9).is_ok());
        assert_eq!(store.resolve(9).unwrap().file_name().unwrap(), "a=b.mp4");
    }

    #[test]
    fn imports_with_the_same_file_name_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");

        let first_dir = dir.path().join("one");
        let second_dir = dir.path().join("two");
        fs::create_dir_all(&first_dir).expect("dir");
        fs::create_dir_all(&second_dir).expect("dir");
        let first = source_file(&first_dir, "clip.mp4");
        let second = source_file(&second_dir, "clip.mp4");

        store.add(1, &first).expect("add first");
        store.add(2, &second).expect("add second");

        let paths: Vec<_> = store.all().map(|(_, p)| p.to_path_buf()).collect();
        assert_ne!(paths[0], paths[1]);
    }

    #[test]
    fn resolve_detects_a_deleted_video_at_use_time() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = MappingStore::open(dir.path()).expect("store");
        let source = source_file(dir.path(), "intro.mp4");

        store.add(7, &source).expect("add");
        let managed = store.resolve(7).expect("resolve").to_path_buf();
        fs::remove_file(&managed).expect("delete managed copy");

        assert!(matches!(
            store.resolve(7),
            Err(MappingError::MediaUnavailable(7))
        ));
    }

    #[test]
    fn resolve_of_an_unmapped_index_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MappingStore::open(dir.path()).expect("store");

        assert!(matches!(store.resolve(42), Err(MappingError::NotFound(42))));
    }
}
