use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::codec::{decode, encode};
use crate::{ReadError, Retention, Snapshot, StoragePort, WriteError};

/// Durable backend: one JSON document per key under a root directory.
///
/// Writes land in a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves either the old or the new document.
///
/// Keys are escaped into file names. An escaped name longer than
/// [`MAX_STEM`] bytes is shortened to a prefix plus a BLAKE3 digest of the
/// whole key, so long keys stay under common file-name limits.
pub struct FileStorage {
    root: PathBuf,
    // Serializes writers within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log::debug!("durable storage at {}", root.display());
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", escape_key(key)))
    }
}

/// Longest escaped stem used verbatim as a file name.
pub const MAX_STEM: usize = 120;
const HASHED_PREFIX: usize = 64;

/// Map any key to a file-name-safe stem; distinct keys stay distinct.
///
/// `~` never comes out of escaping, so hashed stems cannot collide with
/// escaped ones.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    if out.is_empty() {
        out.push('%');
    }
    if out.len() > MAX_STEM {
        let digest = blake3::hash(key.as_bytes()).to_hex();
        out.truncate(HASHED_PREFIX);
        out.push('~');
        out.push_str(&digest.as_str()[..32]);
    }
    out
}

impl StoragePort for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Snapshot>, ReadError> {
        match fs::read(self.path_for(key)) {
            Ok(raw) => decode(key, &raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ReadError::Unavailable {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), WriteError> {
        let doc = encode(key, snapshot)?;
        let io_err = |source| WriteError::Io {
            key: key.to_string(),
            source,
        };

        let _guard = self.lock.lock();
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp).map_err(io_err)?;
        f.write_all(doc.as_bytes()).map_err(io_err)?;
        f.sync_all().map_err(io_err)?;
        drop(f);
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), WriteError> {
        let _guard = self.lock.lock();
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(WriteError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn retention(&self) -> Retention {
        Retention::Durable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let s = FileStorage::open(dir.path()).unwrap();
            s.write("datastore", &json!({"count": 2})).unwrap();
        }
        let s = FileStorage::open(dir.path()).unwrap();
        assert_eq!(s.read("datastore").unwrap(), Some(json!({"count": 2})));
        assert_eq!(s.retention(), Retention::Durable);
    }

    #[test]
    fn odd_keys_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::open(dir.path()).unwrap();
        s.write("a/b", &json!(1)).unwrap();
        s.write("a%2Fb", &json!(2)).unwrap();
        s.write("", &json!(3)).unwrap();

        assert_eq!(s.read("a/b").unwrap(), Some(json!(1)));
        assert_eq!(s.read("a%2Fb").unwrap(), Some(json!(2)));
        assert_eq!(s.read("").unwrap(), Some(json!(3)));
        assert!(s.path_for("a/b").starts_with(dir.path()));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::open(dir.path()).unwrap();
        s.write("k", &json!({"v": true})).unwrap();
        s.remove("k").unwrap();
        s.remove("k").unwrap();
        assert_eq!(s.read("k").unwrap(), None);
    }

    #[test]
    fn truncated_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::open(dir.path()).unwrap();
        fs::write(s.path_for("k"), "{\"count\": ").unwrap();
        assert!(matches!(s.read("k"), Err(ReadError::Malformed { .. })));
    }

    #[test]
    fn non_utf8_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::open(dir.path()).unwrap();
        fs::write(s.path_for("k"), [0xff, 0xfe]).unwrap();
        assert!(matches!(s.read("k"), Err(ReadError::Malformed { .. })));
    }

    #[test]
    fn unreadable_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::open(dir.path()).unwrap();
        fs::create_dir(s.path_for("k")).unwrap();
        assert!(matches!(s.read("k"), Err(ReadError::Unavailable { .. })));
    }

    #[test]
    fn long_keys_get_bounded_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStorage::open(dir.path()).unwrap();
        let long = "ключ".repeat(100);
        let longer = format!("{long}!");

        for key in [&long, &longer] {
            let name = s.path_for(key).file_name().unwrap().len();
            assert!(name <= MAX_STEM + ".json".len(), "{name}");
        }
        assert_ne!(s.path_for(&long), s.path_for(&longer));

        s.write(&long, &json!({"n": 1})).unwrap();
        s.write(&longer, &json!({"n": 2})).unwrap();
        assert_eq!(s.read(&long).unwrap(), Some(json!({"n": 1})));
        assert_eq!(s.read(&longer).unwrap(), Some(json!({"n": 2})));
    }
}
