//! Reference database connection management

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{Error, Result};

/// Read-only handle on the local reference database
pub struct HerbDatabase {
    conn: Connection,
}

impl HerbDatabase {
    /// Open an existing reference database without write access
    ///
    /// A missing file is a configuration problem; it is never created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Config(format!(
                "Reference database not found at {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!("Opened reference database at {}", path.display());

        Ok(Self { conn })
    }

    /// Open a writable in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_missing_file_is_config_error() {
        let tmp = tempdir().unwrap();
        let err = HerbDatabase::open(tmp.path().join("herbs.db"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(ref message) if message.contains("herbs.db")));
        assert!(!tmp.path().join("herbs.db").exists());
    }

    #[test]
    fn open_existing_file_is_read_only() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("herbs.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch("CREATE TABLE herbs (id INTEGER PRIMARY KEY, 名称 TEXT)")
                .unwrap();
        }

        let db = HerbDatabase::open(&db_path).unwrap();
        let write = db
            .connection()
            .execute("INSERT INTO herbs (名称) VALUES ('当归')", []);
        assert!(write.is_err());
    }
}
