//! Herb lookup repository implementation

use rusqlite::{params, Connection};

use crate::config::ReferenceTableConfig;
use crate::error::{Error, Result};
use crate::models::HerbRecord;

/// Number of leading columns read positionally into a [`HerbRecord`]
const RECORD_COLUMNS: usize = 4;

/// Trait for reference lookups
pub trait HerbRepository {
    /// Find records whose name contains `query`, ordered by id
    ///
    /// `limit == 0` returns every match.
    fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<HerbRecord>>;

    /// Column names of the reference table, in declaration order
    fn columns(&self) -> Result<Vec<String>>;
}

/// `SQLite` implementation of `HerbRepository`
pub struct SqliteHerbRepository<'a> {
    conn: &'a Connection,
    schema: &'a ReferenceTableConfig,
}

impl<'a> SqliteHerbRepository<'a> {
    /// Create a new repository over the given connection and table shape
    pub const fn new(conn: &'a Connection, schema: &'a ReferenceTableConfig) -> Self {
        Self { conn, schema }
    }

    /// Fail with `SchemaMismatch` unless the table can back a lookup
    fn check_schema(&self) -> Result<()> {
        let columns = self.columns()?;
        let table = &self.schema.table;

        if columns.is_empty() {
            return Err(Error::SchemaMismatch(format!(
                "no such table '{table}'"
            )));
        }
        if !columns.iter().any(|column| column == &self.schema.name_column) {
            return Err(Error::SchemaMismatch(format!(
                "no such column '{}' in table '{table}' (available: {})",
                self.schema.name_column,
                columns.join(", ")
            )));
        }
        if columns.len() < RECORD_COLUMNS {
            return Err(Error::SchemaMismatch(format!(
                "table '{table}' has {} columns, expected at least {RECORD_COLUMNS} (id, name, effect, organ)",
                columns.len()
            )));
        }
        Ok(())
    }

    fn parse_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<HerbRecord> {
        Ok(HerbRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            effect: row.get(2)?,
            associated_organ: row.get(3)?,
        })
    }
}

impl HerbRepository for SqliteHerbRepository<'_> {
    fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<HerbRecord>> {
        self.check_schema()?;

        let sql = format!(
            "SELECT * FROM {} WHERE {} LIKE ?1 ESCAPE '\\' ORDER BY 1 LIMIT ?2",
            quote_identifier(&self.schema.table),
            quote_identifier(&self.schema.name_column),
        );
        let pattern = format!("%{}%", escape_like(query));
        let limit = if limit == 0 {
            -1
        } else {
            i64::try_from(limit).unwrap_or(i64::MAX)
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![pattern, limit], Self::parse_record)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|error| self.row_error(error))?;

        tracing::debug!(
            "Lookup for {:?} in '{}' matched {} records",
            query,
            self.schema.table,
            records.len()
        );
        Ok(records)
    }

    fn columns(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map(params![self.schema.table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

impl SqliteHerbRepository<'_> {
    fn row_error(&self, error: rusqlite::Error) -> Error {
        match error {
            rusqlite::Error::InvalidColumnType(index, column, kind) => {
                Error::SchemaMismatch(format!(
                    "column {index} ('{column}') of table '{}' holds {kind} values that do not fit a herb record",
                    self.schema.table
                ))
            }
            rusqlite::Error::FromSqlConversionFailure(index, kind, source) => {
                Error::SchemaMismatch(format!(
                    "column {index} of table '{}' holds {kind} values that do not fit a herb record: {source}",
                    self.schema.table
                ))
            }
            other => Error::Database(other),
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape LIKE wildcards so the query is matched as a literal substring
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::HerbDatabase;
    use pretty_assertions::assert_eq;

    fn setup() -> HerbDatabase {
        let db = HerbDatabase::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE herbs (
                    id INTEGER PRIMARY KEY,
                    名称 TEXT NOT NULL,
                    功效 TEXT,
                    对应脏腑 TEXT
                );
                INSERT INTO herbs VALUES (1, '当归片', '补血活血', '肝');
                INSERT INTO herbs VALUES (2, '黄芪', '补气升阳', '脾');
                INSERT INTO herbs VALUES (3, '全当归', NULL, NULL);
                INSERT INTO herbs VALUES (4, '100%纯_粉', '测试', '无');",
            )
            .unwrap();
        db
    }

    #[test]
    fn substring_match_returns_record() {
        let db = setup();
        let schema = ReferenceTableConfig::default();
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        let results = repo.search_by_name("当归", 10).unwrap();
        assert_eq!(
            results,
            vec![
                HerbRecord {
                    id: 1,
                    name: "当归片".to_string(),
                    effect: Some("补血活血".to_string()),
                    associated_organ: Some("肝".to_string()),
                },
                HerbRecord {
                    id: 3,
                    name: "全当归".to_string(),
                    effect: None,
                    associated_organ: None,
                },
            ]
        );
    }

    #[test]
    fn unknown_name_returns_nothing() {
        let db = setup();
        let schema = ReferenceTableConfig::default();
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        assert!(repo.search_by_name("不存在的药材", 10).unwrap().is_empty());
    }

    #[test]
    fn wildcards_in_query_are_literal() {
        let db = setup();
        let schema = ReferenceTableConfig::default();
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        let percent = repo.search_by_name("%", 10).unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].id, 4);

        let underscore = repo.search_by_name("纯_", 10).unwrap();
        assert_eq!(underscore.len(), 1);
        assert!(repo.search_by_name("_", 10).unwrap().len() == 1);
    }

    #[test]
    fn limit_caps_results_and_zero_means_all() {
        let db = setup();
        let schema = ReferenceTableConfig::default();
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        assert_eq!(repo.search_by_name("", 2).unwrap().len(), 2);
        assert_eq!(repo.search_by_name("", 0).unwrap().len(), 4);
    }

    #[test]
    fn missing_name_column_is_schema_mismatch() {
        let db = setup();
        let schema = ReferenceTableConfig {
            table: "herbs".to_string(),
            name_column: "药材名称".to_string(),
        };
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        match repo.search_by_name("当归", 10).unwrap_err() {
            Error::SchemaMismatch(message) => {
                assert!(message.contains("药材名称"));
                assert!(message.contains("名称, 功效, 对应脏腑"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_table_is_schema_mismatch() {
        let db = setup();
        let schema = ReferenceTableConfig {
            table: "materia".to_string(),
            name_column: "名称".to_string(),
        };
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        let err = repo.search_by_name("当归", 10).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(ref message) if message.contains("materia")));
    }

    #[test]
    fn narrow_table_is_schema_mismatch() {
        let db = HerbDatabase::open_in_memory().unwrap();
        db.connection()
            .execute_batch("CREATE TABLE herbs (id INTEGER PRIMARY KEY, 名称 TEXT)")
            .unwrap();
        let schema = ReferenceTableConfig::default();
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        let err = repo.search_by_name("当归", 10).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(ref message) if message.contains("at least 4")));
    }

    #[test]
    fn non_integer_id_is_schema_mismatch() {
        let db = HerbDatabase::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE herbs (code TEXT, 名称 TEXT, 功效 TEXT, 对应脏腑 TEXT);
                 INSERT INTO herbs VALUES ('A-1', '当归', '补血', '肝');",
            )
            .unwrap();
        let schema = ReferenceTableConfig::default();
        let repo = SqliteHerbRepository::new(db.connection(), &schema);

        let err = repo.search_by_name("当归", 10).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)), "{err:?}");
    }

    #[test]
    fn escape_like_prefixes_wildcards() {
        assert_eq!(escape_like(r"a%b_c\d"), r"a\%b\_c\\d");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
