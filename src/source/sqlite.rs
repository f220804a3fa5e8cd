use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, OpenFlags, Row, params};

use super::{LayoutSource, WordSource};
use crate::layout::{ComposeError, ComposeResult};
use crate::model::{LineKind, LineRecord, VerseKey, WordRecord};

const LINE_COLUMNS: &str = "page_number, line_number, line_type, is_centered, first_word_id, last_word_id, surah_number";

/// Source databases are never written; each worker opens its own handle.
pub fn open_read_only(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))?;

    connection
        .pragma_update(None, "query_only", true)
        .with_context(|| format!("failed to set query_only for {}", db_path.display()))?;

    Ok(connection)
}

/// Line layout backed by the `pages` table.
pub struct SqliteLayout {
    connection: Connection,
}

/// Word text backed by the `words` table.
pub struct SqliteWords {
    connection: Connection,
}

#[derive(Debug)]
struct RawLine {
    page_number: i64,
    line_number: i64,
    line_type: String,
    is_centered: Option<i64>,
    first_word_id: Option<i64>,
    last_word_id: Option<i64>,
    surah_number: Option<i64>,
}

impl SqliteLayout {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::from_connection(open_read_only(db_path)?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    fn query_lines(&self, sql: &str, page_filter: Option<u16>) -> ComposeResult<Vec<LineRecord>> {
        let mut statement = self.connection.prepare_cached(sql)?;
        let mut rows = match page_filter {
            Some(page_number) => statement.query(params![page_number])?,
            None => statement.query([])?,
        };

        let mut out = Vec::<LineRecord>::new();
        while let Some(row) = rows.next()? {
            out.push(decode_line(read_raw_line(row)?)?);
        }

        Ok(out)
    }
}

impl LayoutSource for SqliteLayout {
    fn fetch_lines(&self, page_number: u16) -> ComposeResult<Vec<LineRecord>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM pages WHERE page_number = ?1 ORDER BY line_number ASC"
        );
        self.query_lines(&sql, Some(page_number))
    }

    fn fetch_section_titles(&self) -> ComposeResult<Vec<LineRecord>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM pages WHERE line_type = 'surah_name'
             ORDER BY page_number ASC, line_number ASC"
        );
        self.query_lines(&sql, None)
    }
}

impl SqliteWords {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::from_connection(open_read_only(db_path)?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }
}

impl WordSource for SqliteWords {
    fn fetch_words(&self, first_index: i64, last_index: i64) -> ComposeResult<Vec<WordRecord>> {
        let mut statement = self.connection.prepare_cached(
            "
            SELECT word_index, word_key, text
            FROM words
            WHERE word_index BETWEEN ?1 AND ?2
            ORDER BY word_index ASC
            ",
        )?;

        let mut rows = statement.query(params![first_index, last_index])?;
        let mut out = Vec::<WordRecord>::new();

        while let Some(row) = rows.next()? {
            let index: i64 = row.get(0)?;
            let raw_key: String = row.get(1)?;
            let text: Option<String> = row.get(2)?;

            let key = raw_key
                .parse::<VerseKey>()
                .map_err(|detail| ComposeError::InvalidRecord {
                    detail: format!("word {index}: {detail}"),
                })?;

            out.push(WordRecord {
                index,
                key,
                text: text.unwrap_or_default(),
                is_last_word_of_verse: false,
            });
        }

        Ok(out)
    }

    fn word_exists(&self, key: VerseKey) -> ComposeResult<bool> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT EXISTS(SELECT 1 FROM words WHERE word_key = ?1)")?;
        let exists: bool = statement.query_row(params![key.to_string()], |row| row.get(0))?;
        Ok(exists)
    }
}

fn read_raw_line(row: &Row<'_>) -> rusqlite::Result<RawLine> {
    Ok(RawLine {
        page_number: row.get(0)?,
        line_number: row.get(1)?,
        line_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        is_centered: optional_int(row, 3)?,
        first_word_id: optional_int(row, 4)?,
        last_word_id: optional_int(row, 5)?,
        surah_number: optional_int(row, 6)?,
    })
}

fn decode_line(raw: RawLine) -> ComposeResult<LineRecord> {
    let page_number = narrow(raw.page_number, "page_number")?;
    let line_number = narrow(raw.line_number, "line_number")?;

    let kind =
        LineKind::from_stored(&raw.line_type).ok_or_else(|| ComposeError::UnknownLineKind {
            page: page_number,
            line: line_number,
            kind: raw.line_type.clone(),
        })?;

    let word_range = match (raw.first_word_id, raw.last_word_id) {
        (Some(first), Some(last)) => Some((first, last)),
        _ => None,
    };

    let surah_number = raw
        .surah_number
        .map(|value| narrow(value, "surah_number"))
        .transpose()?;

    Ok(LineRecord {
        page_number,
        line_number,
        kind,
        centered: raw.is_centered.unwrap_or(0) != 0,
        word_range,
        surah_number,
    })
}

fn narrow(value: i64, column: &str) -> ComposeResult<u16> {
    u16::try_from(value).map_err(|_| ComposeError::InvalidRecord {
        detail: format!("{column} value {value} is out of range"),
    })
}

/// Layout exports store absent numbers as either NULL or an empty string.
fn optional_int(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(value) => Ok(Some(value)),
        ValueRef::Real(value) => Ok(Some(value as i64)),
        ValueRef::Text(raw) => {
            let text = String::from_utf8_lossy(raw);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<i64>().map(Some).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
            })
        }
        ValueRef::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            format!("column {idx}"),
            Type::Blob,
        )),
    }
}
