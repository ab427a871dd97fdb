//! SQLite persistence for discovered links and harvested listings.

use crate::config::ListingMode;
use crate::error::Result;
use crate::results::{ListingRecord, StoredListing};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of recording a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkInsert {
    Inserted,
    AlreadyPresent,
}

/// Outcome of recording a batch of links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkBatch {
    pub inserted: usize,
    pub already_present: usize,
    pub failed: usize,
}

/// SQLite-backed store. Every operation opens its own connection.
#[derive(Debug, Clone)]
pub struct Repository {
    db_path: PathBuf,
    mode: ListingMode,
}

impl Repository {
    /// Open (creating if needed) the store at `db_path` in append mode
    pub fn new(db_path: &Path) -> Result<Self> {
        Self::with_mode(db_path, ListingMode::Append)
    }

    pub fn with_mode(db_path: &Path, mode: ListingMode) -> Result<Self> {
        let repo = Self {
            db_path: db_path.to_path_buf(),
            mode,
        };
        repo.init_schema()?;
        Ok(repo)
    }

    pub fn mode(&self) -> ListingMode {
        self.mode
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS Link (
                link_id INTEGER PRIMARY KEY,
                link_url TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS Mobiles (
                mob_id INTEGER PRIMARY KEY,
                name TEXT,
                price INTEGER,
                location TEXT,
                date TEXT,
                description TEXT,
                links TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_mobiles_links ON Mobiles(links);
        "#,
        )?;
        Ok(())
    }

    /// Insert-or-ignore keyed on the URL
    pub fn record_link(&self, url: &str) -> Result<LinkInsert> {
        let conn = self.connect()?;
        Ok(insert_link(&conn, url)?)
    }

    /// Records a batch in one transaction; a failing row is logged and skipped
    pub fn record_links(&self, urls: &[String]) -> Result<LinkBatch> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut batch = LinkBatch::default();

        for url in urls {
            match insert_link(&tx, url) {
                Ok(LinkInsert::Inserted) => batch.inserted += 1,
                Ok(LinkInsert::AlreadyPresent) => batch.already_present += 1,
                Err(e) => {
                    ::log::warn!("Error inserting link {}: {}", url, e);
                    batch.failed += 1;
                }
            }
        }

        tx.commit()?;
        ::log::debug!(
            "Recorded links: {} new, {} already present",
            batch.inserted,
            batch.already_present
        );
        Ok(batch)
    }

    /// Stores a harvested record and returns its row id.
    ///
    /// The price is reduced to its digits first. In append mode every call adds
    /// a row; in upsert mode rows for the same link are overwritten.
    pub fn record_listing(&self, record: &ListingRecord) -> Result<i64> {
        let mut conn = self.connect()?;
        let price = record.normalized_price();

        let id = match self.mode {
            ListingMode::Append => insert_listing(&conn, record, price)?,
            ListingMode::UpsertByLink => {
                let tx = conn.transaction()?;
                let id = upsert_listing(&tx, record, price)?;
                tx.commit()?;
                id
            }
        };

        ::log::info!("Inserted data for {} into the Mobiles table", record.name);
        Ok(id)
    }

    /// All stored link URLs, oldest first
    pub fn links(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT link_url FROM Link ORDER BY link_id")?;
        let links = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(links)
    }

    /// All stored listings, oldest first
    pub fn listings(&self) -> Result<Vec<StoredListing>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT mob_id, name, price, location, date, description, links
             FROM Mobiles ORDER BY mob_id",
        )?;
        let listings = stmt
            .query_map([], |row| {
                Ok(StoredListing {
                    id: row.get("mob_id")?,
                    name: row.get("name")?,
                    price: row.get("price")?,
                    location: row.get("location")?,
                    listed_at: row.get("date")?,
                    description: row.get("description")?,
                    link: row.get("links")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(listings)
    }
}

fn insert_link(conn: &Connection, url: &str) -> rusqlite::Result<LinkInsert> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO Link (link_url) VALUES (?1)",
        params![url],
    )?;
    Ok(if changed == 1 {
        LinkInsert::Inserted
    } else {
        LinkInsert::AlreadyPresent
    })
}

fn insert_listing(
    conn: &Connection,
    record: &ListingRecord,
    price: Option<i64>,
) -> rusqlite::Result<i64> {
    conn.execute(
        r#"
        INSERT INTO Mobiles (name, price, location, date, description, links)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            record.name,
            price,
            record.location,
            record.listed_at,
            record.description,
            record.link,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn upsert_listing(
    tx: &Transaction<'_>,
    record: &ListingRecord,
    price: Option<i64>,
) -> rusqlite::Result<i64> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT MAX(mob_id) FROM Mobiles WHERE links = ?1",
            params![record.link],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    let Some(id) = existing else {
        return insert_listing(tx, record, price);
    };

    tx.execute(
        r#"
        UPDATE Mobiles
        SET name = ?1, price = ?2, location = ?3, date = ?4, description = ?5
        WHERE links = ?6
        "#,
        params![
            record.name,
            price,
            record.location,
            record.listed_at,
            record.description,
            record.link,
        ],
    )?;
    Ok(id)
}
