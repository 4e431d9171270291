use crate::geo::Coordinate;
use crate::models::{CorkageType, Restaurant};
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

const SELECT_RESTAURANT: &str = "SELECT id, name, location1, location2, address, map_lat, map_lng,
        corkage_type, corkage_fee, website, updated_at FROM restaurants";

/// Local stand-in for the hosted restaurant store.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS restaurants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                location1 TEXT NOT NULL DEFAULT '',
                location2 TEXT NOT NULL DEFAULT '',
                address TEXT,
                map_lat REAL,
                map_lng REAL,
                corkage_type TEXT NOT NULL DEFAULT 'paid',
                corkage_fee INTEGER NOT NULL DEFAULT 0,
                website TEXT,
                updated_at TEXT
            )",
            [],
        )?;
        Ok(())
    }

    pub fn import_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| eyre!("Missing CSV {}: {}", path.display(), e))?;
        let count = self.import_reader(BufReader::new(file))?;
        info!("Imported {} restaurants from {}", count, path.display());
        Ok(count)
    }

    /// Upserts every usable row of a restaurant CSV in a single transaction.
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find_col = |name: &str| {
            headers.iter().position(|h| {
                let clean_h = h.trim_start_matches('\u{feff}').trim().to_lowercase();
                clean_h == name
            })
        };

        let idx_id = find_col("id").ok_or_else(|| {
            eyre!("CSV Error: Could not find 'id' column. Found: {:?}", headers)
        })?;
        let idx_name = find_col("name").ok_or_else(|| {
            eyre!("CSV Error: Could not find 'name' column. Found: {:?}", headers)
        })?;
        let idx_loc1 = find_col("location1");
        let idx_loc2 = find_col("location2");
        let idx_addr = find_col("address");
        let idx_lat = find_col("map_lat");
        let idx_lng = find_col("map_lng");
        let idx_type = find_col("corkage_type");
        let idx_fee = find_col("corkage_fee");
        let idx_web = find_col("website");

        let tx = self.conn.unchecked_transaction()?;
        let mut imported = 0;
        for (line, result) in rdr.records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping unreadable CSV row {}: {}", line + 2, e);
                    continue;
                }
            };

            let field = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };

            let (Some(id), Some(name)) = (field(Some(idx_id)), field(Some(idx_name))) else {
                warn!("Skipping CSV row {} without id or name", line + 2);
                continue;
            };

            let corkage_type = match field(idx_type).map(str::parse::<CorkageType>) {
                Some(Ok(t)) => t,
                Some(Err(e)) => {
                    warn!("Row {}: {}, assuming paid", line + 2, e);
                    CorkageType::Paid
                }
                None => CorkageType::default(),
            };

            let restaurant = Restaurant {
                id: id.to_string(),
                name: name.to_string(),
                location1: field(idx_loc1).unwrap_or("").to_string(),
                location2: field(idx_loc2).unwrap_or("").to_string(),
                address: field(idx_addr).map(String::from),
                map_lat: field(idx_lat).and_then(|s| s.parse().ok()),
                map_lng: field(idx_lng).and_then(|s| s.parse().ok()),
                corkage_type,
                corkage_fee: field(idx_fee).and_then(|s| s.parse().ok()).unwrap_or(0),
                website: field(idx_web).map(String::from),
                updated_at: Some(Utc::now().to_rfc3339()),
            };
            upsert(&tx, &restaurant)?;
            imported += 1;
        }
        tx.commit()?;
        Ok(imported)
    }

    pub fn upsert(&self, restaurant: &Restaurant) -> Result<()> {
        upsert(&self.conn, restaurant)
    }

    pub fn restaurants(&self) -> Result<Vec<Restaurant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_RESTAURANT} ORDER BY name"))?;
        let rows = stmt.query_map([], restaurant_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn restaurant(&self, id: &str) -> Result<Option<Restaurant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_RESTAURANT} WHERE id = ?"))?;
        Ok(stmt.query_row([id], restaurant_from_row).optional()?)
    }

    /// Overwrites the stored map coordinate. Returns false when no row has `id`.
    pub fn update_location(&self, id: &str, coordinate: Coordinate) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE restaurants SET map_lat = ?1, map_lng = ?2, updated_at = ?3 WHERE id = ?4",
            params![coordinate.lat, coordinate.lng, Utc::now().to_rfc3339(), id],
        )?;
        Ok(changed > 0)
    }
}

fn upsert(conn: &Connection, r: &Restaurant) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO restaurants VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            r.id,
            r.name,
            r.location1,
            r.location2,
            r.address,
            r.map_lat,
            r.map_lng,
            r.corkage_type.as_str(),
            r.corkage_fee,
            r.website,
            r.updated_at,
        ],
    )?;
    Ok(())
}

fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    let corkage_type: String = row.get(7)?;
    Ok(Restaurant {
        id: row.get(0)?,
        name: row.get(1)?,
        location1: row.get(2)?,
        location2: row.get(3)?,
        address: row.get(4)?,
        map_lat: row.get(5)?,
        map_lng: row.get(6)?,
        corkage_type: corkage_type.parse().unwrap_or_default(),
        corkage_fee: row.get(8)?,
        website: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
