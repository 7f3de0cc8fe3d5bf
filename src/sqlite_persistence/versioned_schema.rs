use super::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Column {
            name,
            sql_type,
            primary_key: false,
            not_null: false,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    fn create(&self, conn: &Connection) -> Result<()> {
        let columns: Vec<String> = self.columns.iter().map(Column::definition).collect();
        let sql = format!("CREATE TABLE {} ({});", self.name, columns.join(", "));
        conn.execute(&sql, [])
            .with_context(|| format!("Failed to create table {}", self.name))?;
        Ok(())
    }

    /// Compares the live `(name, declared type)` pairs against the expected
    /// columns, in order.
    fn check(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let expected: Vec<(String, String)> = self
            .columns
            .iter()
            .map(|c| (c.name.to_string(), c.sql_type.as_sql().to_string()))
            .collect();
        let actual: Vec<(String, String)> = actual
            .into_iter()
            .map(|(name, declared)| (name, declared.to_ascii_uppercase()))
            .collect();

        if actual.is_empty() {
            bail!("Table {} is missing", self.name);
        }
        if actual != expected {
            bail!(
                "Table {} has columns {:?}, expected {:?}",
                self.name,
                actual,
                expected
            );
        }
        Ok(())
    }
}

/// One version of a database schema. `migration` upgrades a database at the
/// previous version to this one.
pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.pragma_update(None, "user_version", (BASE_DB_VERSION + self.version) as i64)?;
        Ok(())
    }

    /// Checks that every table exists with the expected column names and types.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        self.tables.iter().try_for_each(|table| table.check(conn))
    }
}

fn user_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?)
}

fn is_empty_database(conn: &Connection) -> Result<bool> {
    let tables: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;
    Ok(tables == 0)
}

/// Brings `conn` to the last schema in `schemas`. An empty database gets the
/// last schema directly; an older one runs each later migration in one
/// transaction.
pub fn migrate_if_needed(
    conn: &mut Connection,
    schemas: &'static [VersionedSchema],
    db_name: &str,
) -> Result<()> {
    let Some(latest) = schemas.last() else {
        bail!("No schema defined for {}", db_name);
    };

    if is_empty_database(conn)? {
        info!("Creating {} schema at version {}", db_name, latest.version);
        return latest.create(conn);
    }

    let stamped = user_version(conn)?;
    let Some(current) = stamped
        .checked_sub(BASE_DB_VERSION as i64)
        .filter(|v| *v >= 0)
        .map(|v| v as usize)
    else {
        bail!(
            "{} has user_version {}, it was not created by this program",
            db_name,
            stamped
        );
    };
    if current > latest.version {
        bail!(
            "{} is at schema version {}, newer than the supported {}",
            db_name,
            current,
            latest.version
        );
    }
    if current == latest.version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in schemas.iter().filter(|s| s.version > current) {
        info!("Migrating {} to version {}", db_name, schema.version);
        if let Some(migrate) = schema.migration {
            migrate(&tx)?;
        }
    }
    tx.pragma_update(None, "user_version", (BASE_DB_VERSION + latest.version) as i64)?;
    tx.commit()?;
    Ok(())
}
