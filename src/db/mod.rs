/// Declare a record whose fields map one-to-one onto table columns of the
/// same name. Generates the column list, positional SQL values in the same
/// order, and a by-name row reader.
macro_rules! column_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )+
        }

        impl $name {
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];

            pub(crate) fn sql_values(&self) -> Vec<&dyn rusqlite::ToSql> {
                vec![$(&self.$field as &dyn rusqlite::ToSql),+]
            }

            pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
                Ok(Self {
                    $( $field: row.get(stringify!($field))?, )+
                })
            }
        }
    };
}

mod schema;
pub mod albums;
pub mod faces;
pub mod photos;
pub mod query;
pub mod scores;
pub mod tags;

use anyhow::{Context, Result};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;

pub use schema::SCHEMA;
pub use albums::Album;
pub use faces::{Face, FaceBoxError, NewFace, Person};
pub use photos::{Photo, PhotoFields, PhotoState};
pub use scores::PhotoScore;
pub use tags::{Tag, TagKind};

/// Owner of the SQLite connection holding the mirrored catalog.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // Cascades and SET NULL on faces rely on this; it is per connection.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Catalog operations outside any explicit transaction.
    pub fn store(&self) -> Store<'_> {
        Store::new(&self.conn)
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Catalog operations against a borrowed connection.
///
/// Transactions and savepoints deref to [`Connection`], so the same store
/// code runs inside a batch transaction, inside a per-item savepoint, or on
/// the plain connection for reads.
#[derive(Clone, Copy)]
pub struct Store<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Store<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

/// `a.col AS col, ...` for the given columns.
fn select_list(alias: &str, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{alias}.{c} AS {c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn memory_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    pub fn fields(uuid: &str) -> PhotoFields {
        PhotoFields {
            uuid: uuid.to_string(),
            filename: format!("{uuid}.jpg"),
            original_filename: format!("IMG_{uuid}.JPG"),
            is_photo: true,
            ..PhotoFields::default()
        }
    }
}
