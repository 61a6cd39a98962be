//! SQLite catalog store

use crate::catalog::schema::initialize_schema;
use crate::catalog::traits::{CatalogStore, StoreResult};
use crate::catalog::Product;
use rusqlite::{params, Connection};
use std::path::Path;

/// Catalog persisted as rows of a `products` table
pub struct SqliteCatalogStore {
    conn: Connection,
}

impl SqliteCatalogStore {
    /// Opens or creates the catalog database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn load(&self) -> StoreResult<Vec<Product>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, price, image_path FROM products ORDER BY position")?;

        let products = stmt
            .query_map([], |row| {
                Ok(Product::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for product in &products {
            product.validate()?;
        }

        Ok(products)
    }

    fn save(&mut self, products: &[Product]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM products", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (position, title, price, image_path) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, product) in products.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    product.title(),
                    product.price(),
                    product.image_path()
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} products to SQLite catalog", products.len());
        Ok(())
    }
}
