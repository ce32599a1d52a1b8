use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use qsadmin_core::{DomainResult, Entity, ProductId, Repository, Version};
use qsadmin_products::Product;

use super::{delete_by_id, from_db, missed_update, storage_error, to_db};

const TABLE: &str = "products";

#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode(row: &PgRow) -> DomainResult<Product> {
    let get = |e| storage_error("product.decode", e);
    Ok(Product::restore(
        ProductId::from_uuid(row.try_get("id").map_err(get)?),
        row.try_get("name").map_err(get)?,
        row.try_get("sku").map_err(get)?,
        from_db("price", row.try_get("price").map_err(get)?)?,
        row.try_get("remark").map_err(get)?,
        Version::from(from_db("version", row.try_get("version").map_err(get)?)?),
        row.try_get("created_at").map_err(get)?,
        row.try_get("updated_at").map_err(get)?,
    ))
}

#[async_trait]
impl Repository<Product> for PgProductRepository {
    async fn list(&self) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, name, sku, price, remark, version, created_at, updated_at FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("product.list", e))?;
        rows.iter().map(decode).collect()
    }

    async fn get(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, name, sku, price, remark, version, created_at, updated_at FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("product.get", e))?;
        row.as_ref().map(decode).transpose()
    }

    async fn insert(&self, product: Product) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, price, remark, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(product.name())
        .bind(product.sku())
        .bind(to_db("price", product.price())?)
        .bind(product.remark())
        .bind(to_db("version", product.version().get())?)
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("product.insert", e))?;
        Ok(())
    }

    async fn update(&self, mut product: Product, expected: Version) -> DomainResult<Product> {
        let next = expected.next();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $3, sku = $4, price = $5, remark = $6, updated_at = $7, version = $8
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(product.id().as_uuid())
        .bind(to_db("version", expected.get())?)
        .bind(product.name())
        .bind(product.sku())
        .bind(to_db("price", product.price())?)
        .bind(product.remark())
        .bind(product.updated_at())
        .bind(to_db("version", next.get())?)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("product.update", e))?;

        if result.rows_affected() == 0 {
            return Err(missed_update(&self.pool, TABLE, Product::KIND, *product.id().as_uuid(), expected).await);
        }
        product.set_version(next);
        Ok(product)
    }

    async fn delete(&self, id: ProductId) -> DomainResult<()> {
        delete_by_id(&self.pool, TABLE, Product::KIND, *id.as_uuid()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::test_support;
    use chrono::Utc;
    use qsadmin_core::DomainError;

    #[tokio::test]
    async fn guarded_update_and_delete_against_postgres() {
        let Some(pool) = test_support::pool().await else {
            return;
        };
        let repo = PgProductRepository::new(pool);
        let p = Product::create(ProductId::new(), "Widget", "W-1", 990, None, Utc::now());
        repo.insert(p.clone()).await.unwrap();

        let stored = repo
            .update(p.revise("Gadget", "G-1", 1200, None, Utc::now()), Version::INITIAL)
            .await
            .unwrap();
        assert_eq!(stored.version(), Version::from(2));

        let stale = repo.update(p.clone(), Version::INITIAL).await.unwrap_err();
        assert!(matches!(stale, DomainError::ConcurrencyConflict { .. }));
        assert_eq!(repo.get(p.id()).await.unwrap().unwrap().name(), "Gadget");

        repo.delete(p.id()).await.unwrap();
        assert!(matches!(repo.delete(p.id()).await, Err(DomainError::NotFound { .. })));
        assert!(matches!(
            repo.update(p, Version::from(2)).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
