use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use qsadmin_core::{DomainError, DomainResult, Entity, ProductId, Repository};

use crate::{Product, ProductInputDto, ProductOutputDto, ProductUpdateInputDto};

/// Get / Add / Update / Delete over the product repository.
#[derive(Clone)]
pub struct ProductService {
    repo: Arc<dyn Repository<Product>>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn Repository<Product>>) -> Self {
        Self { repo }
    }

    pub async fn get(&self) -> DomainResult<Vec<ProductOutputDto>> {
        Ok(self
            .repo
            .list()
            .await?
            .into_iter()
            .map(ProductOutputDto::from)
            .collect())
    }

    pub async fn get_by_id(&self, id: ProductId) -> DomainResult<ProductOutputDto> {
        self.repo
            .get(id)
            .await?
            .map(ProductOutputDto::from)
            .ok_or_else(|| DomainError::not_found(Product::KIND, id))
    }

    pub async fn add(&self, dto: ProductInputDto) -> DomainResult<ProductId> {
        dto.validate()?;

        let id = ProductId::new();
        let product = Product::create(id, &dto.name, &dto.sku, dto.price, dto.remark.as_deref(), Utc::now());
        self.repo.insert(product).await?;

        tracing::info!(product_id = %id, sku = %dto.sku.trim(), "product added");
        Ok(id)
    }

    pub async fn update(&self, dto: ProductUpdateInputDto) -> DomainResult<ProductOutputDto> {
        dto.validate()?;

        let current = self
            .repo
            .get(dto.id)
            .await?
            .ok_or_else(|| DomainError::not_found(Product::KIND, dto.id))?;
        if current.version() != dto.version {
            return Err(DomainError::conflict(Product::KIND, dto.id, dto.version, current.version()));
        }

        let revised = current.revise(&dto.name, &dto.sku, dto.price, dto.remark.as_deref(), Utc::now());
        let stored = self.repo.update(revised, dto.version).await?;

        tracing::info!(product_id = %dto.id, version = %stored.version(), "product updated");
        Ok(stored.into())
    }

    pub async fn delete(&self, id: ProductId) -> DomainResult<()> {
        self.repo.delete(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
