use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use qsadmin_core::validation::non_blank;
use qsadmin_core::{Entity, ProductId, Version};

use crate::Product;

// -------------------------
// Input DTOs
// -------------------------

/// Payload for adding a product.
///
/// Required text fields default to empty so that a missing field surfaces as a
/// validation error naming it, not as a decode failure.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductInputDto {
    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 128))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 64))]
    pub sku: String,

    /// Stored as BIGINT in Postgres, so capped at `i64::MAX`.
    #[serde(default)]
    #[validate(range(max = 9223372036854775807u64))]
    pub price: u64,

    #[validate(length(max = 500))]
    pub remark: Option<String>,
}

/// Payload for updating a product; `version` must match the stored record.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductUpdateInputDto {
    pub id: ProductId,

    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 128))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "non_blank"), length(max = 64))]
    pub sku: String,

    #[serde(default)]
    #[validate(range(max = 9223372036854775807u64))]
    pub price: u64,

    #[validate(length(max = 500))]
    pub remark: Option<String>,

    pub version: Version,
}

// -------------------------
// Output DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductOutputDto {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: u64,
    pub remark: Option<String>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductOutputDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id(),
            name: p.name().to_string(),
            sku: p.sku().to_string(),
            price: p.price(),
            remark: p.remark().map(str::to_string),
            version: p.version(),
            created_at: p.created_at(),
            updated_at: p.updated_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsadmin_core::DomainError;

    #[test]
    fn missing_required_fields_are_reported_by_name() {
        let dto: ProductInputDto = serde_json::from_value(serde_json::json!({ "price": 5 })).unwrap();
        let err = DomainError::from(dto.validate().unwrap_err());

        let fields: Vec<_> = err.field_errors().iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "sku"]);
        assert!(err.field_errors().iter().all(|f| f.message == "must not be blank"));
    }

    #[test]
    fn overlong_remark_is_rejected() {
        let dto = ProductInputDto {
            name: "Widget".into(),
            sku: "W-1".into(),
            price: 1,
            remark: Some("x".repeat(501)),
        };
        let err = DomainError::from(dto.validate().unwrap_err());
        assert_eq!(err.field_errors()[0].field, "remark");
    }

    #[test]
    fn update_requires_id_and_version_to_decode() {
        let res: Result<ProductUpdateInputDto, _> =
            serde_json::from_value(serde_json::json!({ "name": "a", "sku": "b" }));
        assert!(res.is_err());
    }

    #[test]
    fn price_above_bigint_range_is_rejected() {
        let mut dto = ProductInputDto {
            name: "Widget".into(),
            sku: "W-1".into(),
            price: i64::MAX as u64,
            remark: None,
        };
        assert!(dto.validate().is_ok());

        dto.price = i64::MAX as u64 + 1;
        let err = DomainError::from(dto.validate().unwrap_err());
        assert_eq!(err.field_errors()[0].field, "price");
    }
}
