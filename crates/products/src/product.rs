use chrono::{DateTime, Utc};

use qsadmin_core::{Entity, ProductId, Version};

/// Catalog product record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    sku: String,
    /// Price in the smallest currency unit (e.g. cents).
    price: u64,
    remark: Option<String>,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// A new, not-yet-persisted product at the initial version.
    ///
    /// Inputs are expected to be validated already; text fields are trimmed.
    pub fn create(id: ProductId, name: &str, sku: &str, price: u64, remark: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            sku: sku.trim().to_string(),
            price,
            remark: normalize(remark),
            version: Version::INITIAL,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a product from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ProductId,
        name: String,
        sku: String,
        price: u64,
        remark: Option<String>,
        version: Version,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            sku,
            price,
            remark,
            version,
            created_at,
            updated_at,
        }
    }

    /// Copy with replaced mutable fields. Identity, version and creation time are kept.
    pub fn revise(&self, name: &str, sku: &str, price: u64, remark: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            name: name.trim().to_string(),
            sku: sku.trim().to_string(),
            price,
            remark: normalize(remark),
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn normalize(remark: Option<&str>) -> Option<String> {
    remark.map(str::trim).filter(|r| !r.is_empty()).map(str::to_string)
}

impl Entity for Product {
    type Id = ProductId;
    const KIND: &'static str = "product";

    fn id(&self) -> ProductId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_trims_and_starts_at_initial_version() {
        let now = Utc::now();
        let p = Product::create(ProductId::new(), "  Widget ", " W-1 ", 990, Some("   "), now);
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.sku(), "W-1");
        assert_eq!(p.remark(), None);
        assert_eq!(p.version(), Version::INITIAL);
        assert_eq!(p.created_at(), p.updated_at());
    }

    #[test]
    fn revise_keeps_identity_version_and_created_at() {
        let t0 = Utc::now();
        let p = Product::create(ProductId::new(), "Widget", "W-1", 990, None, t0);
        let t1 = t0 + chrono::Duration::seconds(5);
        let r = p.revise("Gadget", "G-1", 1500, Some("new"), t1);

        assert_eq!(r.id(), p.id());
        assert_eq!(r.version(), p.version());
        assert_eq!(r.created_at(), t0);
        assert_eq!(r.updated_at(), t1);
        assert_eq!(r.name(), "Gadget");
        assert_eq!(r.remark(), Some("new"));
    }

    proptest! {
        #[test]
        fn blank_remarks_are_dropped(pad in "[ \t]{0,4}", text in "[a-z]{0,6}") {
            let remark = format!("{pad}{text}{pad}");
            let p = Product::create(ProductId::new(), "Widget", "W-1", 1, Some(&remark), Utc::now());
            if text.is_empty() {
                prop_assert_eq!(p.remark(), None);
            } else {
                prop_assert_eq!(p.remark(), Some(text.as_str()));
            }
        }
    }
}
