//! Entity kinds served by the catalog

use std::fmt;

use serde::{Deserialize, Serialize};

/// The collections the catalog exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Top-level product category
    Category,
    /// Category child
    SubCategory,
    /// Product brand
    Brand,
    /// Sellable product
    Product,
}

impl EntityKind {
    /// Every kind, in registration order
    pub const ALL: [EntityKind; 4] = [Self::Category, Self::SubCategory, Self::Brand, Self::Product];

    /// Collection name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::SubCategory => "SubCategory",
            Self::Brand => "Brand",
            Self::Product => "Product",
        }
    }

    /// Lowercase plural, used for route segments and upload folders
    #[must_use]
    pub const fn plural(&self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::SubCategory => "subcategories",
            Self::Brand => "brands",
            Self::Product => "products",
        }
    }

    /// Fields a keyword search looks at
    #[must_use]
    pub const fn search_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Product => &["title", "description"],
            Self::Category | Self::SubCategory | Self::Brand => &["name"],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_fields() {
        assert_eq!(EntityKind::Product.search_fields(), &["title", "description"]);
        assert_eq!(EntityKind::Category.search_fields(), &["name"]);
        assert_eq!(EntityKind::Brand.search_fields(), &["name"]);
        assert_eq!(EntityKind::SubCategory.search_fields(), &["name"]);
    }

    #[test]
    fn test_plural() {
        assert_eq!(EntityKind::Category.plural(), "categories");
        assert_eq!(EntityKind::Brand.plural(), "brands");
    }
}
