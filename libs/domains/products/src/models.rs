use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Page returned when the request does not name one
pub const DEFAULT_PAGE: u64 = 1;
/// Page size returned when the request does not name one
pub const DEFAULT_LIMIT: u64 = 12;
/// Largest page size a client may request
pub const MAX_LIMIT: u64 = 100;
/// Highest page a client may request; keeps `(page - 1) * limit` within an SQL BIGINT
pub const MAX_PAGE: u64 = 1_000_000;

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    /// Unique, URL-safe key
    pub slug: String,
    pub name: String,
}

/// Product image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    /// Display position, ascending
    pub order: i32,
}

/// Purchasable size/price combination of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Size token, always uppercase (e.g. "M", "XL")
    pub size: String,
    /// Price in minor currency units
    pub price: i64,
}

/// The only reviewer field ever exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReviewAuthor {
    pub name: String,
}

/// Customer review of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub user: ReviewAuthor,
}

/// Product row without its relations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    /// Unique and immutable; the lookup key for single-product retrieval
    pub slug: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product as it appears in a listing: first image only, all variants, category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub variants: Vec<Variant>,
    pub category: Category,
}

/// Fully populated product: ordered images, variants, category and approved reviews
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub variants: Vec<Variant>,
    pub category: Category,
    pub reviews: Vec<Review>,
}

impl ProductDetail {
    /// Reduce to the listing shape, keeping the lowest-ordered image
    pub fn into_summary(self) -> ProductSummary {
        let first_image = self
            .images
            .into_iter()
            .min_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));

        ProductSummary {
            product: self.product,
            images: first_image.into_iter().collect(),
            variants: self.variants,
            category: self.category,
        }
    }
}

/// One page of a product listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    pub total_pages: u64,
    pub current_page: u64,
    pub total: u64,
}

/// Fields a listing may be sorted by
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Slug,
}

/// Sort direction
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query-string parameters accepted by the product listing.
///
/// Empty values (`?category=`) count as absent. Anything else must parse,
/// otherwise the request is rejected before reaching the repository.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_price_range"))]
pub struct ProductListQuery {
    /// Page number, starting at 1 (default 1, max 1000000)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<u64>,
    /// Page size (default 12, max 100)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    /// Category slug, exact match
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<String>,
    /// Lowest acceptable variant price, minor units
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    /// Highest acceptable variant price, minor units
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    /// Variant size, case-insensitive
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<String>,
    /// Substring of the product color, case-insensitive
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub color: Option<String>,
    /// Sort field (default createdAt)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_by: Option<SortField>,
    /// Sort direction (default desc)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_order: Option<SortOrder>,
}

fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(de)?.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

fn validate_price_range(query: &ProductListQuery) -> Result<(), ValidationError> {
    match (query.min_price, query.max_price) {
        (Some(min), Some(max)) if min > max => Err(ValidationError::new("price_range")
            .with_message(Cow::Borrowed("minPrice must not exceed maxPrice"))),
        _ => Ok(()),
    }
}

impl ProductListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(DEFAULT_PAGE),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn sort(&self) -> ProductSort {
        ProductSort {
            field: self.sort_by.unwrap_or_default(),
            order: self.sort_order.unwrap_or_default(),
        }
    }

    /// Resolve the query into the repository filter.
    ///
    /// Size and price bounds end up in a single [`VariantFilter`], so one
    /// variant has to satisfy all of them at once.
    pub fn filter(&self) -> ProductFilter {
        let variant = VariantFilter {
            size: self.size.as_ref().map(|size| size.to_uppercase()),
            min_price: self.min_price,
            max_price: self.max_price,
        };

        ProductFilter {
            category: self.category.clone(),
            variant: (!variant.is_unbounded()).then_some(variant),
            color: self.color.clone(),
        }
    }
}

/// Constraint that at least one variant of a product must satisfy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantFilter {
    /// Already uppercased
    pub size: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl VariantFilter {
    pub fn is_unbounded(&self) -> bool {
        self.size.is_none() && self.min_price.is_none() && self.max_price.is_none()
    }

    pub fn matches(&self, variant: &Variant) -> bool {
        self.size.as_ref().is_none_or(|size| variant.size == *size)
            && self.min_price.is_none_or(|min| variant.price >= min)
            && self.max_price.is_none_or(|max| variant.price <= max)
    }
}

/// Resolved listing filter handed to the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Category slug, exact match
    pub category: Option<String>,
    pub variant: Option<VariantFilter>,
    /// Case-insensitive substring of the product color
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductSort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Page window of a listing; both values are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(size: &str, price: i64) -> Variant {
        Variant {
            id: Uuid::now_v7(),
            product_id: Uuid::now_v7(),
            size: size.to_string(),
            price,
        }
    }

    #[test]
    fn test_defaults_when_query_is_empty() {
        let query = ProductListQuery::default();

        assert_eq!(query.pagination(), Pagination { page: 1, limit: 12 });
        assert_eq!(
            query.sort(),
            ProductSort {
                field: SortField::CreatedAt,
                order: SortOrder::Desc,
            }
        );
        assert_eq!(query.filter(), ProductFilter::default());
    }

    #[test]
    fn test_size_is_uppercased_and_merged_with_price_bounds() {
        let query = ProductListQuery {
            size: Some("m".to_string()),
            min_price: Some(1_000),
            max_price: Some(5_000),
            ..Default::default()
        };

        let filter = query.filter();
        assert_eq!(
            filter.variant,
            Some(VariantFilter {
                size: Some("M".to_string()),
                min_price: Some(1_000),
                max_price: Some(5_000),
            })
        );
    }

    #[test]
    fn test_variant_filter_requires_one_variant_to_match_everything() {
        let filter = VariantFilter {
            size: Some("M".to_string()),
            min_price: None,
            max_price: Some(2_000),
        };

        assert!(filter.matches(&variant("M", 1_500)));
        assert!(!filter.matches(&variant("M", 2_500)));
        assert!(!filter.matches(&variant("L", 1_500)));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filter = VariantFilter {
            size: None,
            min_price: Some(1_000),
            max_price: Some(2_000),
        };

        assert!(filter.matches(&variant("S", 1_000)));
        assert!(filter.matches(&variant("S", 2_000)));
        assert!(!filter.matches(&variant("S", 999)));
    }

    #[test]
    fn test_pagination_offset_and_total_pages() {
        let pagination = Pagination { page: 2, limit: 10 };

        assert_eq!(pagination.offset(), 10);
        assert_eq!(pagination.total_pages(25), 3);
        assert_eq!(pagination.total_pages(20), 2);
        assert_eq!(pagination.total_pages(0), 0);
    }

    #[test]
    fn test_min_price_above_max_price_is_rejected() {
        let query = ProductListQuery {
            min_price: Some(5_000),
            max_price: Some(1_000),
            ..Default::default()
        };

        assert!(query.validate().is_err());
    }

    #[test]
    fn test_zero_page_and_oversized_limit_are_rejected() {
        let zero_page = ProductListQuery {
            page: Some(0),
            ..Default::default()
        };
        let huge_limit = ProductListQuery {
            limit: Some(MAX_LIMIT + 1),
            ..Default::default()
        };

        assert!(zero_page.validate().is_err());
        assert!(huge_limit.validate().is_err());
    }

    #[test]
    fn test_page_beyond_max_page_is_rejected() {
        let last = ProductListQuery {
            page: Some(MAX_PAGE),
            limit: Some(MAX_LIMIT),
            ..Default::default()
        };
        let beyond = ProductListQuery {
            page: Some(100_000_000_000_000_000),
            limit: Some(MAX_LIMIT),
            ..Default::default()
        };

        assert!(last.validate().is_ok());
        assert!(i64::try_from(last.pagination().offset()).is_ok());
        assert!(beyond.validate().is_err());
    }

    #[test]
    fn test_sort_field_parses_camel_case() {
        assert_eq!("createdAt".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!("name".parse::<SortField>().unwrap(), SortField::Name);
        assert!("password".parse::<SortField>().is_err());
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
    }

    #[test]
    fn test_summary_keeps_lowest_ordered_image() {
        let product_id = Uuid::now_v7();
        let image = |order: i32, url: &str| ProductImage {
            id: Uuid::now_v7(),
            product_id,
            url: url.to_string(),
            order,
        };
        let now = Utc::now();
        let detail = ProductDetail {
            product: Product {
                id: product_id,
                slug: "linen-shirt".to_string(),
                name: "Linen Shirt".to_string(),
                description: String::new(),
                color: "White".to_string(),
                category_id: Uuid::now_v7(),
                created_at: now,
                updated_at: now,
            },
            images: vec![image(2, "back.jpg"), image(0, "front.jpg"), image(1, "side.jpg")],
            variants: vec![],
            category: Category {
                id: Uuid::now_v7(),
                slug: "shirts".to_string(),
                name: "Shirts".to_string(),
            },
            reviews: vec![],
        };

        let summary = detail.into_summary();
        assert_eq!(summary.images.len(), 1);
        assert_eq!(summary.images[0].url, "front.jpg");
    }
}
