use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::ProductResult;
use crate::models::{
    Pagination, ProductDetail, ProductFilter, ProductSort, ProductSummary, SortField, SortOrder,
};

/// Repository trait for read access to the product catalog
///
/// Implementations own eager loading: listings come back with their first
/// image, variants and category attached, single products with everything.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// One page of products matching the filter, in the requested order
    async fn find_many(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        pagination: Pagination,
    ) -> ProductResult<Vec<ProductSummary>>;

    /// Number of products matching the filter
    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64>;

    /// Product by exact slug, with only approved reviews
    async fn find_by_slug(&self, slug: &str) -> ProductResult<Option<ProductDetail>>;
}

/// In-memory implementation of ProductRepository (for development/testing)
///
/// Products are stored with every review; the approval filter is applied on read.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<String, ProductDetail>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            products: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a product under its slug, replacing any previous entry
    pub async fn insert(&self, product: ProductDetail) {
        let mut products = self.products.write().await;
        products.insert(product.product.slug.clone(), product);
    }
}

fn matches(filter: &ProductFilter, product: &ProductDetail) -> bool {
    if let Some(category) = &filter.category {
        if product.category.slug != *category {
            return false;
        }
    }
    if let Some(variant_filter) = &filter.variant {
        if !product.variants.iter().any(|v| variant_filter.matches(v)) {
            return false;
        }
    }
    if let Some(color) = &filter.color {
        if !product
            .product
            .color
            .to_lowercase()
            .contains(&color.to_lowercase())
        {
            return false;
        }
    }
    true
}

fn compare(sort: ProductSort, a: &ProductDetail, b: &ProductDetail) -> Ordering {
    let (a, b) = (&a.product, &b.product);
    let by_field = match sort.field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Slug => a.slug.cmp(&b.slug),
    };
    let by_field = match sort.order {
        SortOrder::Asc => by_field,
        SortOrder::Desc => by_field.reverse(),
    };
    by_field.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_many(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        pagination: Pagination,
    ) -> ProductResult<Vec<ProductSummary>> {
        let products = self.products.read().await;

        let mut result: Vec<&ProductDetail> =
            products.values().filter(|p| matches(filter, p)).collect();
        result.sort_by(|a, b| compare(sort, a, b));

        Ok(result
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .cloned()
            .map(ProductDetail::into_summary)
            .collect())
    }

    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| matches(filter, p)).count() as u64)
    }

    async fn find_by_slug(&self, slug: &str) -> ProductResult<Option<ProductDetail>> {
        let products = self.products.read().await;

        Ok(products.get(slug).cloned().map(|mut product| {
            product.images.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
            product.reviews.retain(|review| review.is_approved);
            product
                .reviews
                .sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            product
        }))
    }
}
