use std::sync::Arc;
use tracing::{debug, instrument};
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{ProductDetail, ProductListQuery, ProductPage};
use crate::repository::ProductRepository;

/// Service layer for catalog queries
#[derive(Clone)]
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// One page of products plus pagination metadata.
    ///
    /// The page and the total are read concurrently against the same filter.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductListQuery) -> ProductResult<ProductPage> {
        query
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let filter = query.filter();
        let pagination = query.pagination();

        let (products, total) = tokio::try_join!(
            self.repository.find_many(&filter, query.sort(), pagination),
            self.repository.count(&filter),
        )
        .map_err(ProductError::while_listing)?;

        debug!(
            page = pagination.page,
            limit = pagination.limit,
            total,
            returned = products.len(),
            "Listed products"
        );

        Ok(ProductPage {
            products,
            total_pages: pagination.total_pages(total),
            current_page: pagination.page,
            total,
        })
    }

    /// Get a product by slug
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> ProductResult<ProductDetail> {
        self.repository
            .find_by_slug(slug)
            .await
            .map_err(ProductError::while_fetching)?
            .ok_or_else(|| ProductError::NotFound(slug.to_string()))
    }
}
