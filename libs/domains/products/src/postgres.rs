use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr, Query};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    entity::{category, image, product, review, user, variant},
    error::{ProductError, ProductResult},
    models::{
        Category, Pagination, Product, ProductDetail, ProductFilter, ProductImage, ProductSort,
        ProductSummary, Review, SortField, SortOrder, Variant, VariantFilter,
    },
    repository::ProductRepository,
};

/// PostgreSQL-backed product catalog
///
/// Relations are loaded with one batched `IN (...)` query per table, never per product.
pub struct PgProductRepository {
    db: DatabaseConnection,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn filtered(filter: &ProductFilter) -> Select<product::Entity> {
    let mut query = product::Entity::find();

    if let Some(slug) = &filter.category {
        query = query.filter(
            product::Column::CategoryId.in_subquery(
                Query::select()
                    .column(category::Column::Id)
                    .from(category::Entity)
                    .and_where(category::Column::Slug.eq(slug.as_str()))
                    .to_owned(),
            ),
        );
    }

    if let Some(variants) = &filter.variant {
        query = query.filter(product::Column::Id.in_subquery(matching_variants(variants)));
    }

    if let Some(color) = &filter.color {
        // ILIKE folds case on the server for both sides
        let pattern = format!("%{}%", escape_like(color));
        query = query.filter(
            Expr::col((product::Entity, product::Column::Color))
                .ilike(LikeExpr::new(pattern).escape('\\')),
        );
    }

    query
}

/// Product ids having at least one variant that satisfies every bound
fn matching_variants(filter: &VariantFilter) -> sea_orm::sea_query::SelectStatement {
    let mut select = Query::select();
    select
        .column(variant::Column::ProductId)
        .from(variant::Entity);

    if let Some(size) = &filter.size {
        select.and_where(variant::Column::Size.eq(size.as_str()));
    }
    if let Some(min) = filter.min_price {
        select.and_where(variant::Column::Price.gte(min));
    }
    if let Some(max) = filter.max_price {
        select.and_where(variant::Column::Price.lte(max));
    }

    select.to_owned()
}

fn sort_column(field: SortField) -> product::Column {
    match field {
        SortField::CreatedAt => product::Column::CreatedAt,
        SortField::UpdatedAt => product::Column::UpdatedAt,
        SortField::Name => product::Column::Name,
        SortField::Slug => product::Column::Slug,
    }
}

fn list_query(
    filter: &ProductFilter,
    sort: ProductSort,
    pagination: Pagination,
) -> Select<product::Entity> {
    let order = match sort.order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };

    filtered(filter)
        .order_by(sort_column(sort.field), order)
        .order_by_asc(product::Column::Id)
        .offset(pagination.offset())
        .limit(pagination.limit)
}

fn group_by_product<M, T>(rows: Vec<M>, product_id: impl Fn(&M) -> Uuid) -> HashMap<Uuid, Vec<T>>
where
    T: From<M>,
{
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(product_id(&row)).or_default().push(row.into());
    }
    grouped
}

fn missing_category(product: &product::Model) -> ProductError {
    ProductError::Database(format!(
        "category {} of product {} does not exist",
        product.category_id, product.slug
    ))
}

impl PgProductRepository {
    async fn images_of(&self, product_ids: &[Uuid]) -> ProductResult<HashMap<Uuid, Vec<ProductImage>>> {
        let rows = image::Entity::find()
            .filter(image::Column::ProductId.is_in(product_ids.to_vec()))
            .order_by_asc(image::Column::Position)
            .order_by_asc(image::Column::Id)
            .all(&self.db)
            .await?;
        Ok(group_by_product(rows, |row| row.product_id))
    }

    async fn variants_of(&self, product_ids: &[Uuid]) -> ProductResult<HashMap<Uuid, Vec<Variant>>> {
        let rows = variant::Entity::find()
            .filter(variant::Column::ProductId.is_in(product_ids.to_vec()))
            .order_by_asc(variant::Column::Price)
            .order_by_asc(variant::Column::Id)
            .all(&self.db)
            .await?;
        Ok(group_by_product(rows, |row| row.product_id))
    }

    async fn categories(&self, category_ids: Vec<Uuid>) -> ProductResult<HashMap<Uuid, Category>> {
        let rows = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|row| (row.id, row.into())).collect())
    }

    /// Approved reviews, newest first, each carrying only its author's name
    async fn approved_reviews_of(&self, product_id: Uuid) -> ProductResult<Vec<Review>> {
        let rows = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::IsApproved.eq(true))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut user_ids: Vec<Uuid> = rows.iter().map(|row| row.user_id).collect();
        user_ids.sort();
        user_ids.dedup();

        let names: HashMap<Uuid, String> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();

        rows.into_iter()
            .map(|row| {
                let name = names.get(&row.user_id).cloned().ok_or_else(|| {
                    ProductError::Database(format!(
                        "author {} of review {} does not exist",
                        row.user_id, row.id
                    ))
                })?;
                Ok(row.with_author(name))
            })
            .collect()
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_many(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        pagination: Pagination,
    ) -> ProductResult<Vec<ProductSummary>> {
        let products = list_query(filter, sort, pagination).all(&self.db).await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        let mut category_ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
        category_ids.sort();
        category_ids.dedup();

        let mut images = self.images_of(&product_ids).await?;
        let mut variants = self.variants_of(&product_ids).await?;
        let categories = self.categories(category_ids).await?;

        products
            .into_iter()
            .map(|model| {
                let category = categories
                    .get(&model.category_id)
                    .cloned()
                    .ok_or_else(|| missing_category(&model))?;
                let first_image = images
                    .remove(&model.id)
                    .and_then(|images| images.into_iter().next());

                Ok(ProductSummary {
                    images: first_image.into_iter().collect(),
                    variants: variants.remove(&model.id).unwrap_or_default(),
                    category,
                    product: Product::from(model),
                })
            })
            .collect()
    }

    async fn count(&self, filter: &ProductFilter) -> ProductResult<u64> {
        Ok(filtered(filter).count(&self.db).await?)
    }

    async fn find_by_slug(&self, slug: &str) -> ProductResult<Option<ProductDetail>> {
        let Some(model) = product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let images = self.images_of(&[model.id]).await?.remove(&model.id);
        let variants = self.variants_of(&[model.id]).await?.remove(&model.id);
        let category = self
            .categories(vec![model.category_id])
            .await?
            .remove(&model.category_id)
            .ok_or_else(|| missing_category(&model))?;
        let reviews = self.approved_reviews_of(model.id).await?;

        tracing::debug!(product_id = %model.id, reviews = reviews.len(), "Loaded product");

        Ok(Some(ProductDetail {
            images: images.unwrap_or_default(),
            variants: variants.unwrap_or_default(),
            category,
            reviews,
            product: Product::from(model),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_like, list_query, PgProductRepository};
    use crate::{
        entity::{category, image, product, review, user, variant},
        error::ProductError,
        models::{Pagination, ProductFilter, ProductSort, SortField, SortOrder, VariantFilter},
        repository::ProductRepository,
    };
    use uuid::Uuid;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait, Value};
    use std::collections::BTreeMap;

    fn sql(filter: &ProductFilter) -> String {
        list_query(filter, ProductSort::default(), Pagination::default())
            .build(DatabaseBackend::Postgres)
            .to_string()
    }

    fn product_row(slug: &str, category_id: Uuid) -> product::Model {
        let now = Utc::now().fixed_offset();
        product::Model {
            id: Uuid::now_v7(),
            slug: slug.to_string(),
            name: slug.to_string(),
            description: "Soft cotton".to_string(),
            color: "Red".to_string(),
            category_id,
            created_at: now,
            updated_at: now,
        }
    }

    fn category_row(id: Uuid) -> category::Model {
        category::Model {
            id,
            slug: "shirts".to_string(),
            name: "Shirts".to_string(),
        }
    }

    fn image_row(product_id: Uuid, position: i32) -> image::Model {
        image::Model {
            id: Uuid::now_v7(),
            product_id,
            url: format!("https://cdn.example.com/{}.jpg", position),
            position,
        }
    }

    fn variant_row(product_id: Uuid, size: &str, price: i64) -> variant::Model {
        variant::Model {
            id: Uuid::now_v7(),
            product_id,
            size: size.to_string(),
            price,
        }
    }

    #[test]
    fn test_unfiltered_listing_orders_and_pages() {
        let query = list_query(
            &ProductFilter::default(),
            ProductSort {
                field: SortField::Name,
                order: SortOrder::Asc,
            },
            Pagination { page: 3, limit: 10 },
        )
        .build(DatabaseBackend::Postgres)
        .to_string();

        assert!(!query.contains("WHERE"));
        assert!(query.contains(r#"ORDER BY "products"."name" ASC, "products"."id" ASC"#));
        assert!(query.contains("LIMIT 10"));
        assert!(query.contains("OFFSET 20"));
    }

    #[test]
    fn test_category_filter_uses_slug_subquery() {
        let query = sql(&ProductFilter {
            category: Some("shirts".to_string()),
            ..Default::default()
        });

        assert!(query.contains(r#""category_id" IN (SELECT"#));
        assert!(query.contains(r#""slug" = 'shirts'"#));
    }

    #[test]
    fn test_variant_bounds_share_one_subquery() {
        let query = sql(&ProductFilter {
            variant: Some(VariantFilter {
                size: Some("M".to_string()),
                min_price: Some(1_000),
                max_price: Some(5_000),
            }),
            ..Default::default()
        });

        assert_eq!(query.matches("IN (SELECT").count(), 1);
        assert!(query.contains(r#""size" = 'M'"#));
        assert!(query.contains(r#""price" >= 1000"#));
        assert!(query.contains(r#""price" <= 5000"#));
    }

    #[test]
    fn test_non_ascii_color_is_passed_through_unfolded() {
        let query = sql(&ProductFilter {
            color: Some("İndigo".to_string()),
            ..Default::default()
        });

        assert!(query.contains("ILIKE '%İndigo%'"));
    }

    #[test]
    fn test_color_filter_is_case_insensitive_and_escaped() {
        let query = sql(&ProductFilter {
            color: Some("ReD".to_string()),
            ..Default::default()
        });
        assert!(query.contains("ILIKE '%ReD%'"));
        assert!(!query.contains("LOWER("));
        assert!(query.contains("ESCAPE"));

        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn test_find_many_attaches_first_image_variants_and_category() {
        let category_id = Uuid::now_v7();
        let first = product_row("red-shirt", category_id);
        let second = product_row("red-hoodie", category_id);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![first.clone(), second.clone()]])
            .append_query_results([vec![
                image_row(first.id, 0),
                image_row(first.id, 1),
                image_row(second.id, 0),
            ]])
            .append_query_results([vec![
                variant_row(first.id, "S", 1_500),
                variant_row(first.id, "M", 2_500),
            ]])
            .append_query_results([vec![category_row(category_id)]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let products = repo
            .find_many(&ProductFilter::default(), ProductSort::default(), Pagination::default())
            .await
            .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product.slug, "red-shirt");
        assert_eq!(products[0].images.len(), 1);
        assert_eq!(products[0].images[0].order, 0);
        assert_eq!(products[0].variants.len(), 2);
        assert_eq!(products[0].category.slug, "shirts");
        assert!(products[1].variants.is_empty());
    }

    #[tokio::test]
    async fn test_find_many_with_no_rows_skips_relation_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<product::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let products = repo
            .find_many(&ProductFilter::default(), ProductSort::default(), Pagination::default())
            .await
            .unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_count_reads_num_items() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[BTreeMap::from([("num_items", Value::from(25i64))])]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        assert_eq!(repo.count(&ProductFilter::default()).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_find_by_slug_loads_approved_reviews_with_author_name() {
        let category_id = Uuid::now_v7();
        let product = product_row("red-shirt", category_id);
        let author = user::Model {
            id: Uuid::now_v7(),
            name: "Grace".to_string(),
        };
        let review = review::Model {
            id: Uuid::now_v7(),
            product_id: product.id,
            user_id: author.id,
            rating: 4,
            comment: "Fits well".to_string(),
            is_approved: true,
            created_at: Utc::now().fixed_offset(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![product.clone()]])
            .append_query_results([vec![image_row(product.id, 0), image_row(product.id, 1)]])
            .append_query_results([vec![variant_row(product.id, "M", 2_500)]])
            .append_query_results([vec![category_row(category_id)]])
            .append_query_results([vec![review]])
            .append_query_results([vec![author]])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let detail = repo.find_by_slug("red-shirt").await.unwrap().unwrap();
        assert_eq!(detail.images.len(), 2);
        assert_eq!(detail.variants.len(), 1);
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].user.name, "Grace");
    }

    #[tokio::test]
    async fn test_find_by_slug_returns_none_for_unknown_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<product::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        assert!(repo.find_by_slug("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_category_is_a_database_error() {
        let product = product_row("orphan", Uuid::now_v7());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![product]])
            .append_query_results([Vec::<image::Model>::new()])
            .append_query_results([Vec::<variant::Model>::new()])
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection();
        let repo = PgProductRepository::new(db);

        let result = repo.find_by_slug("orphan").await;
        assert!(matches!(result, Err(ProductError::Database(_))));
    }
}
