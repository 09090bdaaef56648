use async_trait::async_trait;
use std::collections::HashMap;

use super::categories_model::{Category, CategoryUpdate, CategoryWithChildren, NewCategory};
use crate::errors::Result;

/// Trait for category repository operations
#[async_trait]
pub trait CategoryRepositoryTrait: Send + Sync {
    /// Create a new category. Parent rules are checked inside the write.
    async fn create(&self, new_category: NewCategory) -> Result<Category>;

    /// Rename and/or re-parent a category.
    async fn update(&self, update: CategoryUpdate) -> Result<Category>;

    /// Delete a category that has no children and no transactions.
    async fn delete(&self, id: &str) -> Result<usize>;

    fn get_by_id(&self, id: &str) -> Result<Option<Category>>;

    /// All categories, parents first, then by name.
    fn list(&self) -> Result<Vec<Category>>;

    /// Number of transactions per category ID (categories without any are absent).
    fn transaction_counts(&self) -> Result<HashMap<String, i64>>;
}

/// Trait for category service operations
#[async_trait]
pub trait CategoryServiceTrait: Send + Sync {
    async fn create_category(&self, new_category: NewCategory) -> Result<Category>;

    async fn update_category(&self, update: CategoryUpdate) -> Result<Category>;

    /// Delete a category (fails while children or transactions exist)
    async fn delete_category(&self, id: &str) -> Result<()>;

    fn get_category(&self, id: &str) -> Result<Option<Category>>;

    fn list_categories(&self) -> Result<Vec<Category>>;

    fn list_categories_hierarchical(&self) -> Result<Vec<CategoryWithChildren>>;

    fn transaction_counts(&self) -> Result<HashMap<String, i64>>;
}
