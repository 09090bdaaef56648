use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::categories_model::{
    organize_hierarchically, Category, CategoryUpdate, CategoryWithChildren, NewCategory,
};
use super::categories_traits::{CategoryRepositoryTrait, CategoryServiceTrait};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};

pub struct CategoryService {
    repository: Arc<dyn CategoryRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl CategoryService {
    pub fn new(
        repository: Arc<dyn CategoryRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            event_sink,
        }
    }

    fn emit_changed(&self, id: &str) {
        self.event_sink
            .emit(DomainEvent::categories_changed(vec![id.to_string()]));
    }
}

#[async_trait]
impl CategoryServiceTrait for CategoryService {
    async fn create_category(&self, mut new_category: NewCategory) -> Result<Category> {
        new_category.validate()?;
        new_category.name = new_category.name.trim().to_string();
        let category = self.repository.create(new_category).await?;
        debug!("Created category {} ({})", category.name, category.id);
        self.emit_changed(&category.id);
        Ok(category)
    }

    async fn update_category(&self, mut update: CategoryUpdate) -> Result<Category> {
        update.validate()?;
        update.name = update.name.trim().to_string();
        let category = self.repository.update(update).await?;
        self.emit_changed(&category.id);
        Ok(category)
    }

    async fn delete_category(&self, id: &str) -> Result<()> {
        self.repository.delete(id).await?;
        self.emit_changed(id);
        Ok(())
    }

    fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.repository.get_by_id(id)
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        self.repository.list()
    }

    fn list_categories_hierarchical(&self) -> Result<Vec<CategoryWithChildren>> {
        Ok(organize_hierarchically(self.repository.list()?))
    }

    fn transaction_counts(&self) -> Result<HashMap<String, i64>> {
        self.repository.transaction_counts()
    }
}
