use std::sync::Arc;

use tracing::info;

use crate::domain::item::{Item, ItemId, NewItem};
use crate::errors::ApplicationError;
use crate::store::CatalogStore;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn create_item(&self, item: NewItem) -> Result<Item, ApplicationError> {
        item.validate()?;
        let created = self.store.create_item(&item).await?;

        info!(
            event_name = "commerce.item.created",
            item_id = %created.id,
            price = %created.price,
            "catalog item created"
        );
        Ok(created)
    }

    pub async fn list_items(&self) -> Result<Vec<Item>, ApplicationError> {
        Ok(self.store.list_items().await?)
    }

    pub async fn item(&self, id: ItemId) -> Result<Item, ApplicationError> {
        self.store
            .find_item(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(format!("item {id}")))
    }
}
