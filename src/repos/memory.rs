//! In-process drink store, used when no `DATABASE_URL` is configured and by tests.
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repos::drink_repo::{Drink, DrinkRepo, Ingredient};
use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    drinks: BTreeMap<i64, Drink>,
}

impl Store {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDrinkRepo {
    store: RwLock<Store>,
}

impl InMemoryDrinkRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkRepo for InMemoryDrinkRepo {
    async fn list(&self) -> RepoResult<Vec<Drink>> {
        let store = self.store.read().await;
        Ok(store.drinks.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> RepoResult<Option<Drink>> {
        let store = self.store.read().await;
        Ok(store.drinks.get(&id).cloned())
    }

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> RepoResult<Drink> {
        let mut store = self.store.write().await;
        if store.title_taken(title, None) {
            return Err(RepoError::Conflict);
        }

        store.next_id += 1;
        let drink = Drink {
            id: store.next_id,
            title: title.to_string(),
            recipe: recipe.to_vec(),
        };
        store.drinks.insert(drink.id, drink.clone());

        Ok(drink)
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> RepoResult<Option<Drink>> {
        let mut store = self.store.write().await;
        if !store.drinks.contains_key(&id) {
            return Ok(None);
        }
        if let Some(title) = title
            && store.title_taken(title, Some(id))
        {
            return Err(RepoError::Conflict);
        }

        let Some(drink) = store.drinks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            drink.title = title.to_string();
        }
        if let Some(recipe) = recipe {
            drink.recipe = recipe.to_vec();
        }

        Ok(Some(drink.clone()))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        Ok(store.drinks.remove(&id).is_some())
    }
}
