//! Recipe lookup by id or name.

use std::collections::HashMap;

use mealplan_db::models::Recipe;
use uuid::Uuid;

/// The household's recipe library as loaded for one planning run.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    by_id: HashMap<Uuid, Recipe>,
    by_name: HashMap<String, Uuid>,
}

impl RecipeCatalog {
    pub fn new(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let mut catalog = Self::default();
        for recipe in recipes {
            catalog.insert(recipe);
        }
        catalog
    }

    /// Add a recipe. Later inserts win on id and name collisions.
    pub fn insert(&mut self, recipe: Recipe) {
        self.by_name.insert(name_key(&recipe.name), recipe.id);
        self.by_id.insert(recipe.id, recipe);
    }

    pub fn get(&self, id: Uuid) -> Option<&Recipe> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Case- and whitespace-insensitive name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<&Recipe> {
        self.by_name
            .get(&name_key(name))
            .and_then(|id| self.by_id.get(id))
    }

    /// Resolve a generator reference: the id when it is known, otherwise the
    /// name. Generators sometimes invent ids for recipes they name correctly.
    pub fn resolve(&self, id: Option<Uuid>, name: Option<&str>) -> Option<&Recipe> {
        id.and_then(|id| self.get(id))
            .or_else(|| name.and_then(|n| self.find_by_name(n)))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.by_id.values()
    }
}

fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealplan_db::models::Macros;

    fn recipe(name: &str) -> Recipe {
        Recipe {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            cuisine: None,
            meal_types: Vec::new(),
            servings: 4,
            is_product: false,
            nutrition: Macros::default(),
        }
    }

    #[test]
    fn resolves_by_id_then_name() {
        let soup = recipe("Chicken  Soup");
        let id = soup.id;
        let catalog = RecipeCatalog::new([soup]);

        assert_eq!(catalog.resolve(Some(id), None).map(|r| r.id), Some(id));
        assert_eq!(
            catalog
                .resolve(Some(Uuid::new_v4()), Some("chicken soup"))
                .map(|r| r.id),
            Some(id)
        );
        assert!(catalog.resolve(Some(Uuid::new_v4()), Some("Tacos")).is_none());
        assert!(catalog.resolve(None, None).is_none());
    }
}
