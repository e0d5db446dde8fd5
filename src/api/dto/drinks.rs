/*
 * Responsibility
 * - Drinks の request/response DTO
 * - short 表現 (color/parts のみ) と long 表現 (全 ingredient) の切り替え
 */
use serde::{Deserialize, Serialize};

use crate::repos::{Drink, Ingredient};

/// `recipe` may be sent as a single ingredient or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    One(Ingredient),
    Many(Vec<Ingredient>),
}

impl RecipeInput {
    pub fn into_vec(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::One(ingredient) => vec![ingredient],
            RecipeInput::Many(ingredients) => ingredients,
        }
    }
}

fn validate_recipe(recipe: &RecipeInput) -> Result<(), &'static str> {
    let ingredients: &[Ingredient] = match recipe {
        RecipeInput::One(ingredient) => std::slice::from_ref(ingredient),
        RecipeInput::Many(ingredients) => ingredients,
    };

    if ingredients.is_empty() {
        return Err("recipe needs at least one ingredient");
    }
    if ingredients
        .iter()
        .any(|i| i.name.trim().is_empty() || i.color.trim().is_empty())
    {
        return Err("ingredient name and color are required");
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

impl CreateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        validate_recipe(&self.recipe)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

impl UpdateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.is_none() && self.recipe.is_none() {
            return Err("nothing to update");
        }
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        if let Some(recipe) = &self.recipe {
            validate_recipe(recipe)?;
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

/// Public representation: the recipe without ingredient names.
#[derive(Debug, Serialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

impl From<Drink> for ShortDrink {
    fn from(d: Drink) -> Self {
        Self {
            id: d.id,
            title: d.title,
            recipe: d
                .recipe
                .into_iter()
                .map(|i| ShortIngredient {
                    color: i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LongDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl From<Drink> for LongDrink {
    fn from(d: Drink) -> Self {
        Self {
            id: d.id,
            title: d.title,
            recipe: d.recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}
