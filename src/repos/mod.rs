pub mod drink_repo;
pub mod error;
pub mod memory;

pub use drink_repo::{Drink, DrinkRepo, Ingredient, PgDrinkRepo};
pub use memory::InMemoryDrinkRepo;
