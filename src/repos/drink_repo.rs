/*
 * Responsibility
 * - drinks の永続化インターフェース (DrinkRepo)
 * - drinks テーブル向け SQLx 実装 (PgDrinkRepo)
 * - unique 制約違反は RepoError::Conflict に変換
 */
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions, types::Json};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[async_trait]
pub trait DrinkRepo: Send + Sync + 'static {
    // Ordered by id
    async fn list(&self) -> RepoResult<Vec<Drink>>;

    async fn get(&self, id: i64) -> RepoResult<Option<Drink>>;

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> RepoResult<Drink>;

    // `None` fields are left untouched. Returns `None` for an unknown id.
    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> RepoResult<Option<Drink>>;

    // Returns false for an unknown id.
    async fn delete(&self, id: i64) -> RepoResult<bool>;
}

#[derive(Debug, FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: Json<Vec<Ingredient>>,
}

impl From<DrinkRow> for Drink {
    fn from(row: DrinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            recipe: row.recipe.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgDrinkRepo {
    db: PgPool,
}

impl PgDrinkRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> RepoResult<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self::new(db))
    }

    pub async fn ensure_schema(&self) -> RepoResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drinks (
                id     BIGSERIAL PRIMARY KEY,
                title  TEXT NOT NULL UNIQUE,
                recipe JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DrinkRepo for PgDrinkRepo {
    async fn list(&self) -> RepoResult<Vec<Drink>> {
        let rows = sqlx::query_as::<_, DrinkRow>(
            r#"
            SELECT id, title, recipe
            FROM drinks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Drink::from).collect())
    }

    async fn get(&self, id: i64) -> RepoResult<Option<Drink>> {
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            SELECT id, title, recipe
            FROM drinks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Drink::from))
    }

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> RepoResult<Drink> {
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            INSERT INTO drinks (title, recipe)
            VALUES ($1, $2)
            RETURNING id, title, recipe
            "#,
        )
        .bind(title)
        .bind(Json(recipe))
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> RepoResult<Option<Drink>> {
        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drinks
            SET title  = COALESCE($2, title),
                recipe = COALESCE($3, recipe)
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(recipe.map(Json))
        .fetch_optional(&self.db)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row.map(Drink::from))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM drinks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
