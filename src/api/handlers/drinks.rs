/*
 * Responsibility
 * - /drinks 系 handler
 * - Path/Json を extractor で受け、DTO validation → repo 呼び出し
 * - 保護された handler は AuthClaims を第一引数で受け取る (requires_auth 経由)
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    api::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinksResponse, LongDrink, ShortDrink,
            UpdateDrinkRequest,
        },
        extractors::AuthClaims,
    },
    error::AppError,
    state::AppState,
};

// `/drinks/abc` does not name a drink.
fn drink_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(req)| req).map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable drink payload");
        AppError::Unprocessable
    })
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<ShortDrink>>, AppError> {
    let drinks = state.drinks.list().await?;

    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(ShortDrink::from).collect(),
    )))
}

pub async fn list_drinks_detail(
    AuthClaims(_claims): AuthClaims,
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<LongDrink>>, AppError> {
    let drinks = state.drinks.list().await?;

    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(LongDrink::from).collect(),
    )))
}

pub async fn create_drink(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    body: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<LongDrink>>, AppError> {
    let req = json_body(body)?;
    req.validate().map_err(|reason| {
        tracing::debug!(reason, "invalid drink");
        AppError::Unprocessable
    })?;

    let recipe = req.recipe.into_vec();
    let drink = state.drinks.create(req.title.trim(), &recipe).await?;

    tracing::info!(
        drink_id = drink.id,
        subject = claims.subject().unwrap_or("-"),
        "drink created"
    );

    Ok(Json(DrinksResponse::new(vec![drink.into()])))
}

pub async fn update_drink(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<LongDrink>>, AppError> {
    let id = drink_id(path)?;
    // Unknown id is 404 even when the body is unusable.
    if state.drinks.get(id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let req = json_body(body)?;
    req.validate().map_err(|reason| {
        tracing::debug!(reason, "invalid drink update");
        AppError::Unprocessable
    })?;

    let recipe = req.recipe.map(|r| r.into_vec());
    let drink = state
        .drinks
        .update(id, req.title.as_deref().map(str::trim), recipe.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(
        drink_id = drink.id,
        subject = claims.subject().unwrap_or("-"),
        "drink updated"
    );

    Ok(Json(DrinksResponse::new(vec![drink.into()])))
}

pub async fn delete_drink(
    AuthClaims(claims): AuthClaims,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    let id = drink_id(path)?;

    if !state.drinks.delete(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(
        drink_id = id,
        subject = claims.subject().unwrap_or("-"),
        "drink deleted"
    );

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
