use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::classifier::ClassifierError;
use super::dto::{
    CategorizeRequest, CategorizeResponse, CreateFoodRequest, ImportUsdaRequest, UsdaSearchQuery,
};
use super::repo_types::{Food, FoodSource, NewFood};
use super::usda::{UsdaError, UsdaSearchHit};
use crate::{auth::AuthCoach, error::AppError, state::AppState};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", delete(delete_food))
        .route("/foods/categorize", post(categorize_foods))
}

pub fn usda_routes() -> Router<AppState> {
    Router::new()
        .route("/foods/usda/search", get(search_usda))
        .route("/foods/usda/import", post(import_usda))
        .route("/foods/usda/cache", delete(clear_usda_cache))
        .route("/foods/usda/cache/:fdc_id", delete(invalidate_usda_cache))
}

impl From<UsdaError> for AppError {
    fn from(e: UsdaError) -> Self {
        match e {
            UsdaError::NotFound(fdc_id) => AppError::NotFound(format!("USDA food {fdc_id} not found")),
            other => {
                warn!(error = %other, "usda request failed");
                AppError::BadGateway("Nutrition database unavailable".into())
            }
        }
    }
}

impl From<ClassifierError> for AppError {
    fn from(e: ClassifierError) -> Self {
        warn!(error = %e, "classification failed");
        AppError::BadGateway("Categorization service unavailable".into())
    }
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
) -> Result<Json<Vec<Food>>, AppError> {
    Ok(Json(state.foods.list_all().await?))
}

#[instrument(skip(state, body))]
pub async fn create_food(
    State(state): State<AppState>,
    AuthCoach(coach_id): AuthCoach,
    Json(body): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<Food>), AppError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let food = state
        .foods
        .insert(NewFood {
            name,
            food_group: body.food_group.filter(|g| !g.trim().is_empty()),
            default_color: body.default_color,
            source: FoodSource::Manual,
            fdc_id: None,
            nutrients: Vec::new(),
        })
        .await?;
    info!(food_id = %food.id, %coach_id, "food created");
    Ok((StatusCode::CREATED, Json(food)))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.foods.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Food not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn search_usda(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
    Query(q): Query<UsdaSearchQuery>,
) -> Result<Json<Vec<UsdaSearchHit>>, AppError> {
    let query = q.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query is required".into()));
    }
    let hits = state.usda.search(query, q.page_size.clamp(1, 200)).await?;
    Ok(Json(hits))
}

/// Imports a USDA food into the catalog. Importing the same FDC id again
/// returns the existing entry with 200.
#[instrument(skip(state))]
pub async fn import_usda(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
    Json(body): Json<ImportUsdaRequest>,
) -> Result<(StatusCode, Json<Food>), AppError> {
    if body.fdc_id <= 0 {
        return Err(AppError::BadRequest("fdcId must be positive".into()));
    }
    if let Some(existing) = state.foods.find_by_fdc_id(body.fdc_id).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    let details = state.nutrition.food_details(body.fdc_id).await?;
    let food = state
        .foods
        .insert(NewFood {
            name: details.description,
            food_group: details.food_group,
            default_color: body.default_color,
            source: FoodSource::Usda,
            fdc_id: Some(details.fdc_id),
            nutrients: details.nutrients,
        })
        .await?;
    info!(food_id = %food.id, fdc_id = body.fdc_id, "usda food imported");
    Ok((StatusCode::CREATED, Json(food)))
}

#[instrument(skip(state))]
pub async fn invalidate_usda_cache(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
    Path(fdc_id): Path<i64>,
) -> StatusCode {
    if state.nutrition.invalidate(fdc_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[instrument(skip(state))]
pub async fn clear_usda_cache(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
) -> StatusCode {
    state.nutrition.clear();
    StatusCode::NO_CONTENT
}

/// Suggests a color per food name. Nothing is stored.
#[instrument(skip(state, body))]
pub async fn categorize_foods(
    State(state): State<AppState>,
    AuthCoach(_coach_id): AuthCoach,
    Json(body): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, AppError> {
    let names = body.cleaned().map_err(AppError::BadRequest)?;
    let mut suggestions = Vec::with_capacity(names.len());
    for name in &names {
        suggestions.push(state.classifier.classify(name).await?);
    }
    Ok(Json(CategorizeResponse { suggestions }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::ColorCode;

    fn coach() -> AuthCoach {
        AuthCoach(Uuid::new_v4())
    }

    #[tokio::test]
    async fn import_is_idempotent_per_fdc_id() {
        let state = AppState::fake();
        let req = || ImportUsdaRequest {
            fdc_id: 321,
            default_color: Some(ColorCode::Blue),
        };

        let (status, Json(first)) = import_usda(State(state.clone()), coach(), Json(req()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first.source, FoodSource::Usda);
        assert_eq!(first.name, "Food 321");

        let (status, Json(second)) = import_usda(State(state.clone()), coach(), Json(req()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second.id, first.id);
        assert_eq!(state.nutrition.size(), 1);
    }

    #[tokio::test]
    async fn import_of_unknown_food_is_404() {
        let state = AppState::fake();
        let err = import_usda(
            State(state),
            coach(),
            Json(ImportUsdaRequest {
                fdc_id: 5_000_000,
                default_color: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn manual_foods_need_a_name() {
        let state = AppState::fake();
        let err = create_food(
            State(state.clone()),
            coach(),
            Json(CreateFoodRequest {
                name: "  ".into(),
                food_group: None,
                default_color: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let (status, Json(food)) = create_food(
            State(state.clone()),
            coach(),
            Json(CreateFoodRequest {
                name: "Spinach".into(),
                food_group: Some("Vegetables".into()),
                default_color: Some(ColorCode::Blue),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(food.source, FoodSource::Manual);

        let Json(all) = list_foods(State(state.clone()), coach()).await.unwrap();
        assert_eq!(all.len(), 1);

        let status = delete_food(State(state.clone()), coach(), Path(food.id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(delete_food(State(state), coach(), Path(food.id)).await.is_err());
    }

    #[tokio::test]
    async fn categorize_returns_one_suggestion_per_name() {
        let state = AppState::fake();
        let Json(res) = categorize_foods(
            State(state),
            coach(),
            Json(CategorizeRequest {
                names: vec!["Kale".into(), "Orange soda".into()],
            }),
        )
        .await
        .unwrap();
        let colors: Vec<_> = res.suggestions.iter().map(|s| s.color_code).collect();
        assert_eq!(colors, vec![ColorCode::Blue, ColorCode::Red]);
    }

    #[tokio::test]
    async fn classifier_failures_are_bad_gateway() {
        let state = AppState::fake();
        let err = categorize_foods(
            State(state),
            coach(),
            Json(CategorizeRequest {
                names: vec!["error please".into()],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn cache_endpoints_invalidate_entries() {
        let state = AppState::fake();
        state.nutrition.food_details(9).await.unwrap();
        assert_eq!(
            invalidate_usda_cache(State(state.clone()), coach(), Path(9)).await,
            StatusCode::NO_CONTENT
        );
        assert_eq!(
            invalidate_usda_cache(State(state.clone()), coach(), Path(9)).await,
            StatusCode::NOT_FOUND
        );
        state.nutrition.food_details(10).await.unwrap();
        assert_eq!(clear_usda_cache(State(state.clone()), coach()).await, StatusCode::NO_CONTENT);
        assert_eq!(state.nutrition.size(), 0);
    }

    #[tokio::test]
    async fn search_requires_a_query() {
        let state = AppState::fake();
        let err = search_usda(
            State(state.clone()),
            coach(),
            Query(UsdaSearchQuery {
                query: " ".into(),
                page_size: 5,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let Json(hits) = search_usda(
            State(state),
            coach(),
            Query(UsdaSearchQuery {
                query: "kale".into(),
                page_size: 5,
            }),
        )
        .await
        .unwrap();
        assert_eq!(hits.len(), 3);
    }
}
