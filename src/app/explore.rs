use crate::auth::Session;
use crate::error::Error;
use crate::explore;
use crate::state;

use axum::Extension;
use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub(crate) async fn search(
    State(state): State<state::AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<explore::DiarySummary>>, Error> {
    let results = explore::search(state.store.as_ref(), &query.q).await?;
    Ok(Json(results))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingQuery {
    limit: Option<usize>,
}

pub(crate) async fn trending(
    State(state): State<state::AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<Vec<explore::TrendingDiary>>, Error> {
    let ranked =
        explore::compute_trending(state.store.as_ref(), &session.user_id, query.limit).await?;
    Ok(Json(ranked))
}
