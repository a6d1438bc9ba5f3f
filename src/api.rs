use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::{
    auth::FixedIdentity,
    entity::{EntityKind, EntityRef},
    error::LinkError,
    linker::ConversationLinker,
    store::Store,
};

/// Header carrying the authenticated caller id, set by the auth gateway in
/// front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

// -----------------------------------------------------------------------------
// Request / response types
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub other_user_id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FindParams {
    pub other_user_id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct FindResponse {
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for LinkError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            LinkError::NotAuthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            LinkError::InvalidParticipants(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            LinkError::StoreUnavailable(source) => {
                error!("conversation store error: {source}");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// -----------------------------------------------------------------------------
// Server
// -----------------------------------------------------------------------------

pub struct ApiState {
    pub store: Store,
}

pub struct ApiServer {
    store: Store,
}

impl ApiServer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn router(&self) -> Router {
        let state = Arc::new(ApiState {
            store: self.store.clone(),
        });

        Router::new()
            .route("/conversations/resolve", post(resolve_handler))
            .route("/conversations/find", get(find_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}

fn linker_for_request(state: &ApiState, headers: &HeaderMap) -> ConversationLinker {
    let caller = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ConversationLinker::new(state.store.clone(), Arc::new(FixedIdentity::from(caller)))
}

async fn resolve_handler(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, LinkError> {
    let linker = linker_for_request(&state, &headers);
    let entity = EntityRef::new(request.entity_kind, request.entity_id);

    let conversation_id = linker.resolve(&request.other_user_id, &entity).await?;

    Ok(Json(ResolveResponse { conversation_id }))
}

async fn find_handler(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(params): Query<FindParams>,
) -> Result<Json<FindResponse>, LinkError> {
    let linker = linker_for_request(&state, &headers);
    let entity = EntityRef::new(params.entity_kind, params.entity_id);

    let conversation_id = linker.find(&params.other_user_id, &entity).await?;

    Ok(Json(FindResponse { conversation_id }))
}
