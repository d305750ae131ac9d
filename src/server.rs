//! # HTTP Server
//!
//! Thin axum transport over [`QueryService`].
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /api/ids` | JSON array of vehicle ids, ascending |
//! | `GET /api/data/{id}` | JSON array of records; 400 bad id; 404 unknown id |
//! | anything else | static file from the public directory (`/` → `index.html`) |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::path::Path as FsPath;
use tower_http::services::ServeDir;
use tracing::{debug, info};

use crate::service::{QueryError, QueryService, Track};
use crate::telemetry::VehicleId;

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match self {
            QueryError::BadRequest(_) => StatusCode::BAD_REQUEST,
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the application router
pub fn router<P: AsRef<FsPath>>(service: QueryService, public_dir: P) -> Router {
    Router::new()
        .route("/api/ids", get(list_ids))
        .route("/api/data/", get(missing_id))
        .route("/api/data/:id", get(vehicle_records))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(service)
}

/// Serve `app` on `listener` until `shutdown` resolves
pub async fn run<F>(listener: tokio::net::TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Serving at http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn list_ids(State(service): State<QueryService>) -> Json<Vec<VehicleId>> {
    Json(service.list_ids())
}

async fn vehicle_records(
    State(service): State<QueryService>,
    Path(id): Path<String>,
) -> Result<Json<Track>, QueryError> {
    let track = service.records(&id)?;
    debug!("Serving {} records for vehicle {}", track.records().len(), track.id());
    Ok(Json(track))
}

async fn missing_id() -> QueryError {
    QueryError::BadRequest(String::new())
}
