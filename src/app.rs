use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, clients, foods, plans};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(clients::router())
                .merge(foods::router())
                .merge(plans::router())
                .merge(plans::public_router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn call(method: &str, uri: &str, body: &str) -> StatusCode {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_public() {
        assert_eq!(call("GET", "/api/v1/health", "").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn coach_routes_require_a_token() {
        for (method, uri) in [
            ("GET", "/api/v1/plans"),
            ("GET", "/api/v1/foods"),
            ("GET", "/api/v1/clients"),
            ("POST", "/api/v1/foods/categorize"),
        ] {
            assert_eq!(call(method, uri, "{}").await, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn public_routes_are_wired() {
        assert_eq!(
            call("GET", "/api/v1/public/plans/bad", "").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            call(
                "PATCH",
                "/api/v1/public/plans/unknown_token_1234/tracking",
                r#"{"foodId":"f1","clientChecked":true}"#
            )
            .await,
            StatusCode::NOT_FOUND
        );
    }
}
