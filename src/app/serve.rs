use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::{
    web::{midware, routes::routes, REQUEST_ID_HEADER},
    App, AppState, Result,
};

/// Serves the forwarder on the `App`'s listener until the listener fails.
pub async fn serve(app: App) -> Result<()> {
    let App {
        app_state,
        listener,
    } = app;

    axum::serve(listener, router(app_state)).await?;

    Ok(())
}

/// Routes wrapped in the request stack, outermost first:
/// 1. assign an `x-request-id` to the request,
/// 2. copy it onto whatever response leaves the inner layers,
/// 3. open the per-request span,
/// 4. rewrite handler errors into the JSON failure body.
///
/// The id is copied after the mapper has run, so rebuilt error responses keep it.
fn router(app_state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(request_trace_layer())
        .layer(middleware::map_response(midware::response_mapper));

    routes(app_state).layer(stack)
}

fn request_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    impl OnRequest<Body> + Clone,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|id| id.to_str().ok())
                .unwrap_or_default()
                .to_string();

            tracing::info_span!(
                "request",
                request_id = %request_id,
                method = %req.method(),
                path = req.uri().path()
            )
        })
        .on_request(|req: &Request<Body>, _span: &Span| {
            tracing::debug!("{:<12} - {} {}", "RECEIVED", req.method(), req.uri())
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &Span| {
            let status = res.status();
            let latency_ms = latency.as_millis();

            if status.is_server_error() {
                tracing::error!("{:<12} - {status} in {latency_ms}ms", "RESPONDED")
            } else if status.is_client_error() {
                tracing::warn!("{:<12} - {status} in {latency_ms}ms", "RESPONDED")
            } else {
                tracing::info!("{:<12} - {status} in {latency_ms}ms", "RESPONDED")
            }
        })
}
