use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;
use warp::Filter;

use crate::core::SearchScheduler;
use crate::monitoring::Metrics;

pub struct HttpServer {
    scheduler: Arc<SearchScheduler>,
    port: u16,
}

impl HttpServer {
    pub fn new(scheduler: Arc<SearchScheduler>, port: u16) -> Self {
        Self { scheduler, port }
    }

    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = self.scheduler.clone();

        let health = warp::path("health").and(warp::get()).and_then(move || {
            let scheduler = scheduler.clone();
            async move {
                let health = scheduler.health().await;
                let status = if health.healthy {
                    warp::http::StatusCode::OK
                } else {
                    warp::http::StatusCode::SERVICE_UNAVAILABLE
                };
                Ok::<_, warp::Rejection>(warp::reply::with_status(
                    warp::reply::json(&health),
                    status,
                ))
            }
        });

        let metrics = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| match Metrics::get_prometheus_metrics() {
                Ok(metrics_text) => warp::reply::with_header(
                    metrics_text,
                    "content-type",
                    "text/plain; version=0.0.4; charset=utf-8",
                ),
                Err(e) => {
                    tracing::error!("Failed to generate Prometheus metrics: {}", e);
                    warp::reply::with_header(
                        "# Unable to generate metrics".to_string(),
                        "content-type",
                        "text/plain; version=0.0.4; charset=utf-8",
                    )
                }
            });

        let metrics_scheduler = self.scheduler.clone();
        let json_metrics = warp::path("metrics")
            .and(warp::path("json"))
            .and(warp::get())
            .and_then(move || {
                let scheduler = metrics_scheduler.clone();
                async move {
                    let health = scheduler.health().await;
                    let snapshot = scheduler.metrics.get_snapshot().await;
                    let response = json!({
                        "searches": snapshot.total_searches,
                        "search_failures": snapshot.total_search_failures,
                        "rate_limited": snapshot.total_rate_limited,
                        "results": snapshot.total_results,
                        "terms_rotated": snapshot.total_terms_rotated,
                        "empty_polls": snapshot.total_empty_polls,
                        "store_writes": snapshot.total_store_writes,
                        "store_failures": snapshot.total_store_failures,
                        "queue_depth": health.queue_depth,
                        "workers_active": health.workers_active,
                        "uptime_seconds": snapshot.uptime_seconds,
                        "last_search_time": snapshot.last_search_time,
                        "last_check": health.last_check
                    });

                    Ok::<_, Infallible>(warp::reply::json(&response))
                }
            });

        let routes = health.or(json_metrics).or(metrics);

        info!("Starting HTTP server on port {}", self.port);
        warp::serve(routes).run(([0, 0, 0, 0], self.port)).await;

        Ok(())
    }
}
