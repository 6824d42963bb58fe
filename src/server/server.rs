use anyhow::{Context, Result};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::dataset::{Dataset, Genre};
use crate::engine::{
    dispatch, heatmap_view, query_table, ranked_view_with_limit, reset_filters, scatter_view,
    FilterState, RankMode, RankedControls, ResetOutcome, SeriesControls, TableColumn, TableQuery,
    YearRange,
};

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::metrics::{metrics_handler, record_error, record_view_computation};
use super::{http_cache, log_requests, state::*, ServerConfig};

/// Widest year range a dense view may span. Heatmap rows are allocated per
/// year, so the request is rejected beyond this.
pub const MAX_YEAR_SPAN: usize = 500;

/// Distance in years between two labelled slider marks.
pub const SLIDER_MARK_STEP: usize = 5;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct RankModeOption {
    label: &'static str,
    value: RankMode,
}

/// Everything a front end needs to draw the console widgets.
#[derive(Serialize)]
struct ConsoleControls {
    genres: Vec<Genre>,
    year_bounds: Option<(i32, i32)>,
    slider_marks: Vec<i32>,
    rank_modes: Vec<RankModeOption>,
    table_columns: Vec<TableColumn>,
    page_size: usize,
    defaults: Option<FilterState>,
}

#[derive(Deserialize, Debug)]
struct ResetBody {
    #[serde(default)]
    pub reset_clicks: u64,
}

#[derive(Serialize)]
struct ResetResponse {
    filter_query: String,
}

#[derive(Deserialize, Debug)]
struct UpdateBody {
    #[serde(default)]
    pub previous: Option<FilterState>,
    pub current: FilterState,
}

pub fn slider_marks(year_bounds: Option<(i32, i32)>) -> Vec<i32> {
    match year_bounds {
        Some((min, max)) => (min..=max).step_by(SLIDER_MARK_STEP).collect(),
        None => vec![],
    }
}

fn timed<T>(view: &str, compute: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = compute();
    record_view_computation(view, start.elapsed());
    result
}

fn bad_request(endpoint: &str, message: String) -> Response {
    debug!("Rejecting request to {}: {}", endpoint, message);
    record_error("bad_request", endpoint);
    (StatusCode::BAD_REQUEST, message).into_response()
}

fn check_year_span(endpoint: &str, year_range: YearRange) -> Result<(), Response> {
    if year_range.year_count() > MAX_YEAR_SPAN {
        return Err(bad_request(
            endpoint,
            format!(
                "Year range {}-{} spans more than {} years",
                year_range.min(),
                year_range.max(),
                MAX_YEAR_SPAN
            ),
        ));
    }
    Ok(())
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn get_controls(State(dataset): State<GuardedDataset>) -> impl IntoResponse {
    let year_bounds = dataset.year_bounds();
    let controls = ConsoleControls {
        genres: Genre::ALL.to_vec(),
        year_bounds,
        slider_marks: slider_marks(year_bounds),
        rank_modes: vec![
            RankModeOption {
                label: "Top Rated Movies",
                value: RankMode::Top,
            },
            RankModeOption {
                label: "Lowest Rated Movies",
                value: RankMode::Bottom,
            },
        ],
        table_columns: TableColumn::ALL.to_vec(),
        page_size: TableQuery::default().page_size,
        defaults: year_bounds.map(|(min, max)| FilterState::initial(YearRange::new(min, max))),
    };
    Json(controls)
}

async fn post_scatter(
    State(dataset): State<GuardedDataset>,
    Json(controls): Json<SeriesControls>,
) -> Response {
    let view = timed("scatter", || {
        scatter_view(&dataset, &controls.selected_genres, controls.year_range)
    });
    Json(view).into_response()
}

async fn post_heatmap(
    State(dataset): State<GuardedDataset>,
    Json(controls): Json<SeriesControls>,
) -> Response {
    if let Err(response) = check_year_span("/v1/console/heatmap", controls.year_range) {
        return response;
    }
    let view = timed("heatmap", || {
        heatmap_view(&dataset, &controls.selected_genres, controls.year_range)
    });
    Json(view).into_response()
}

async fn post_ranked(
    State(state): State<ServerState>,
    Json(controls): Json<RankedControls>,
) -> Response {
    let view = timed("ranked", || {
        ranked_view_with_limit(
            &state.dataset,
            &controls.bar_genres,
            controls.year_range,
            controls.rank_mode,
            state.config.top_n,
        )
    });
    Json(view).into_response()
}

async fn post_table(
    State(dataset): State<GuardedDataset>,
    Json(query): Json<TableQuery>,
) -> Response {
    match timed("table", || query_table(&dataset, &query)) {
        Ok(page) => Json(page).into_response(),
        Err(err) => bad_request("/v1/console/table", err.to_string()),
    }
}

async fn post_reset(Json(body): Json<ResetBody>) -> Response {
    match reset_filters(body.reset_clicks) {
        ResetOutcome::Suppressed => StatusCode::NO_CONTENT.into_response(),
        ResetOutcome::ClearFilters => Json(ResetResponse {
            filter_query: String::new(),
        })
        .into_response(),
    }
}

async fn post_update(State(state): State<ServerState>, Json(body): Json<UpdateBody>) -> Response {
    if let Err(response) = check_year_span("/v1/console/update", body.current.year_range) {
        return response;
    }
    let update = timed("update", || {
        dispatch(
            &state.dataset,
            body.previous.as_ref(),
            &body.current,
            state.config.top_n,
        )
    });
    debug!("Recomputed views: {:?}", update.updated);
    Json(update).into_response()
}

pub fn make_app(config: ServerConfig, dataset: GuardedDataset) -> Router {
    let state = ServerState::new(config.clone(), dataset);

    let console_routes: Router = Router::new()
        .route("/controls", get(get_controls))
        .route("/scatter", post(post_scatter))
        .route("/heatmap", post(post_heatmap))
        .route("/ranked", post(post_ranked))
        .route("/table", post(post_table))
        .route("/reset", post(post_reset))
        .route("/update", post(post_update))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    home_router
        .nest("/v1/console", console_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down...");
    }
}

pub async fn run_server(dataset: Dataset, config: ServerConfig, metrics_port: u16) -> Result<()> {
    let port = config.port;
    let app = make_app(config, Arc::new(dataset));

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    let metrics_server = axum::serve(metrics_listener, make_metrics_app()).into_future();

    tokio::select! {
        result = server => result.context("HTTP server failed")?,
        result = metrics_server => result.context("Metrics server failed")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{MovieEvent, RatingRecord};
    use crate::server::metrics::HTTP_REQUESTS_TOTAL;
    use crate::server::UNMATCHED_PATH_LABEL;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use chrono::NaiveDate;
    use prometheus::core::Collector;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_dataset() -> GuardedDataset {
        let mut events = vec![];
        for _ in 0..3 {
            events.push(MovieEvent {
                release_year: 1995,
                genre: Genre::Action,
                count: 1,
            });
        }
        for _ in 0..2 {
            events.push(MovieEvent {
                release_year: 1996,
                genre: Genre::Comedy,
                count: 1,
            });
        }
        events.push(MovieEvent {
            release_year: 1990,
            genre: Genre::Drama,
            count: 1,
        });
        let rating = |title: &str, genre: Genre, rating: f64| RatingRecord {
            title: title.to_owned(),
            release_date: NaiveDate::from_ymd_opt(1995, 12, 15).unwrap(),
            genre,
            rating,
        };
        let ratings = vec![
            rating("Heat", Genre::Action, 9.0),
            rating("Heat", Genre::Action, 7.0),
            rating("Toy Story", Genre::Comedy, 9.0),
            rating("Jumanji", Genre::Action, 4.0),
        ];
        Arc::new(Dataset::new(events, ratings))
    }

    fn app() -> Router {
        make_app(ServerConfig::default(), test_dataset())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn uptime_is_formatted_with_days() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[test]
    fn slider_marks_step_every_five_years() {
        assert_eq!(slider_marks(Some((1990, 2001))), vec![1990, 1995, 2000]);
        assert_eq!(slider_marks(Some((1990, 1990))), vec![1990]);
        assert!(slider_marks(None).is_empty());
    }

    #[tokio::test]
    async fn home_reports_stats() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats = body_json(response).await;
        assert_eq!(stats["hash"], env!("CARGO_PKG_VERSION"));
        assert!(stats["uptime"].as_str().unwrap().starts_with("0d"));
    }

    #[tokio::test]
    async fn controls_describe_the_dataset() {
        let request = Request::builder()
            .uri("/v1/console/controls")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "max-age=3600"
        );

        let controls = body_json(response).await;
        assert_eq!(controls["genres"].as_array().unwrap().len(), 19);
        assert_eq!(controls["genres"][0], "unknown");
        assert_eq!(controls["year_bounds"], json!([1990, 1996]));
        assert_eq!(controls["slider_marks"], json!([1990, 1995]));
        assert_eq!(controls["page_size"], 10);
        assert_eq!(controls["defaults"]["selected_genres"], json!(["Action"]));
        assert_eq!(controls["defaults"]["rank_mode"], "top");
        assert_eq!(controls["rank_modes"][0]["label"], "Top Rated Movies");
        assert_eq!(controls["rank_modes"][1]["label"], "Lowest Rated Movies");
        assert_eq!(controls["rank_modes"][1]["value"], "bottom");
    }

    #[tokio::test]
    async fn scatter_returns_sparse_points() {
        let response = post_json(
            app(),
            "/v1/console/scatter",
            json!({"selected_genres": ["Action"], "year_range": [1994, 1997]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let view = body_json(response).await;
        assert_eq!(view["series"].as_array().unwrap().len(), 1);
        assert_eq!(view["series"][0]["genre"], "Action");
        assert_eq!(view["series"][0]["points"], json!([{"year": 1995, "count": 3}]));
    }

    #[tokio::test]
    async fn heatmap_returns_dense_rows() {
        let response = post_json(
            app(),
            "/v1/console/heatmap",
            json!({"selected_genres": ["Action"], "year_range": [1997, 1994]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let view = body_json(response).await;
        assert_eq!(view["years"], json!([1994, 1995, 1996, 1997]));
        assert_eq!(view["values"], json!([[0], [3], [0], [0]]));
        assert_eq!(view["color_scale"], "blues");
    }

    #[tokio::test]
    async fn heatmap_rejects_huge_ranges() {
        let response = post_json(
            app(),
            "/v1/console/heatmap",
            json!({"selected_genres": ["Action"], "year_range": [0, 100000]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ranked_returns_titles_and_series() {
        let response = post_json(
            app(),
            "/v1/console/ranked",
            json!({"bar_genres": ["Action", "Comedy"], "year_range": [1990, 2000], "rank_mode": "top"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let view = body_json(response).await;
        let titles: Vec<&str> = view["titles"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Toy Story", "Heat", "Jumanji"]);
        assert_eq!(view["series"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn table_pages_and_reports_bad_filters() {
        let response = post_json(
            app(),
            "/v1/console/table",
            json!({"filter_query": "{Genre} = Action", "sort_by": [{"column_id": "Average Rating", "direction": "desc"}]}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["total_rows"], 2);
        assert_eq!(page["rows"][0]["Title"], "Heat");
        assert_eq!(page["rows"][0]["Average Rating"], 8.0);

        let response = post_json(
            app(),
            "/v1/console/table",
            json!({"filter_query": "{Director} = Nolan"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn reset_is_suppressed_until_clicked() {
        let response = post_json(app(), "/v1/console/reset", json!({"reset_clicks": 0})).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        for clicks in [1, 2, 3] {
            let response =
                post_json(app(), "/v1/console/reset", json!({"reset_clicks": clicks})).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await, json!({"filter_query": ""}));
        }
    }

    #[tokio::test]
    async fn update_recomputes_changed_views_only() {
        let previous = json!({
            "selected_genres": ["Action"],
            "year_range": [1990, 1996],
            "rank_mode": "top",
            "bar_genres": ["Action"]
        });
        let mut current = previous.clone();
        current["rank_mode"] = json!("bottom");

        let response = post_json(
            app(),
            "/v1/console/update",
            json!({"previous": previous, "current": current}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let update = body_json(response).await;
        assert_eq!(update["updated"], json!(["ranked"]));
        assert!(update["scatter"].is_null());
        assert!(update["heatmap"].is_null());
        assert_eq!(update["ranked"]["titles"][0]["title"], "Jumanji");
    }

    fn requested_path_labels() -> Vec<String> {
        HTTP_REQUESTS_TOTAL
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .flat_map(|metric| metric.get_label())
            .filter(|label| label.get_name() == "path")
            .map(|label| label.get_value().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn unknown_paths_share_one_metrics_series() {
        for i in 0..20 {
            let request = Request::builder()
                .uri(format!("/no-such-page-{}", i))
                .body(Body::empty())
                .unwrap();
            let response = app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let labels = requested_path_labels();
        assert!(labels.iter().all(|label| !label.starts_with("/no-such-page")));
        assert!(labels.iter().any(|label| label == UNMATCHED_PATH_LABEL));
    }

    #[tokio::test]
    async fn routed_requests_are_labelled_by_route() {
        let response = post_json(
            app(),
            "/v1/console/reset",
            json!({"reset_clicks": 0}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let labels = requested_path_labels();
        assert!(labels.iter().any(|label| label == "/v1/console/reset"));
    }

    #[tokio::test]
    async fn malformed_bodies_are_rejected() {
        let response = post_json(app(), "/v1/console/scatter", json!({"selected_genres": []})).await;
        assert!(response.status().is_client_error());
    }
}
