use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::likes::{LikeError, LikeStatus};
use crate::models::{NewsItem, NewsPage};
use crate::service::NewsService;
use crate::views::{ALL_CATEGORIES, DEFAULT_LIMIT, DEFAULT_PAGE};

pub struct AppState {
    pub service: Arc<NewsService>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/news", get(news))
        .route("/api/categories", get(categories))
        .route("/api/like", post(like))
        .route("/api/suggested-news", get(suggested_news))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Client-facing error type
pub enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl From<LikeError> for AppError {
    fn from(err: LikeError) -> Self {
        match err {
            LikeError::MissingId => AppError::BadRequest(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub category: Option<String>,
}

impl NewsQuery {
    fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
    }

    fn limit(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
    }

    fn category(&self) -> String {
        self.category
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| ALL_CATEGORIES.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub post_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub message: String,
    pub post_id: String,
    pub status: LikeStatus,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub items: Vec<NewsItem>,
}

// Route handlers
pub async fn news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Json<NewsPage> {
    let page = state
        .service
        .get_news(query.page(), query.limit(), &query.category())
        .await;
    Json(page)
}

pub async fn categories(State(state): State<Arc<AppState>>) -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        categories: state.service.get_categories().await,
    })
}

pub async fn like(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LikeRequest>,
) -> Result<Json<LikeResponse>, AppError> {
    let post_id = request.post_id.unwrap_or_default();
    let status = state
        .service
        .toggle_like(&post_id, &request.title, &request.description)
        .await?;

    let message = match status {
        LikeStatus::Liked => "Post liked successfully",
        LikeStatus::Unliked => "Post unliked successfully",
    };

    Ok(Json(LikeResponse {
        message: message.to_string(),
        post_id,
        status,
    }))
}

pub async fn suggested_news(State(state): State<Arc<AppState>>) -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        items: state.service.get_suggestions().await,
    })
}

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use crate::config::{FeedSource, RetryPolicy};
    use crate::fetcher::Fetcher;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed_xml(count: usize) -> String {
        let items: String = (0..count)
            .map(|i| {
                format!(
                    "<item><title>Article {i}</title><link>https://example.com/{i}</link>\
                     <description>Story number {i}</description>\
                     <pubDate>Mon, 09 Dec 2024 {:02}:00:00 GMT</pubDate>\
                     <category>{}</category></item>",
                    i % 24,
                    if i % 2 == 0 { "Sports" } else { "Politics" }
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title><link>https://example.com</link><description>D</description>{}</channel></rss>"#,
            items
        )
    }

    async fn create_test_app(server: &MockServer) -> Router {
        let fetcher = Arc::new(Fetcher::new(Duration::from_secs(5)).unwrap());
        let aggregator = Aggregator::new(
            fetcher,
            RetryPolicy {
                max_attempts: 1,
                backoff: Duration::ZERO,
            },
            4,
        );
        let sources = vec![FeedSource::new(
            "Wire",
            &format!("{}/rss", server.uri()),
            "general",
        )];
        let service = Arc::new(NewsService::new(sources, aggregator, Duration::from_secs(60)));
        router(Arc::new(AppState { service }))
    }

    async fn mock_feed(count: usize) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed_xml(count)))
            .mount(&server)
            .await;
        server
    }

    async fn body_json(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn like_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/like")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let server = mock_feed(1).await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["status"], "healthy");
            assert!(json["timestamp"].is_string());
        }
    }

    mod news_tests {
        use super::*;

        #[tokio::test]
        async fn test_news_defaults_to_first_page_of_twenty() {
            let server = mock_feed(45).await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(Request::builder().uri("/api/news").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["items"].as_array().unwrap().len(), 20);
            assert_eq!(json["hasMore"], true);
            assert_eq!(json["totalItems"], 45);
            assert_eq!(json["currentPage"], 1);
            assert_eq!(json["totalPages"], 3);
            assert_eq!(json["categories"][0], "all");
            assert!(json["status"].is_null());
        }

        #[tokio::test]
        async fn test_news_last_page() {
            let server = mock_feed(45).await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/news?page=3&limit=20")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let json = body_json(response).await;
            assert_eq!(json["items"].as_array().unwrap().len(), 5);
            assert_eq!(json["hasMore"], false);
        }

        #[tokio::test]
        async fn test_news_category_filter() {
            let server = mock_feed(10).await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/news?category=Sports")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let json = body_json(response).await;
            let items = json["items"].as_array().unwrap();
            assert_eq!(items.len(), 5);
            assert!(items.iter().all(|i| i["category"] == "sports"));
            assert_eq!(json["categories"].as_array().unwrap().len(), 3);
        }

        #[tokio::test]
        async fn test_news_reports_unavailable_sources() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(Request::builder().uri("/api/news").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["totalItems"], 0);
            assert_eq!(json["status"], "No news sources could be loaded.");
        }
    }

    mod categories_tests {
        use super::*;

        #[tokio::test]
        async fn test_categories_endpoint() {
            let server = mock_feed(4).await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/categories")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let json = body_json(response).await;
            let categories: Vec<_> = json["categories"]
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c.as_str().unwrap().to_string())
                .collect();
            // Article 3 is the newest item and is in politics
            assert_eq!(categories, vec!["all", "politics", "sports"]);
        }
    }

    mod like_tests {
        use super::*;

        #[tokio::test]
        async fn test_like_then_unlike() {
            let server = mock_feed(2).await;
            let app = create_test_app(&server).await;
            let body = serde_json::json!({
                "postId": "Wire-0",
                "title": "Article 0",
                "description": "Story number 0",
            });

            let response = app.clone().oneshot(like_request(body.clone())).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["status"], "liked");
            assert_eq!(json["postId"], "Wire-0");

            let response = app.oneshot(like_request(body)).await.unwrap();
            let json = body_json(response).await;
            assert_eq!(json["status"], "unliked");
            assert_eq!(json["message"], "Post unliked successfully");
        }

        #[tokio::test]
        async fn test_like_without_id_is_bad_request() {
            let server = mock_feed(2).await;
            let app = create_test_app(&server).await;

            let response = app
                .oneshot(like_request(serde_json::json!({ "title": "No id" })))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = body_json(response).await;
            assert_eq!(json["error"], "Post ID is required");
        }

        #[tokio::test]
        async fn test_suggestions_after_like() {
            let server = mock_feed(6).await;
            let app = create_test_app(&server).await;

            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/api/suggested-news")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            let json = body_json(response).await;
            assert!(json["items"].as_array().unwrap().is_empty());

            app.clone()
                .oneshot(like_request(serde_json::json!({
                    "postId": "Wire-4",
                    "title": "Article 4",
                    "description": "",
                })))
                .await
                .unwrap();

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/suggested-news")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            let json = body_json(response).await;
            // "article" and "4" are the keywords and every title contains "article"
            assert_eq!(json["items"].as_array().unwrap().len(), 6);
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_news_query_defaults() {
            let query: NewsQuery = serde_urlencoded::from_str("").unwrap();
            assert_eq!(query.page(), 1);
            assert_eq!(query.limit(), 20);
            assert_eq!(query.category(), "all");
        }

        #[test]
        fn test_news_query_zero_falls_back_to_defaults() {
            let query: NewsQuery = serde_urlencoded::from_str("page=0&limit=0").unwrap();
            assert_eq!(query.page(), 1);
            assert_eq!(query.limit(), 20);
        }

        #[test]
        fn test_news_query_values() {
            let query: NewsQuery =
                serde_urlencoded::from_str("page=2&limit=5&category=World").unwrap();
            assert_eq!(query.page(), 2);
            assert_eq!(query.limit(), 5);
            assert_eq!(query.category(), "world");
        }
    }
}
