use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::{Body, Bytes};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{Request, StatusCode, header};
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use url::form_urlencoded;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::{AnalyzeResponse, Catalog, GenreFilms, load_local_films};
use crate::chatbot::{self, ChatReply};
use crate::classifier::GenreClassifier;
use crate::config::Config;
use crate::film::{Film, FilmId, Recommendation};
use crate::tmdb::Tmdb;

const ANALYZE_LIMIT: usize = 6;
const DEFAULT_GENRE_LIMIT: usize = 5;
const DEFAULT_RECOMMEND_LIMIT: usize = 10;
const DEFAULT_POPULAR_LIMIT: usize = 20;
const MAX_POPULAR_LIMIT: usize = 50;
const MAX_CACHED_BODY: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub classifier: Arc<GenreClassifier>,
    search_cache: Cache<String, Bytes>,
    popular_cache: Cache<String, Bytes>,
}

impl AppState {
    pub fn new(catalog: Catalog, classifier: GenreClassifier) -> Self {
        let ttl = Duration::from_secs(60 * 60);
        Self {
            catalog: Arc::new(catalog),
            classifier: Arc::new(classifier),
            search_cache: Cache::builder()
                .max_capacity(1000)
                .time_to_live(ttl)
                .build(),
            popular_cache: Cache::builder()
                .max_capacity(100)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `Json` whose rejection is an `ApiError`, so bad bodies still get `{"error": ...}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query` whose rejection is an `ApiError`.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TitleQuery {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenreQuery {
    #[serde(default)]
    pub name: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendRequest {
    #[serde(default)]
    pub genres: Vec<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilmResponse {
    pub film: Film,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Film>,
    #[serde(default)]
    pub total_results: usize,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PopularResponse {
    #[serde(default)]
    pub results: Vec<Film>,
    #[serde(default)]
    pub total_results: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendResponse {
    pub recommendations: Vec<Film>,
    pub total_results: usize,
    pub genres: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "filmfinder",
        version = "0.1.0",
        description = "Film recommendations from free-text preferences, backed by TMDB"
    ),
    paths(health, analyze, chat, film_by_title, film_by_id, films_by_genre, search, popular, recommend),
    components(schemas(
        ErrorResponse, HealthResponse, AnalyzeRequest, AnalyzeResponse, ChatRequest, ChatReply,
        Film, FilmId, Recommendation, FilmResponse, GenreFilms, SearchResponse, PopularResponse,
        RecommendRequest, RecommendResponse
    )),
    tags(
        (name = "filmfinder", description = "Film recommendation endpoints")
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    let search_router = Router::new()
        .route("/api/search", get(search))
        .route_layer(from_fn_with_state(state.clone(), cache_search_middleware))
        .with_state(state.clone());

    let popular_router = Router::new()
        .route("/api/popular", get(popular))
        .route_layer(from_fn_with_state(state.clone(), cache_popular_middleware))
        .with_state(state.clone());

    let api_router = Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/chat", post(chat))
        .route("/api/film", get(film_by_title))
        .route("/api/film/{film_id}", get(film_by_id))
        .route("/api/genre", get(films_by_genre))
        .route("/api/recommend", post(recommend))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(health).head(health))
        .merge(search_router)
        .merge(popular_router)
        .merge(api_router)
        .layer(from_fn(request_logging_middleware))
        .layer(CorsLayer::permissive())
}

pub async fn build_state(config: &Config) -> AppState {
    let mut tmdb = Tmdb::new(config);
    tmdb.validate_api_key().await;
    let local = load_local_films(&config.films_data_path);
    tracing::info!(
        tmdb = tmdb.is_enabled(),
        local_films = local.len(),
        "catalog ready"
    );
    AppState::new(Catalog::new(tmdb, local), GenreClassifier::new())
}

pub async fn serve(config: &Config) -> std::io::Result<()> {
    let state = build_state(config).await;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "API is up", body = HealthResponse)
    ),
    tag = "filmfinder"
)]
async fn health() -> Json<HealthResponse> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default();
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "API FilmFinder berjalan dengan baik".to_string(),
        timestamp,
    })
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Recommendations for the described preferences", body = AnalyzeResponse),
        (status = 400, description = "Empty text", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn analyze(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Teks input tidak boleh kosong".to_string()));
    }

    let prediction = state.classifier.predict(text);
    let films = state
        .catalog
        .recommendations(&prediction.top_genres, ANALYZE_LIMIT)
        .await;
    tracing::info!(
        genres = ?prediction.top_genres,
        results = films.len(),
        "analyzed preferences"
    );
    Ok(Json(state.catalog.analysis(films, text, prediction.top_genres)))
}

#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Chatbot reply", body = ChatReply),
        (status = 400, description = "Empty message", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Pesan tidak boleh kosong".to_string()));
    }
    Ok(Json(chatbot::reply(&state.catalog, &state.classifier, message).await))
}

#[utoipa::path(
    get,
    path = "/api/film",
    params(
        ("title" = String, Query, description = "Film title")
    ),
    responses(
        (status = 200, description = "Film details", body = Film),
        (status = 400, description = "Empty title", body = ErrorResponse),
        (status = 404, description = "Film not found", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn film_by_title(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TitleQuery>,
) -> Result<Json<Film>, ApiError> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Judul film tidak boleh kosong".to_string()));
    }
    state.catalog.details(title).await.map(Json).ok_or_else(|| {
        ApiError::NotFound(format!("Film dengan judul '{}' tidak ditemukan", title))
    })
}

#[utoipa::path(
    get,
    path = "/api/film/{film_id}",
    params(
        ("film_id" = String, Path, description = "TMDB id, local id or title")
    ),
    responses(
        (status = 200, description = "Film details", body = FilmResponse),
        (status = 404, description = "Film not found", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn film_by_id(
    State(state): State<AppState>,
    Path(film_id): Path<String>,
) -> Result<Json<FilmResponse>, ApiError> {
    state
        .catalog
        .details(&film_id)
        .await
        .map(|film| Json(FilmResponse { film }))
        .ok_or_else(|| ApiError::NotFound("Film tidak ditemukan".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/genre",
    params(
        ("name" = String, Query, description = "Genre name"),
        ("limit" = Option<usize>, Query, description = "Maximum number of films, default 5")
    ),
    responses(
        (status = 200, description = "Films of the genre", body = GenreFilms),
        (status = 400, description = "Empty genre", body = ErrorResponse),
        (status = 404, description = "No films for the genre", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn films_by_genre(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<GenreQuery>,
) -> Result<Json<GenreFilms>, ApiError> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Nama genre tidak boleh kosong".to_string()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_GENRE_LIMIT);
    let result = state.catalog.films_by_genre(name, limit).await;
    if result.films.is_empty() {
        return Err(ApiError::NotFound(format!(
            "Tidak ada film dengan genre '{}' yang ditemukan",
            name
        )));
    }
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(
        ("q" = String, Query, description = "Search query"),
        ("page" = Option<u32>, Query, description = "Result page, default 1")
    ),
    responses(
        (status = 200, description = "Matching films", body = SearchResponse),
        (status = 400, description = "Empty query", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest(
            "Parameter query 'q' tidak boleh kosong".to_string(),
        ));
    }
    let results = state.catalog.search(query).await;
    Ok(Json(SearchResponse {
        total_results: results.len(),
        results,
        query: query.to_string(),
        page: params.page.unwrap_or(1),
    }))
}

#[utoipa::path(
    get,
    path = "/api/popular",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum number of films, default 20, at most 50")
    ),
    responses(
        (status = 200, description = "Popular films", body = PopularResponse)
    ),
    tag = "filmfinder"
)]
async fn popular(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PopularQuery>,
) -> Json<PopularResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_POPULAR_LIMIT)
        .min(MAX_POPULAR_LIMIT);
    let results = state.catalog.popular(limit).await;
    Json(PopularResponse {
        total_results: results.len(),
        results,
    })
}

#[utoipa::path(
    post,
    path = "/api/recommend",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Films for the given genres", body = RecommendResponse),
        (status = 400, description = "No genres", body = ErrorResponse)
    ),
    tag = "filmfinder"
)]
async fn recommend(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let genres: Vec<String> = request
        .genres
        .into_iter()
        .map(|genre| genre.trim().to_string())
        .filter(|genre| !genre.is_empty())
        .collect();
    if genres.is_empty() {
        return Err(ApiError::BadRequest(
            "Parameter 'genres' tidak boleh kosong".to_string(),
        ));
    }
    let limit = request.limit.unwrap_or(DEFAULT_RECOMMEND_LIMIT);
    let recommendations = state.catalog.recommendations(&genres, limit).await;
    Ok(Json(RecommendResponse {
        total_results: recommendations.len(),
        recommendations,
        genres,
    }))
}

async fn request_logging_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    if uri.path() == "/api/health" {
        return next.run(req).await;
    }

    let start = std::time::Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis(),
        "request"
    );
    response
}

async fn cache_search_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    cache_json_by_query(state.search_cache.clone(), req, next).await
}

async fn cache_popular_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    cache_json_by_query(state.popular_cache.clone(), req, next).await
}

/// Serves a cached 200 body for the same query parameters, or runs the
/// handler and caches its 200 body.
async fn cache_json_by_query(cache: Cache<String, Bytes>, req: Request<Body>, next: Next) -> Response {
    let key = cache_key(req.uri());
    if let Some(body) = cache.get(&key).await {
        return ([(header::CONTENT_TYPE, "application/json")], body).into_response();
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => {
            cache.insert(key, bytes.clone()).await;
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to buffer response for cache");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Query parameters, sorted and re-encoded, so parameter order does not matter.
fn cache_key(uri: &axum::http::Uri) -> String {
    let mut pairs: Vec<(String, String)> = uri
        .query()
        .map(|query| {
            form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    pairs.sort();
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tests::demo_catalog;
    use crate::client::tests::spawn;

    pub(crate) async fn demo_state() -> AppState {
        AppState::new(demo_catalog().await, GenreClassifier::new())
    }

    fn error_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_cache_key_is_order_insensitive() {
        let a: axum::http::Uri = "/api/search?q=Dune&page=1".parse().expect("uri");
        let b: axum::http::Uri = "/api/search?page=1&q=Dune".parse().expect("uri");
        assert_eq!(cache_key(&a), cache_key(&b));
        assert_eq!(cache_key(&a), "page=1&q=Dune");

        let lower: axum::http::Uri = "/api/search?q=dune&page=1".parse().expect("uri");
        assert_ne!(cache_key(&a), cache_key(&lower));

        let none: axum::http::Uri = "/api/popular".parse().expect("uri");
        assert_eq!(cache_key(&none), "");
    }

    async fn spawn_demo() -> (AppState, String) {
        let state = demo_state().await;
        let base = spawn(router(state.clone())).await;
        (state, base)
    }

    fn key_for(path_and_query: &str) -> String {
        cache_key(&path_and_query.parse().expect("uri"))
    }

    #[tokio::test]
    async fn test_search_cache_serves_repeat_and_reordered_queries() {
        let (state, base) = spawn_demo().await;
        let http = reqwest::Client::new();

        let first: SearchResponse = http
            .get(format!("{}/search?q=Dune&page=1", base))
            .send()
            .await
            .expect("search")
            .json()
            .await
            .expect("search body");
        assert_eq!(first.total_results, 1);
        let key = key_for("/api/search?q=Dune&page=1");
        assert!(state.search_cache.get(&key).await.is_some());

        // A marker body shows which responses come from the cache.
        let marker = Bytes::from_static(br#"{"results":[],"total_results":0,"query":"cached","page":1}"#);
        state.search_cache.insert(key, marker).await;

        for query in ["q=Dune&page=1", "page=1&q=Dune"] {
            let body: SearchResponse = http
                .get(format!("{}/search?{}", base, query))
                .send()
                .await
                .expect("search")
                .json()
                .await
                .expect("search body");
            assert_eq!(body.query, "cached", "{}", query);
        }

        let body: SearchResponse = http
            .get(format!("{}/search?q=dune&page=1", base))
            .send()
            .await
            .expect("search")
            .json()
            .await
            .expect("search body");
        assert_eq!(body.query, "dune");
        assert_eq!(body.total_results, 1);
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let (state, base) = spawn_demo().await;
        let http = reqwest::Client::new();

        let response = http
            .get(format!("{}/search?q=%20", base))
            .send()
            .await
            .expect("search");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.search_cache.get(&key_for("/api/search?q=%20")).await.is_none());

        let response = http
            .get(format!("{}/popular?limit=abc", base))
            .send()
            .await
            .expect("popular");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.popular_cache.get(&key_for("/api/popular?limit=abc")).await.is_none());

        let response = http
            .get(format!("{}/popular?limit=2", base))
            .send()
            .await
            .expect("popular");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.popular_cache.get(&key_for("/api/popular?limit=2")).await.is_some());
    }

    #[tokio::test]
    async fn test_rejections_are_json_errors() {
        let (_, base) = spawn_demo().await;
        let http = reqwest::Client::new();

        let response = http
            .post(format!("{}/analyze", base))
            .json(&serde_json::json!({ "text": 5 }))
            .send()
            .await
            .expect("analyze");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json().await.expect("error body");
        assert!(!body.error.is_empty());

        let response = http
            .post(format!("{}/chat", base))
            .body("halo")
            .send()
            .await
            .expect("chat");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json().await.expect("error body");
        assert!(!body.error.is_empty());

        let response = http
            .get(format!("{}/popular?limit=abc", base))
            .send()
            .await
            .expect("popular");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json().await.expect("error body");
        assert!(!body.error.is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert!(body.timestamp > 0.0);
    }

    #[tokio::test]
    async fn test_analyze_handler() {
        let state = demo_state().await;
        let request = AnalyzeRequest {
            text: "Rekomendasi film horor yang menegangkan".to_string(),
        };
        let Json(body) = analyze(State(state), ApiJson(request))
            .await
            .expect("analyze failed");
        assert_eq!(body.genres, vec!["Horror", "Thriller"]);
        assert_eq!(body.total_results, 1);
        assert_eq!(body.recommendations[0].film.title, "The Conjuring");
        assert_eq!(body.data_source.as_deref(), Some("Local"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_text() {
        let state = demo_state().await;
        let err = analyze(State(state), ApiJson(AnalyzeRequest { text: "  ".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Teks input tidak boleh kosong");
        assert_eq!(error_status(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_handler() {
        let state = demo_state().await;
        let Json(reply) = chat(
            State(state.clone()),
            ApiJson(ChatRequest {
                message: "info film Dune".to_string(),
            }),
        )
        .await
        .expect("chat failed");
        assert!(matches!(reply, ChatReply::FilmInfo { .. }));

        let err = chat(State(state), ApiJson(ChatRequest { message: String::new() }))
            .await
            .unwrap_err();
        assert_eq!(error_status(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_film_handlers() {
        let state = demo_state().await;
        let Json(film) = film_by_title(
            State(state.clone()),
            ApiQuery(TitleQuery {
                title: "La La Land".to_string(),
            }),
        )
        .await
        .expect("film by title");
        assert_eq!(film.duration, 128);

        let err = film_by_title(
            State(state.clone()),
            ApiQuery(TitleQuery {
                title: "Unknown Film".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Film dengan judul 'Unknown Film' tidak ditemukan");
        assert_eq!(error_status(err), StatusCode::NOT_FOUND);

        let Json(body) = film_by_id(State(state.clone()), Path("the_conjuring".to_string()))
            .await
            .expect("film by id");
        assert_eq!(body.film.director, "James Wan");

        let err = film_by_id(State(state), Path("999".to_string()))
            .await
            .unwrap_err();
        assert_eq!(error_status(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_genre_handler() {
        let state = demo_state().await;
        let Json(body) = films_by_genre(
            State(state.clone()),
            ApiQuery(GenreQuery {
                name: "Sci-Fi".to_string(),
                limit: None,
            }),
        )
        .await
        .expect("genre");
        assert_eq!(body.count, 1);
        assert_eq!(body.films[0].title, "Dune");

        let err = films_by_genre(
            State(state),
            ApiQuery(GenreQuery {
                name: "Western".to_string(),
                limit: Some(3),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(error_status(err), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_and_popular_handlers() {
        let state = demo_state().await;
        let Json(body) = search(
            State(state.clone()),
            ApiQuery(SearchQuery {
                q: "dune".to_string(),
                page: None,
            }),
        )
        .await
        .expect("search");
        assert_eq!(body.total_results, 1);
        assert_eq!(body.page, 1);

        let err = search(
            State(state.clone()),
            ApiQuery(SearchQuery {
                q: " ".to_string(),
                page: Some(2),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Parameter query 'q' tidak boleh kosong");

        let Json(body) = popular(State(state.clone()), ApiQuery(PopularQuery { limit: Some(500) })).await;
        assert_eq!(body.total_results, 3);

        let Json(body) = popular(State(state), ApiQuery(PopularQuery { limit: Some(1) })).await;
        assert_eq!(body.results.len(), 1);
    }

    #[tokio::test]
    async fn test_recommend_handler() {
        let state = demo_state().await;
        let Json(body) = recommend(
            State(state.clone()),
            ApiJson(RecommendRequest {
                genres: vec!["Komedi".to_string(), " ".to_string()],
                limit: None,
            }),
        )
        .await
        .expect("recommend");
        assert_eq!(body.genres, vec!["Komedi"]);
        assert_eq!(body.recommendations[0].title, "La La Land");

        let err = recommend(
            State(state),
            ApiJson(RecommendRequest {
                genres: Vec::new(),
                limit: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(error_status(err), StatusCode::BAD_REQUEST);
    }
}
