use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CatalogError, Result};

const BASE_URL: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
const RATE_LIMIT_MAX: usize = 35;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(10);

/// Animation genre id; every displayed movie must carry it.
pub const ANIME_GENRE_ID: i64 = 16;
/// Original language every displayed movie must have.
pub const ANIME_LANGUAGE: &str = "ja";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub overview: Option<String>,
}

impl Movie {
    /// Animation genre and Japanese original language.
    pub fn is_anime(&self) -> bool {
        self.genre_ids.contains(&ANIME_GENRE_ID) && self.original_language == ANIME_LANGUAGE
    }

    pub fn year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }

    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path.as_deref().map(|p| image_url(size, p))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<i64>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub status: Option<String>,
}

impl MovieDetail {
    pub fn year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub name: String,
}

impl Video {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    #[serde(default)]
    cast: Vec<CastMember>,
}

/// Full image URL for a TMDB path such as `/abc.jpg`.
pub fn image_url(size: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{IMAGE_BASE_URL}/{size}{path}")
    } else {
        format!("{IMAGE_BASE_URL}/{size}/{path}")
    }
}

/// `2001-07-20` as `July 20, 2001`. Unparseable dates pass through unchanged.
pub fn format_release_date(date: &str) -> String {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// Minutes as `2h 5m`.
pub fn format_runtime(minutes: i64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Whole dollars with thousands separators; zero or unknown reads as `N/A`.
pub fn format_money(amount: Option<i64>) -> String {
    let Some(amount) = amount.filter(|a| *a > 0) else {
        return "N/A".to_string();
    };
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}

/// Year part of a `YYYY-MM-DD` date.
pub fn release_year(date: Option<&str>) -> Option<&str> {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
}

// ── Discover parameters ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Popularity,
    Rating,
    Newest,
    Oldest,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Popularity => "popularity.desc",
            Self::Rating => "vote_average.desc",
            Self::Newest => "release_date.desc",
            Self::Oldest => "release_date.asc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Popularity => "Most Popular",
            Self::Rating => "Highest Rated",
            Self::Newest => "Newest First",
            Self::Oldest => "Oldest First",
        }
    }

    pub const ALL: &[SortKey] = &[Self::Popularity, Self::Rating, Self::Newest, Self::Oldest];
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinRating {
    #[default]
    Any,
    Seven,
    Eight,
    Nine,
}

impl MinRating {
    pub fn value(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Any => "All Ratings",
            Self::Seven => "7+ Stars",
            Self::Eight => "8+ Stars",
            Self::Nine => "9+ Stars",
        }
    }

    pub const ALL: &[MinRating] = &[Self::Any, Self::Seven, Self::Eight, Self::Nine];
}

impl fmt::Display for MinRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscoverParams {
    pub sort: SortKey,
    pub min_rating: MinRating,
}

pub fn search_path(query: &str) -> String {
    format!("/search/movie?query={}", urlencoding::encode(query))
}

pub fn discover_path(params: &DiscoverParams) -> String {
    format!(
        "/discover/movie?with_genres={ANIME_GENRE_ID}&with_original_language={ANIME_LANGUAGE}&sort_by={}&vote_average.gte={}",
        params.sort.as_str(),
        params.min_rating.value()
    )
}

// ── Source trait ──

/// The movie metadata endpoints the catalog and detail views consume.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn search_movies(&self, query: &str) -> Result<Vec<Movie>>;
    async fn discover_movies(&self, params: &DiscoverParams) -> Result<Vec<Movie>>;
    async fn movie_detail(&self, id: i64) -> Result<MovieDetail>;
    async fn movie_videos(&self, id: i64) -> Result<Vec<Video>>;
    async fn movie_credits(&self, id: i64) -> Result<Vec<CastMember>>;
    async fn similar_movies(&self, id: i64) -> Result<Vec<Movie>>;
}

/// Rate-limited TMDB API client (bearer token auth).
pub struct TmdbClient {
    client: reqwest::Client,
    token: String,
    timestamps: Arc<Mutex<Vec<Instant>>>,
}

impl TmdbClient {
    pub fn new(token: String) -> Self {
        Self::with_client(reqwest::Client::new(), token)
    }

    pub fn with_client(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            timestamps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Wait for rate limit window if needed.
    async fn rate_limit(&self) {
        loop {
            let now = Instant::now();

            let mut ts = self.timestamps.lock().await;
            ts.retain(|&t| now.duration_since(t) < RATE_LIMIT_WINDOW);

            if ts.len() < RATE_LIMIT_MAX {
                ts.push(now);
                return;
            }

            let wait = RATE_LIMIT_WINDOW.saturating_sub(now.duration_since(ts[0]))
                + Duration::from_millis(100);
            drop(ts);
            debug!("TMDB rate limit: waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        if self.token.trim().is_empty() {
            return Err(CatalogError::Config("No TMDB API token configured".to_string()));
        }

        self.rate_limit().await;
        debug!(path, "TMDB request");

        let response = self
            .client
            .get(format!("{BASE_URL}{path}"))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        handle_response(response).await
    }
}

pub(crate) async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CatalogError::Api {
            status_code: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<Movie>> {
        let page: ResultsPage<Movie> = self.get_json(&search_path(query)).await?;
        Ok(page.results)
    }

    async fn discover_movies(&self, params: &DiscoverParams) -> Result<Vec<Movie>> {
        let page: ResultsPage<Movie> = self.get_json(&discover_path(params)).await?;
        Ok(page.results)
    }

    async fn movie_detail(&self, id: i64) -> Result<MovieDetail> {
        self.get_json(&format!("/movie/{id}?language=en-US")).await
    }

    async fn movie_videos(&self, id: i64) -> Result<Vec<Video>> {
        let page: ResultsPage<Video> = self
            .get_json(&format!("/movie/{id}/videos?language=en-US"))
            .await?;
        Ok(page.results)
    }

    async fn movie_credits(&self, id: i64) -> Result<Vec<CastMember>> {
        let credits: CreditsResponse = self.get_json(&format!("/movie/{id}/credits")).await?;
        Ok(credits.cast)
    }

    async fn similar_movies(&self, id: i64) -> Result<Vec<Movie>> {
        let page: ResultsPage<Movie> = self.get_json(&format!("/movie/{id}/similar")).await?;
        Ok(page.results)
    }
}
