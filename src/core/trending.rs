use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::config::AppwriteConfig;
use crate::core::tmdb::{handle_response, Movie};
use crate::db::{queries, DbConn};
use crate::error::{CatalogError, Result};

/// Number of terms shown in the trending row.
pub const TRENDING_LIMIT: usize = 5;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub term: String,
    pub count: i64,
    pub movie_id: i64,
    pub poster_url: Option<String>,
}

/// What gets written for one successful search: the term and its first result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecord {
    pub term: String,
    pub movie_id: i64,
    pub poster_url: Option<String>,
}

impl SearchRecord {
    pub fn new(term: &str, movie: &Movie) -> Self {
        Self {
            term: normalize_term(term),
            movie_id: movie.id,
            poster_url: movie.poster_url("w500"),
        }
    }
}

/// Trim, lowercase and collapse inner whitespace.
pub fn normalize_term(term: &str) -> String {
    WHITESPACE
        .replace_all(term.trim(), " ")
        .to_lowercase()
}

/// Sort by descending count and keep at most `limit` entries.
pub fn rank_top(mut entries: Vec<TrendingEntry>, limit: usize) -> Vec<TrendingEntry> {
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);
    entries
}

/// Search-count aggregation backend.
#[async_trait]
pub trait TrendingService: Send + Sync {
    /// Increment the counter for the record's term, creating it on first sight.
    async fn record_search(&self, record: &SearchRecord) -> Result<()>;

    /// Most searched terms, highest count first.
    async fn fetch_top(&self, limit: usize) -> Result<Vec<TrendingEntry>>;
}

/// Top terms from any backend, re-ranked so ordering and size hold regardless of backend.
pub async fn fetch_ranked(service: &dyn TrendingService, limit: usize) -> Result<Vec<TrendingEntry>> {
    let entries = service.fetch_top(limit).await?;
    Ok(rank_top(entries, limit))
}

// ── Local backend ──

/// Search counts in the local `search_counts` table.
pub struct SqliteTrending {
    conn: DbConn,
}

impl SqliteTrending {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TrendingService for SqliteTrending {
    async fn record_search(&self, record: &SearchRecord) -> Result<()> {
        let conn = self.conn.clone();
        let record = record.clone();
        let count = tokio::task::spawn_blocking(move || {
            queries::increment_search_count(
                &conn,
                &record.term,
                record.movie_id,
                record.poster_url.as_deref(),
            )
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))??;

        debug!("Search count now {count}");
        Ok(())
    }

    async fn fetch_top(&self, limit: usize) -> Result<Vec<TrendingEntry>> {
        let conn = self.conn.clone();
        let rows = tokio::task::spawn_blocking(move || queries::fetch_top_search_counts(&conn, limit))
            .await
            .map_err(|e| CatalogError::Task(e.to_string()))??;

        Ok(rows
            .into_iter()
            .map(|r| TrendingEntry {
                term: r.search_term,
                count: r.count,
                movie_id: r.movie_id,
                poster_url: r.poster_url,
            })
            .collect())
    }
}

// ── Appwrite backend ──

#[derive(Debug, Deserialize)]
struct TrendingDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "searchTerm")]
    search_term: String,
    #[serde(default)]
    count: i64,
    #[serde(default)]
    movie_id: i64,
    poster_url: Option<String>,
}

impl From<TrendingDocument> for TrendingEntry {
    fn from(doc: TrendingDocument) -> Self {
        Self {
            term: doc.search_term,
            count: doc.count,
            movie_id: doc.movie_id,
            poster_url: doc.poster_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<TrendingDocument>,
}

fn equal_query(attribute: &str, value: &str) -> String {
    json!({ "method": "equal", "attribute": attribute, "values": [value] }).to_string()
}

fn order_desc_query(attribute: &str) -> String {
    json!({ "method": "orderDesc", "attribute": attribute }).to_string()
}

fn limit_query(limit: usize) -> String {
    json!({ "method": "limit", "values": [limit] }).to_string()
}

/// Search counts in an Appwrite collection, one document per term.
pub struct AppwriteTrending {
    client: reqwest::Client,
    config: AppwriteConfig,
}

impl AppwriteTrending {
    pub fn new(config: AppwriteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint, self.config.database, self.config.collection
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.config.project);
        match &self.config.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    async fn list(&self, queries: &[String]) -> Result<Vec<TrendingDocument>> {
        let params: Vec<(&str, &str)> = queries.iter().map(|q| ("queries[]", q.as_str())).collect();
        let response = self
            .request(reqwest::Method::GET, self.documents_url())
            .query(&params)
            .send()
            .await?;
        let list: DocumentList = handle_response(response).await?;
        Ok(list.documents)
    }
}

#[async_trait]
impl TrendingService for AppwriteTrending {
    async fn record_search(&self, record: &SearchRecord) -> Result<()> {
        let existing = self
            .list(&[equal_query("searchTerm", &record.term)])
            .await?
            .into_iter()
            .next();

        let response = match existing {
            Some(doc) => {
                self.request(
                    reqwest::Method::PATCH,
                    format!("{}/{}", self.documents_url(), doc.id),
                )
                .json(&json!({ "data": { "count": doc.count + 1 } }))
                .send()
                .await?
            }
            None => {
                info!("New trending term: {}", record.term);
                self.request(reqwest::Method::POST, self.documents_url())
                    .json(&json!({
                        "documentId": "unique()",
                        "data": {
                            "searchTerm": record.term,
                            "count": 1,
                            "movie_id": record.movie_id,
                            "poster_url": record.poster_url,
                        }
                    }))
                    .send()
                    .await?
            }
        };

        let _: serde_json::Value = handle_response(response).await?;
        Ok(())
    }

    async fn fetch_top(&self, limit: usize) -> Result<Vec<TrendingEntry>> {
        let docs = self
            .list(&[order_desc_query("count"), limit_query(limit)])
            .await?;
        Ok(docs.into_iter().map(TrendingEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn movie(id: i64, poster: Option<&str>) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            poster_path: poster.map(str::to_string),
            backdrop_path: None,
            release_date: None,
            vote_average: 7.0,
            original_language: "ja".to_string(),
            genre_ids: vec![16],
            overview: None,
        }
    }

    fn entry(term: &str, count: i64) -> TrendingEntry {
        TrendingEntry {
            term: term.to_string(),
            count,
            movie_id: 1,
            poster_url: None,
        }
    }

    struct UnrankedBackend(Vec<TrendingEntry>);

    #[async_trait]
    impl TrendingService for UnrankedBackend {
        async fn record_search(&self, _record: &SearchRecord) -> Result<()> {
            Ok(())
        }

        async fn fetch_top(&self, _limit: usize) -> Result<Vec<TrendingEntry>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize_term("  Your   Name\t"), "your name");
        assert_eq!(normalize_term("naruto"), "naruto");
    }

    #[test]
    fn record_projects_first_result() {
        let record = SearchRecord::new("Naruto ", &movie(42, Some("/n.jpg")));
        assert_eq!(record.term, "naruto");
        assert_eq!(record.movie_id, 42);
        assert_eq!(
            record.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/n.jpg")
        );
    }

    #[test]
    fn rank_top_orders_and_truncates() {
        let ranked = rank_top(vec![entry("a", 1), entry("b", 9), entry("c", 4)], 2);
        let terms: Vec<&str> = ranked.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn fetch_ranked_enforces_limit_and_order() {
        let backend = UnrankedBackend(vec![
            entry("a", 2),
            entry("b", 7),
            entry("c", 7),
            entry("d", 1),
            entry("e", 3),
            entry("f", 9),
        ]);

        let top = fetch_ranked(&backend, 3).await.unwrap();
        assert!(top.len() <= 3);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(top[0].term, "f");
    }

    #[tokio::test]
    async fn sqlite_backend_counts_repeat_searches() {
        let trending = SqliteTrending::new(open_in_memory().unwrap());
        let naruto = SearchRecord::new("naruto", &movie(1, Some("/n.jpg")));
        let akira = SearchRecord::new("akira", &movie(2, None));

        trending.record_search(&naruto).await.unwrap();
        trending.record_search(&akira).await.unwrap();
        trending.record_search(&naruto).await.unwrap();

        let top = fetch_ranked(&trending, TRENDING_LIMIT).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].term, "naruto");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].poster_url, None);
    }

    #[test]
    fn appwrite_queries_are_json_encoded() {
        let q: serde_json::Value = serde_json::from_str(&equal_query("searchTerm", "naruto")).unwrap();
        assert_eq!(q["method"], "equal");
        assert_eq!(q["values"][0], "naruto");

        let q: serde_json::Value = serde_json::from_str(&limit_query(5)).unwrap();
        assert_eq!(q["values"][0], 5);

        let q: serde_json::Value = serde_json::from_str(&order_desc_query("count")).unwrap();
        assert_eq!(q["attribute"], "count");
    }

    #[test]
    fn appwrite_documents_parse() {
        let list: DocumentList = serde_json::from_str(
            r#"{"total": 1, "documents": [{"$id": "d1", "searchTerm": "naruto", "count": 4, "movie_id": 20, "poster_url": "https://image.tmdb.org/t/p/w500/n.jpg", "$createdAt": "2024-01-01"}]}"#,
        )
        .unwrap();
        let doc = list.documents.into_iter().next().unwrap();
        assert_eq!(doc.id, "d1");
        let entry = TrendingEntry::from(doc);
        assert_eq!(entry.term, "naruto");
        assert_eq!(entry.count, 4);
    }

    #[test]
    fn appwrite_documents_url_uses_config() {
        let service = AppwriteTrending::new(AppwriteConfig {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project: "p".to_string(),
            database: "db".to_string(),
            collection: "metrics".to_string(),
            api_key: None,
        });
        assert_eq!(
            service.documents_url(),
            "https://cloud.appwrite.io/v1/databases/db/collections/metrics/documents"
        );
    }
}
