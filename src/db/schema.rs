use serde::{Deserialize, Serialize};

// ── Table structs ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// One row of `search_counts`: a normalized search term and its representative movie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCount {
    pub search_term: String,
    pub count: i64,
    pub movie_id: i64,
    pub poster_url: Option<String>,
}
