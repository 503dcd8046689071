use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::tmdb::{self, Movie, MovieDetail};
use crate::db::{queries, DbConn};
use crate::error::Result;

/// Slot holding the serialized favorites array.
pub const FAVORITES_KEY: &str = "favorites";

/// Reduced projection of a movie, stored as one element of the favorites JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: i64,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
    pub original_language: Option<String>,
}

impl FavoriteEntry {
    pub fn year(&self) -> Option<&str> {
        tmdb::release_year(self.release_date.as_deref())
    }

    pub fn poster_url(&self, size: &str) -> Option<String> {
        self.poster_path.as_deref().map(|p| tmdb::image_url(size, p))
    }
}

impl From<&MovieDetail> for FavoriteEntry {
    fn from(movie: &MovieDetail) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: movie.vote_average,
            release_date: movie.release_date.clone(),
            original_language: movie.original_language.clone(),
        }
    }
}

impl From<&Movie> for FavoriteEntry {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: Some(movie.vote_average),
            release_date: movie.release_date.clone(),
            original_language: Some(movie.original_language.clone()),
        }
    }
}

// ── Key-value persistence ──

/// String slots addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Slots in the `kv_store` table.
#[derive(Clone)]
pub struct SqliteKvStore {
    conn: DbConn,
}

impl SqliteKvStore {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(queries::kv_get(&self.conn, key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Ok(queries::kv_set(&self.conn, key, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Ok(queries::kv_remove(&self.conn, key)?)
    }
}

// ── Favorites ──

/// Ordered favorites kept in a single slot. Every mutation rewrites the whole
/// collection; there is no protection against a second concurrent writer.
pub struct FavoritesStore<S> {
    store: S,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored favorites in insertion order. Unreadable or malformed data reads as empty.
    pub fn list(&self) -> Vec<FavoriteEntry> {
        self.read().unwrap_or_else(|e| {
            warn!("Failed to read favorites: {e}");
            Vec::new()
        })
    }

    /// Malformed data reads as empty; storage errors are returned.
    fn read(&self) -> Result<Vec<FavoriteEntry>> {
        let Some(raw) = self.store.get(FAVORITES_KEY)? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed favorites data: {e}");
            Vec::new()
        }))
    }

    pub fn contains(&self, id: i64) -> bool {
        self.list().iter().any(|f| f.id == id)
    }

    /// Remove `entry` by id if present, otherwise append it.
    /// Returns whether the movie is a favorite afterwards.
    pub fn toggle(&self, entry: FavoriteEntry) -> Result<bool> {
        let mut favorites = self.read()?;

        let now_favorite = if favorites.iter().any(|f| f.id == entry.id) {
            favorites.retain(|f| f.id != entry.id);
            false
        } else {
            favorites.push(entry);
            true
        };

        if favorites.is_empty() {
            self.store.remove(FAVORITES_KEY)?;
        } else {
            let raw = serde_json::to_string(&favorites)?;
            self.store.set(FAVORITES_KEY, &raw)?;
        }

        debug!("Favorites now hold {} entries", favorites.len());
        Ok(now_favorite)
    }
}
