use tracing::{debug, warn};

use crate::core::favorites::FavoriteEntry;
use crate::core::tmdb::{CastMember, Movie, MovieDetail, MovieSource, Video};

pub const CAST_LIMIT: usize = 6;
pub const SIMILAR_LIMIT: usize = 4;
pub const NOT_FOUND_MESSAGE: &str = "Movie not found";
pub const SHARE_TOAST: &str = "Link copied to clipboard!";

/// Public TMDB page for a movie.
pub fn share_url(id: i64) -> String {
    format!("https://www.themoviedb.org/movie/{id}")
}

/// Everything the detail view renders. Each slice is independent; a failed
/// fetch leaves its slot empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailData {
    pub movie: Option<MovieDetail>,
    pub trailer: Option<Video>,
    pub cast: Vec<CastMember>,
    pub similar: Vec<Movie>,
}

/// First YouTube trailer, falling back to the first YouTube teaser.
pub fn select_trailer(videos: &[Video]) -> Option<Video> {
    let youtube = |kind: &str| {
        videos
            .iter()
            .find(|v| v.site == "YouTube" && v.video_type == kind)
            .cloned()
    };
    youtube("Trailer").or_else(|| youtube("Teaser"))
}

/// Fetch detail, videos, credits and similar titles concurrently and wait for all four.
pub async fn load_detail(source: &dyn MovieSource, id: i64) -> DetailData {
    let (movie, videos, credits, similar) = futures::join!(
        source.movie_detail(id),
        source.movie_videos(id),
        source.movie_credits(id),
        source.similar_movies(id),
    );

    let movie = movie
        .inspect_err(|e| warn!("Error fetching movie {id}: {e}"))
        .ok();
    let trailer = videos
        .inspect_err(|e| warn!("Error fetching videos for {id}: {e}"))
        .ok()
        .and_then(|v| select_trailer(&v));
    let cast = credits
        .inspect_err(|e| warn!("Error fetching credits for {id}: {e}"))
        .map(|mut c| {
            c.truncate(CAST_LIMIT);
            c
        })
        .unwrap_or_default();
    let similar = similar
        .inspect_err(|e| warn!("Error fetching similar movies for {id}: {e}"))
        .map(|s| {
            s.into_iter()
                .filter(Movie::is_anime)
                .take(SIMILAR_LIMIT)
                .collect()
        })
        .unwrap_or_default();

    DetailData {
        movie,
        trailer,
        cast,
        similar,
    }
}

#[derive(Debug, Clone)]
pub enum DetailEvent {
    Loaded { id: i64, data: DetailData },
    ToggleFavorite,
    FavoriteUpdated {
        id: i64,
        result: std::result::Result<bool, String>,
    },
    Share,
    OpenTrailer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEffect {
    Load { id: i64 },
    ToggleFavorite(FavoriteEntry),
    CopyToClipboard { text: String, toast: &'static str },
    OpenUrl(String),
    Notify(String),
}

/// State of one detail page.
#[derive(Debug)]
pub struct DetailState {
    pub id: i64,
    pub loading: bool,
    pub data: DetailData,
    pub is_favorite: bool,
}

impl DetailState {
    pub fn new(id: i64, is_favorite: bool) -> (Self, DetailEffect) {
        let state = Self {
            id,
            loading: true,
            data: DetailData::default(),
            is_favorite,
        };
        (state, DetailEffect::Load { id })
    }

    pub fn not_found(&self) -> bool {
        !self.loading && self.data.movie.is_none()
    }

    pub fn apply(&mut self, event: DetailEvent) -> Vec<DetailEffect> {
        match event {
            DetailEvent::Loaded { id, data } => {
                if id != self.id {
                    debug!("Ignoring detail response for {id} while showing {}", self.id);
                    return Vec::new();
                }
                self.loading = false;
                self.data = data;
                Vec::new()
            }
            DetailEvent::ToggleFavorite => match &self.data.movie {
                Some(movie) => vec![DetailEffect::ToggleFavorite(FavoriteEntry::from(movie))],
                None => Vec::new(),
            },
            DetailEvent::FavoriteUpdated { id, result } => {
                if id != self.id {
                    return Vec::new();
                }
                match result {
                    Ok(now_favorite) => {
                        self.is_favorite = now_favorite;
                        Vec::new()
                    }
                    Err(e) => {
                        warn!("Failed to update favorites: {e}");
                        vec![DetailEffect::Notify(format!("Could not update favorites: {e}"))]
                    }
                }
            }
            DetailEvent::Share => vec![DetailEffect::CopyToClipboard {
                text: share_url(self.id),
                toast: SHARE_TOAST,
            }],
            DetailEvent::OpenTrailer => self
                .data
                .trailer
                .as_ref()
                .map(|t| DetailEffect::OpenUrl(t.watch_url()))
                .into_iter()
                .collect(),
        }
    }
}
