//! Catalog view state: search text, discover filters, the fetched list and the
//! trending row, driven through a single `apply` transition.
//!
//! `apply` never performs I/O. It returns effects that the application shell
//! turns into tasks, and the outcome of each task comes back as another event.
//! Every issued fetch carries a `RequestId`; only the response to the most
//! recently issued fetch is accepted.

use std::time::Duration;
use tracing::{debug, warn};

use crate::core::debounce::{Debouncer, SEARCH_DEBOUNCE};
use crate::core::favorites::FavoriteEntry;
use crate::core::tmdb::{DiscoverParams, MinRating, Movie, MovieSource, SortKey};
use crate::core::trending::{SearchRecord, TrendingEntry};
use crate::error::Result;

pub const FETCH_ERROR_MESSAGE: &str = "An error occurred while fetching anime.";
pub const EMPTY_RESULTS_MESSAGE: &str = "No anime movies found.";
pub const EMPTY_FAVORITES_MESSAGE: &str = "No favorites yet. Start adding some!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    /// Free-text search, filtered to anime after the response arrives.
    Search { term: String },
    /// Anime discover listing with sort and rating floor.
    Discover(DiscoverParams),
}

impl CatalogQuery {
    pub fn new(debounced_text: &str, params: DiscoverParams) -> Self {
        let term = debounced_text.trim();
        if term.is_empty() {
            Self::Discover(params)
        } else {
            Self::Search {
                term: term.to_string(),
            }
        }
    }
}

/// Run one catalog query. Search results are narrowed to the anime category and language.
pub async fn fetch_catalog(source: &dyn MovieSource, query: &CatalogQuery) -> Result<Vec<Movie>> {
    match query {
        CatalogQuery::Search { term } => Ok(source
            .search_movies(term)
            .await?
            .into_iter()
            .filter(Movie::is_anime)
            .collect()),
        CatalogQuery::Discover(params) => source.discover_movies(params).await,
    }
}

#[derive(Debug, Clone)]
pub enum CatalogEvent {
    Mounted,
    SearchTextChanged(String),
    DebounceElapsed(u64),
    SortChanged(SortKey),
    MinRatingChanged(MinRating),
    FavoritesToggled,
    /// Re-run the current query and trending load (after settings change).
    Refresh,
    ResultsLoaded {
        request: RequestId,
        result: std::result::Result<Vec<Movie>, String>,
    },
    TrendingLoaded(std::result::Result<Vec<TrendingEntry>, String>),
    SearchRecorded {
        term: String,
        result: std::result::Result<(), String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEffect {
    Debounce { ticket: u64, delay: Duration },
    Fetch { request: RequestId, query: CatalogQuery },
    RecordSearch(SearchRecord),
    LoadTrending,
}

/// What the results section shows. Exactly one variant applies at a time.
#[derive(Debug, PartialEq)]
pub enum ResultView<'a> {
    Loading,
    Error(&'a str),
    Empty(&'static str),
    Movies(&'a [Movie]),
    Favorites(&'a [FavoriteEntry]),
}

#[derive(Debug, Default)]
pub struct CatalogState {
    pub search_text: String,
    pub debounced_text: String,
    pub sort: SortKey,
    pub min_rating: MinRating,
    pub show_favorites: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub movies: Vec<Movie>,
    pub trending: Vec<TrendingEntry>,
    /// Outcome of the latest trending write: the term on success, the error otherwise.
    pub last_search_recorded: Option<std::result::Result<String, String>>,
    debouncer: Debouncer,
    issued: u64,
    in_flight: Option<(RequestId, CatalogQuery)>,
}

impl CatalogState {
    pub fn discover_params(&self) -> DiscoverParams {
        DiscoverParams {
            sort: self.sort,
            min_rating: self.min_rating,
        }
    }

    pub fn current_query(&self) -> CatalogQuery {
        CatalogQuery::new(&self.debounced_text, self.discover_params())
    }

    pub fn heading(&self) -> &'static str {
        if self.show_favorites {
            "My Favorites"
        } else {
            "Popular Anime Movies"
        }
    }

    /// Sort and rating only apply to the discover listing.
    pub fn shows_filters(&self) -> bool {
        !self.show_favorites && self.search_text.is_empty()
    }

    pub fn result_view<'a>(&'a self, favorites: &'a [FavoriteEntry]) -> ResultView<'a> {
        if self.show_favorites {
            return if favorites.is_empty() {
                ResultView::Empty(EMPTY_FAVORITES_MESSAGE)
            } else {
                ResultView::Favorites(favorites)
            };
        }

        if self.loading {
            ResultView::Loading
        } else if let Some(error) = &self.error {
            ResultView::Error(error)
        } else if self.movies.is_empty() {
            ResultView::Empty(EMPTY_RESULTS_MESSAGE)
        } else {
            ResultView::Movies(&self.movies)
        }
    }

    pub fn apply(&mut self, event: CatalogEvent) -> Vec<CatalogEffect> {
        match event {
            CatalogEvent::Mounted => vec![self.issue_fetch(), CatalogEffect::LoadTrending],

            CatalogEvent::SearchTextChanged(text) => {
                self.search_text = text;
                let ticket = self.debouncer.bump();
                vec![CatalogEffect::Debounce {
                    ticket,
                    delay: SEARCH_DEBOUNCE,
                }]
            }
            CatalogEvent::DebounceElapsed(ticket) => {
                if !self.debouncer.is_current(ticket) || self.search_text == self.debounced_text {
                    return Vec::new();
                }
                self.debounced_text = self.search_text.clone();
                self.query_changed()
            }
            CatalogEvent::SortChanged(sort) => {
                if sort == self.sort {
                    return Vec::new();
                }
                self.sort = sort;
                self.query_changed()
            }
            CatalogEvent::MinRatingChanged(min_rating) => {
                if min_rating == self.min_rating {
                    return Vec::new();
                }
                self.min_rating = min_rating;
                self.query_changed()
            }
            CatalogEvent::FavoritesToggled => {
                self.show_favorites = !self.show_favorites;
                self.query_changed()
            }
            CatalogEvent::Refresh => {
                let mut effects = self.query_changed();
                effects.push(CatalogEffect::LoadTrending);
                effects
            }

            CatalogEvent::ResultsLoaded { request, result } => {
                let query = match self.in_flight.take() {
                    Some((latest, query)) if latest == request => query,
                    other => {
                        debug!("Dropping stale catalog response {:?}", request);
                        self.in_flight = other;
                        return Vec::new();
                    }
                };

                self.loading = false;
                match result {
                    Ok(movies) => {
                        self.error = None;
                        let record = match (&query, movies.first()) {
                            (CatalogQuery::Search { term }, Some(first)) => {
                                Some(CatalogEffect::RecordSearch(SearchRecord::new(term, first)))
                            }
                            _ => None,
                        };
                        self.movies = movies;
                        record.into_iter().collect()
                    }
                    Err(e) => {
                        warn!("Error fetching anime: {e}");
                        self.error = Some(FETCH_ERROR_MESSAGE.to_string());
                        self.movies.clear();
                        Vec::new()
                    }
                }
            }

            CatalogEvent::TrendingLoaded(Ok(entries)) => {
                self.trending = entries;
                Vec::new()
            }
            CatalogEvent::TrendingLoaded(Err(e)) => {
                warn!("Error fetching trending searches: {e}");
                Vec::new()
            }

            CatalogEvent::SearchRecorded { term, result } => {
                match &result {
                    Ok(()) => debug!("Recorded search for {term:?}"),
                    Err(e) => warn!("Failed to record search for {term:?}: {e}"),
                }
                self.last_search_recorded = Some(result.map(|()| term));
                Vec::new()
            }
        }
    }

    fn query_changed(&mut self) -> Vec<CatalogEffect> {
        if self.show_favorites {
            Vec::new()
        } else {
            vec![self.issue_fetch()]
        }
    }

    fn issue_fetch(&mut self) -> CatalogEffect {
        self.issued += 1;
        let request = RequestId(self.issued);
        let query = self.current_query();

        self.loading = true;
        self.error = None;
        self.in_flight = Some((request, query.clone()));

        CatalogEffect::Fetch { request, query }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tmdb::{CastMember, MovieDetail, Video};
    use crate::error::CatalogError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn movie(id: i64, rating: f64, genres: &[i64], language: &str) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            poster_path: Some(format!("/{id}.jpg")),
            backdrop_path: None,
            release_date: Some("2002-01-01".to_string()),
            vote_average: rating,
            original_language: language.to_string(),
            genre_ids: genres.to_vec(),
            overview: None,
        }
    }

    /// Backend stub: fixed search results, discover honours the rating floor.
    #[derive(Default)]
    struct StubSource {
        search: Vec<Movie>,
        discover: Vec<Movie>,
        fail: bool,
        discover_calls: Mutex<Vec<DiscoverParams>>,
    }

    #[async_trait]
    impl MovieSource for StubSource {
        async fn search_movies(&self, _query: &str) -> Result<Vec<Movie>> {
            if self.fail {
                return Err(CatalogError::Api {
                    status_code: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(self.search.clone())
        }

        async fn discover_movies(&self, params: &DiscoverParams) -> Result<Vec<Movie>> {
            self.discover_calls.lock().unwrap().push(*params);
            let floor = f64::from(params.min_rating.value());
            Ok(self
                .discover
                .iter()
                .filter(|m| m.vote_average >= floor)
                .cloned()
                .collect())
        }

        async fn movie_detail(&self, _id: i64) -> Result<MovieDetail> {
            Err(CatalogError::Config("unused".to_string()))
        }

        async fn movie_videos(&self, _id: i64) -> Result<Vec<Video>> {
            Ok(Vec::new())
        }

        async fn movie_credits(&self, _id: i64) -> Result<Vec<CastMember>> {
            Ok(Vec::new())
        }

        async fn similar_movies(&self, _id: i64) -> Result<Vec<Movie>> {
            Ok(Vec::new())
        }
    }

    /// Execute fetch effects against the stub and feed results back, returning
    /// every other effect produced along the way.
    async fn drive(
        state: &mut CatalogState,
        source: &StubSource,
        effects: Vec<CatalogEffect>,
    ) -> Vec<CatalogEffect> {
        let mut pending = effects;
        let mut others = Vec::new();
        while let Some(effect) = pending.pop() {
            match effect {
                CatalogEffect::Fetch { request, query } => {
                    let result = fetch_catalog(source, &query).await.map_err(|e| e.to_string());
                    pending.extend(state.apply(CatalogEvent::ResultsLoaded { request, result }));
                }
                other => others.push(other),
            }
        }
        others
    }

    fn debounce_ticket(effects: &[CatalogEffect]) -> u64 {
        match effects {
            [CatalogEffect::Debounce { ticket, delay }] => {
                assert_eq!(*delay, SEARCH_DEBOUNCE);
                *ticket
            }
            other => panic!("expected one debounce effect, got {other:?}"),
        }
    }

    fn anime_search_source() -> StubSource {
        StubSource {
            search: vec![
                movie(1, 7.0, &[28], "en"),
                movie(2, 8.0, &[16, 14], "ja"),
                movie(3, 6.0, &[16], "en"),
                movie(4, 7.5, &[16], "ja"),
            ],
            discover: vec![movie(10, 9.1, &[16], "ja"), movie(11, 6.2, &[16], "ja")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn search_results_are_anime_subset_of_raw_response() {
        let source = anime_search_source();
        let results = fetch_catalog(
            &source,
            &CatalogQuery::Search {
                term: "x".to_string(),
            },
        )
        .await
        .unwrap();

        let ids: Vec<i64> = results.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert!(results.iter().all(|m| source.search.contains(m) && m.is_anime()));
    }

    #[tokio::test]
    async fn discover_with_rating_eight_returns_only_high_ratings() {
        let source = StubSource {
            discover: vec![
                movie(1, 8.4, &[16], "ja"),
                movie(2, 7.9, &[16], "ja"),
                movie(3, 8.0, &[16], "ja"),
            ],
            ..Default::default()
        };
        let mut state = CatalogState::default();
        let effects = state.apply(CatalogEvent::MinRatingChanged(MinRating::Eight));
        drive(&mut state, &source, effects).await;

        assert!(!state.movies.is_empty());
        assert!(state.movies.iter().all(|m| m.vote_average >= 8.0));
        assert_eq!(
            source.discover_calls.lock().unwrap().last().map(|p| p.min_rating),
            Some(MinRating::Eight)
        );
    }

    #[tokio::test]
    async fn naruto_search_records_exactly_one_trending_increment() {
        let source = anime_search_source();
        let mut state = CatalogState::default();

        let mounted = state.apply(CatalogEvent::Mounted);
        let others = drive(&mut state, &source, mounted).await;
        assert_eq!(others, vec![CatalogEffect::LoadTrending]);

        let ticket = debounce_ticket(&state.apply(CatalogEvent::SearchTextChanged("naruto".to_string())));
        let effects = state.apply(CatalogEvent::DebounceElapsed(ticket));
        assert_eq!(
            effects,
            vec![CatalogEffect::Fetch {
                request: RequestId(2),
                query: CatalogQuery::Search {
                    term: "naruto".to_string()
                },
            }]
        );

        let others = drive(&mut state, &source, effects).await;
        let records: Vec<&SearchRecord> = others
            .iter()
            .filter_map(|e| match e {
                CatalogEffect::RecordSearch(r) => Some(r),
                _ => None,
            })
            .collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].term, "naruto");
        assert_eq!(records[0], &SearchRecord::new("naruto", &state.movies[0]));
        assert_eq!(records[0].movie_id, 2);
    }

    #[tokio::test]
    async fn empty_search_and_discover_do_not_record() {
        let source = StubSource {
            search: vec![movie(1, 7.0, &[28], "en")],
            discover: vec![movie(10, 9.0, &[16], "ja")],
            ..Default::default()
        };
        let mut state = CatalogState::default();

        let mounted = state.apply(CatalogEvent::Mounted);
        assert_eq!(drive(&mut state, &source, mounted).await, vec![CatalogEffect::LoadTrending]);

        let ticket = debounce_ticket(&state.apply(CatalogEvent::SearchTextChanged("x".to_string())));
        let effects = state.apply(CatalogEvent::DebounceElapsed(ticket));
        assert!(drive(&mut state, &source, effects).await.is_empty());
        assert_eq!(state.result_view(&[]), ResultView::Empty(EMPTY_RESULTS_MESSAGE));
    }

    #[test]
    fn only_latest_keystroke_promotes_search_text() {
        let mut state = CatalogState::default();
        let first = debounce_ticket(&state.apply(CatalogEvent::SearchTextChanged("nar".to_string())));
        let second = debounce_ticket(&state.apply(CatalogEvent::SearchTextChanged("naruto".to_string())));

        assert!(state.apply(CatalogEvent::DebounceElapsed(first)).is_empty());
        assert_eq!(state.debounced_text, "");

        let effects = state.apply(CatalogEvent::DebounceElapsed(second));
        assert_eq!(effects.len(), 1);
        assert_eq!(state.debounced_text, "naruto");
    }

    #[test]
    fn unchanged_debounced_text_does_not_refetch() {
        let mut state = CatalogState::default();
        let ticket = debounce_ticket(&state.apply(CatalogEvent::SearchTextChanged(String::new())));
        assert!(state.apply(CatalogEvent::DebounceElapsed(ticket)).is_empty());
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut state = CatalogState::default();
        let first = match state.apply(CatalogEvent::SortChanged(SortKey::Rating)).pop() {
            Some(CatalogEffect::Fetch { request, .. }) => request,
            other => panic!("expected fetch, got {other:?}"),
        };
        let second = match state.apply(CatalogEvent::SortChanged(SortKey::Newest)).pop() {
            Some(CatalogEffect::Fetch { request, .. }) => request,
            other => panic!("expected fetch, got {other:?}"),
        };
        assert!(second > first);

        // The newer request resolves first; the older one must not overwrite it.
        state.apply(CatalogEvent::ResultsLoaded {
            request: second,
            result: Ok(vec![movie(2, 8.0, &[16], "ja")]),
        });
        state.apply(CatalogEvent::ResultsLoaded {
            request: first,
            result: Ok(vec![movie(1, 9.0, &[16], "ja")]),
        });

        assert_eq!(state.movies.len(), 1);
        assert_eq!(state.movies[0].id, 2);
        assert!(!state.loading);
    }

    #[test]
    fn older_response_does_not_clear_loading_of_newer_request() {
        let mut state = CatalogState::default();
        let first = match state.apply(CatalogEvent::Mounted).remove(0) {
            CatalogEffect::Fetch { request, .. } => request,
            other => panic!("expected fetch, got {other:?}"),
        };
        state.apply(CatalogEvent::SortChanged(SortKey::Oldest));

        state.apply(CatalogEvent::ResultsLoaded {
            request: first,
            result: Err("timeout".to_string()),
        });
        assert_eq!(state.result_view(&[]), ResultView::Loading);
    }

    #[test]
    fn failure_maps_to_generic_message_and_exclusive_view() {
        let mut state = CatalogState::default();
        let request = match state.apply(CatalogEvent::Mounted).remove(0) {
            CatalogEffect::Fetch { request, .. } => request,
            other => panic!("expected fetch, got {other:?}"),
        };
        assert_eq!(state.result_view(&[]), ResultView::Loading);

        state.apply(CatalogEvent::ResultsLoaded {
            request,
            result: Err("API error: 401".to_string()),
        });
        assert_eq!(state.result_view(&[]), ResultView::Error(FETCH_ERROR_MESSAGE));
        assert!(!state.loading);
        assert!(state.movies.is_empty());
    }

    #[test]
    fn favorites_view_skips_fetching_and_shows_favorites() {
        let mut state = CatalogState::default();
        assert!(state.apply(CatalogEvent::FavoritesToggled).is_empty());
        assert_eq!(state.heading(), "My Favorites");
        assert!(!state.shows_filters());
        assert_eq!(state.result_view(&[]), ResultView::Empty(EMPTY_FAVORITES_MESSAGE));

        let favorites = vec![FavoriteEntry::from(&movie(7, 8.0, &[16], "ja"))];
        assert_eq!(state.result_view(&favorites), ResultView::Favorites(&favorites));

        // Filter changes while favorites are shown wait until the toggle is turned off.
        assert!(state.apply(CatalogEvent::SortChanged(SortKey::Rating)).is_empty());
        let effects = state.apply(CatalogEvent::FavoritesToggled);
        assert!(matches!(
            effects.as_slice(),
            [CatalogEffect::Fetch {
                query: CatalogQuery::Discover(DiscoverParams {
                    sort: SortKey::Rating,
                    ..
                }),
                ..
            }]
        ));
    }

    #[test]
    fn search_recorded_outcome_is_observable() {
        let mut state = CatalogState::default();
        state.apply(CatalogEvent::SearchRecorded {
            term: "naruto".to_string(),
            result: Ok(()),
        });
        assert_eq!(state.last_search_recorded, Some(Ok("naruto".to_string())));

        state.apply(CatalogEvent::SearchRecorded {
            term: "akira".to_string(),
            result: Err("offline".to_string()),
        });
        assert_eq!(state.last_search_recorded, Some(Err("offline".to_string())));
    }

    #[test]
    fn trending_failure_keeps_previous_entries() {
        let mut state = CatalogState::default();
        let entry = TrendingEntry {
            term: "naruto".to_string(),
            count: 3,
            movie_id: 1,
            poster_url: None,
        };
        state.apply(CatalogEvent::TrendingLoaded(Ok(vec![entry.clone()])));
        state.apply(CatalogEvent::TrendingLoaded(Err("down".to_string())));
        assert_eq!(state.trending, vec![entry]);
    }

    #[test]
    fn whitespace_only_text_is_a_discover_query() {
        assert!(matches!(
            CatalogQuery::new("   ", DiscoverParams::default()),
            CatalogQuery::Discover(_)
        ));
    }

    #[tokio::test]
    async fn search_failure_surfaces_as_error() {
        let source = StubSource {
            fail: true,
            ..Default::default()
        };
        let result = fetch_catalog(
            &source,
            &CatalogQuery::Search {
                term: "x".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(CatalogError::Api { status_code: 500, .. })));
    }
}
