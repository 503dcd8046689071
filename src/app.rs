use iced::widget::{column, container, scrollable, stack};
use iced::{Element, Length, Subscription, Task, Theme};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::catalog::{self, CatalogEffect, CatalogEvent, CatalogState, RequestId};
use crate::core::debounce;
use crate::core::detail::{self, DetailData, DetailEffect, DetailEvent, DetailState};
use crate::core::favorites::{FavoriteEntry, FavoritesStore, SqliteKvStore};
use crate::core::tmdb::{MinRating, Movie, MovieSource, SortKey, TmdbClient};
use crate::core::trending::{
    self, AppwriteTrending, SqliteTrending, TrendingEntry, TrendingService, TRENDING_LIMIT,
};
use crate::db::{self, queries, DbConn};
use crate::theme as app_theme;
use crate::ui;
use crate::ui::movie_grid::{CardInfo, PosterCache};
use crate::ui::toast::{Toast, ToastType};

// ── Message enum ──

#[derive(Debug, Clone)]
pub enum Message {
    // Catalog
    SearchChanged(String),
    DebounceElapsed(u64),
    SortChanged(SortKey),
    MinRatingChanged(MinRating),
    ToggleFavoritesView,
    CatalogLoaded(RequestId, Result<Vec<Movie>, String>),
    TrendingLoaded(Result<Vec<TrendingEntry>, String>),
    SearchRecorded(String, Result<(), String>),

    // Navigation
    OpenMovie(i64),
    Back,

    // Detail
    DetailLoaded(i64, DetailData),
    ToggleFavorite,
    Share,
    OpenTrailer,
    TrailerOpened(Result<(), String>),

    // Settings
    ToggleSettings,
    SettingChanged(String, String),
    SaveSettings,
    SettingsSaved(Result<(), String>),

    // Toast
    DismissToast(u64),
    TickToasts,

    // Poster
    PosterLoaded(String, Result<Vec<u8>, String>),

    // Keyboard
    KeyPressed(iced::keyboard::Key, iced::keyboard::Modifiers),
}

// ── Routing ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Catalog,
    Detail(i64),
}

/// Route history. The catalog is always at the bottom and cannot be popped.
#[derive(Debug)]
pub struct History {
    stack: Vec<Route>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            stack: vec![Route::Catalog],
        }
    }
}

impl History {
    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Catalog)
    }

    pub fn push(&mut self, route: Route) {
        if self.current() != route {
            self.stack.push(route);
        }
    }

    /// Pop the current route; returns the route now shown, or `None` at the root.
    pub fn back(&mut self) -> Option<Route> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.stack.pop();
        Some(self.current())
    }
}

// ── App state ──

pub struct App {
    conn: DbConn,
    config: AppConfig,
    source: Arc<dyn MovieSource>,
    trending: Arc<dyn TrendingService>,

    // Favorites
    favorites_store: FavoritesStore<SqliteKvStore>,
    favorites: Vec<FavoriteEntry>,

    // Views
    history: History,
    catalog: CatalogState,
    detail: Option<DetailState>,

    // Settings
    settings_open: bool,
    settings: HashMap<String, String>,
    settings_draft: HashMap<String, String>,

    // Toast
    toasts: Vec<Toast>,
    next_toast_id: u64,

    // Poster cache
    poster_cache: PosterCache,
    posters_requested: HashSet<String>,
}

fn build_services(
    conn: &DbConn,
    config: &AppConfig,
) -> (Arc<dyn MovieSource>, Arc<dyn TrendingService>) {
    let source: Arc<dyn MovieSource> = Arc::new(TmdbClient::new(config.tmdb_token.clone()));
    let trending: Arc<dyn TrendingService> = match &config.appwrite {
        Some(appwrite) => Arc::new(AppwriteTrending::new(appwrite.clone())),
        None => Arc::new(SqliteTrending::new(conn.clone())),
    };
    info!("Trending searches stored in {} backend", config.trending_backend());
    (source, trending)
}

async fn load_image(url: String) -> Result<Vec<u8>, String> {
    let response = reqwest::get(&url).await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

impl App {
    fn add_toast(&mut self, message: String, toast_type: ToastType) {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        self.toasts.push(Toast::new(id, message, toast_type));
    }

    /// Request images not yet cached or in flight.
    fn fetch_posters(&mut self, urls: impl IntoIterator<Item = String>) -> Task<Message> {
        let tasks: Vec<Task<Message>> = urls
            .into_iter()
            .filter(|url| self.posters_requested.insert(url.clone()))
            .map(|url| {
                Task::perform(load_image(url.clone()), move |result| {
                    Message::PosterLoaded(url, result)
                })
            })
            .collect();
        Task::batch(tasks)
    }

    fn catalog_posters(&mut self) -> Task<Message> {
        let urls: Vec<String> = if self.catalog.show_favorites {
            self.favorites
                .iter()
                .filter_map(|f| CardInfo::from(f).poster_url)
                .collect()
        } else {
            self.catalog
                .movies
                .iter()
                .filter_map(|m| CardInfo::from(m).poster_url)
                .collect()
        };
        self.fetch_posters(urls)
    }

    // ── Catalog effects ──

    fn run_catalog(&mut self, event: CatalogEvent) -> Task<Message> {
        let effects = self.catalog.apply(event);
        Task::batch(effects.into_iter().map(|effect| self.catalog_task(effect)))
    }

    fn catalog_task(&self, effect: CatalogEffect) -> Task<Message> {
        match effect {
            CatalogEffect::Debounce { ticket, delay } => {
                Task::perform(debounce::settle(ticket, delay), Message::DebounceElapsed)
            }
            CatalogEffect::Fetch { request, query } => {
                let source = self.source.clone();
                Task::perform(
                    async move {
                        catalog::fetch_catalog(source.as_ref(), &query)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    move |result| Message::CatalogLoaded(request, result),
                )
            }
            CatalogEffect::RecordSearch(record) => {
                let service = self.trending.clone();
                let term = record.term.clone();
                Task::perform(
                    async move {
                        service
                            .record_search(&record)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    move |result| Message::SearchRecorded(term, result),
                )
            }
            CatalogEffect::LoadTrending => {
                let service = self.trending.clone();
                Task::perform(
                    async move {
                        trending::fetch_ranked(service.as_ref(), TRENDING_LIMIT)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::TrendingLoaded,
                )
            }
        }
    }

    // ── Detail effects ──

    fn open_detail(&mut self, id: i64) -> Task<Message> {
        let is_favorite = self.favorites.iter().any(|f| f.id == id);
        let (state, effect) = DetailState::new(id, is_favorite);
        self.detail = Some(state);
        self.detail_task(effect)
    }

    fn run_detail(&mut self, event: DetailEvent) -> Task<Message> {
        let Some(state) = self.detail.as_mut() else {
            return Task::none();
        };
        let effects = state.apply(event);
        let tasks: Vec<Task<Message>> = effects
            .into_iter()
            .map(|effect| self.detail_task(effect))
            .collect();
        Task::batch(tasks)
    }

    fn detail_task(&mut self, effect: DetailEffect) -> Task<Message> {
        match effect {
            DetailEffect::Load { id } => {
                let source = self.source.clone();
                Task::perform(
                    async move { detail::load_detail(source.as_ref(), id).await },
                    move |data| Message::DetailLoaded(id, data),
                )
            }
            DetailEffect::ToggleFavorite(entry) => {
                let id = entry.id;
                let result = self
                    .favorites_store
                    .toggle(entry)
                    .map_err(|e| e.to_string());
                if result.is_ok() {
                    self.favorites = self.favorites_store.list();
                }
                self.run_detail(DetailEvent::FavoriteUpdated { id, result })
            }
            DetailEffect::CopyToClipboard { text, toast } => {
                self.add_toast(toast.to_string(), ToastType::Success);
                iced::clipboard::write(text)
            }
            DetailEffect::OpenUrl(url) => {
                info!("Opening {url}");
                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || open::that(&url))
                            .await
                            .map_err(|e| e.to_string())?
                            .map_err(|e| e.to_string())
                    },
                    Message::TrailerOpened,
                )
            }
            DetailEffect::Notify(message) => {
                self.add_toast(message, ToastType::Error);
                Task::none()
            }
        }
    }
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let db_path = db::db_path();
        let conn = match db::open_database(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to open {}: {e}; using in-memory storage", db_path.display());
                db::open_in_memory().expect("Failed to open in-memory database")
            }
        };

        let settings: HashMap<String, String> = match queries::fetch_settings(&conn) {
            Ok(rows) => rows.into_iter().map(|s| (s.key, s.value)).collect(),
            Err(e) => {
                warn!("Failed to load settings: {e}");
                HashMap::new()
            }
        };
        let config = AppConfig::from_settings(&settings);
        let (source, trending) = build_services(&conn, &config);

        let favorites_store = FavoritesStore::new(SqliteKvStore::new(conn.clone()));
        let favorites = favorites_store.list();

        let mut app = App {
            conn,
            config,
            source,
            trending,
            favorites_store,
            favorites,
            history: History::default(),
            catalog: CatalogState::default(),
            detail: None,
            settings_open: false,
            settings: settings.clone(),
            settings_draft: settings,
            toasts: Vec::new(),
            next_toast_id: 1,
            poster_cache: PosterCache::new(),
            posters_requested: HashSet::new(),
        };

        if app.config.tmdb_token.is_empty() {
            app.add_toast(
                "Add a TMDB API read token in Settings to browse movies.".to_string(),
                ToastType::Info,
            );
        }

        let init_task = app.run_catalog(CatalogEvent::Mounted);
        (app, init_task)
    }

    pub fn title(&self) -> String {
        match (self.history.current(), &self.detail) {
            (Route::Detail(_), Some(state)) if state.not_found() => {
                format!("{} - AniFlix", detail::NOT_FOUND_MESSAGE)
            }
            (Route::Detail(_), Some(state)) => state
                .data
                .movie
                .as_ref()
                .map(|m| format!("{} - AniFlix", m.title))
                .unwrap_or_else(|| "AniFlix".to_string()),
            _ => "AniFlix".to_string(),
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subs = vec![];

        // Toast auto-dismiss ticker
        if !self.toasts.is_empty() {
            subs.push(
                iced::time::every(std::time::Duration::from_millis(100)).map(|_| Message::TickToasts),
            );
        }

        subs.push(iced::keyboard::listen().map(|event| match event {
            iced::keyboard::Event::KeyPressed { key, modifiers, .. } => {
                Message::KeyPressed(key, modifiers)
            }
            _ => Message::TickToasts,
        }));

        Subscription::batch(subs)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // ── Catalog ──
            Message::SearchChanged(text) => self.run_catalog(CatalogEvent::SearchTextChanged(text)),
            Message::DebounceElapsed(ticket) => self.run_catalog(CatalogEvent::DebounceElapsed(ticket)),
            Message::SortChanged(sort) => self.run_catalog(CatalogEvent::SortChanged(sort)),
            Message::MinRatingChanged(min_rating) => {
                self.run_catalog(CatalogEvent::MinRatingChanged(min_rating))
            }
            Message::ToggleFavoritesView => {
                self.favorites = self.favorites_store.list();
                let task = self.run_catalog(CatalogEvent::FavoritesToggled);
                Task::batch([task, self.catalog_posters()])
            }
            Message::CatalogLoaded(request, result) => {
                let task = self.run_catalog(CatalogEvent::ResultsLoaded { request, result });
                Task::batch([task, self.catalog_posters()])
            }
            Message::TrendingLoaded(result) => {
                let task = self.run_catalog(CatalogEvent::TrendingLoaded(result));
                let urls: Vec<String> = self
                    .catalog
                    .trending
                    .iter()
                    .filter_map(|e| e.poster_url.clone())
                    .collect();
                Task::batch([task, self.fetch_posters(urls)])
            }
            Message::SearchRecorded(term, result) => {
                self.run_catalog(CatalogEvent::SearchRecorded { term, result })
            }

            // ── Navigation ──
            Message::OpenMovie(id) => {
                self.history.push(Route::Detail(id));
                self.open_detail(id)
            }
            Message::Back => match self.history.back() {
                Some(Route::Detail(id)) => self.open_detail(id),
                Some(Route::Catalog) => {
                    self.detail = None;
                    self.favorites = self.favorites_store.list();
                    self.catalog_posters()
                }
                None => Task::none(),
            },

            // ── Detail ──
            Message::DetailLoaded(id, data) => {
                let urls = ui::detail_view::image_urls(&data);
                let task = self.run_detail(DetailEvent::Loaded { id, data });
                Task::batch([task, self.fetch_posters(urls)])
            }
            Message::ToggleFavorite => self.run_detail(DetailEvent::ToggleFavorite),
            Message::Share => self.run_detail(DetailEvent::Share),
            Message::OpenTrailer => self.run_detail(DetailEvent::OpenTrailer),
            Message::TrailerOpened(Ok(())) => Task::none(),
            Message::TrailerOpened(Err(e)) => {
                warn!("Failed to open trailer: {e}");
                self.add_toast(format!("Could not open trailer: {e}"), ToastType::Error);
                Task::none()
            }

            // ── Settings ──
            Message::ToggleSettings => {
                self.settings_open = !self.settings_open;
                if self.settings_open {
                    self.settings_draft = self.settings.clone();
                }
                Task::none()
            }
            Message::SettingChanged(key, value) => {
                self.settings_draft.insert(key, value);
                Task::none()
            }
            Message::SaveSettings => {
                let conn = self.conn.clone();
                let draft = self.settings_draft.clone();

                Task::perform(
                    async move {
                        tokio::task::spawn_blocking(move || -> Result<(), String> {
                            for (key, value) in &draft {
                                queries::set_setting(&conn, key, value.trim())
                                    .map_err(|e| format!("DB error: {e}"))?;
                            }
                            Ok(())
                        })
                        .await
                        .map_err(|e| format!("Task error: {e}"))?
                    },
                    Message::SettingsSaved,
                )
            }
            Message::SettingsSaved(Ok(())) => {
                self.settings = self
                    .settings_draft
                    .iter()
                    .map(|(k, v)| (k.clone(), v.trim().to_string()))
                    .collect();
                self.settings_open = false;
                self.config = AppConfig::from_settings(&self.settings);
                (self.source, self.trending) = build_services(&self.conn, &self.config);
                self.add_toast("Settings saved".to_string(), ToastType::Success);
                self.run_catalog(CatalogEvent::Refresh)
            }
            Message::SettingsSaved(Err(e)) => {
                self.add_toast(format!("Save error: {e}"), ToastType::Error);
                Task::none()
            }

            // ── Toast ──
            Message::DismissToast(id) => {
                self.toasts.retain(|t| t.id != id);
                Task::none()
            }
            Message::TickToasts => {
                self.toasts.retain(|t| !t.is_expired());
                Task::none()
            }

            // ── Poster ──
            Message::PosterLoaded(url, Ok(bytes)) => {
                let handle = iced::widget::image::Handle::from_bytes(bytes);
                self.poster_cache.insert(url, handle);
                Task::none()
            }
            Message::PosterLoaded(url, Err(e)) => {
                debug!("Poster {url} failed: {e}");
                Task::none()
            }

            // ── Keyboard ──
            Message::KeyPressed(key, _modifiers) => {
                use iced::keyboard::Key;

                match key {
                    Key::Named(iced::keyboard::key::Named::Escape) => {
                        if self.settings_open {
                            self.settings_open = false;
                            Task::none()
                        } else {
                            self.update(Message::Back)
                        }
                    }
                    Key::Character(c) if c.as_str() == "," => {
                        self.update(Message::ToggleSettings)
                    }
                    _ => Task::none(),
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let page: Element<'_, Message> = match (self.history.current(), &self.detail) {
            (Route::Detail(_), Some(state)) => {
                ui::detail_view::detail_view(state, &self.poster_cache)
            }
            _ => self.catalog_view(),
        };

        let base = container(page)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_: &Theme| container::Style {
                background: Some(app_theme::BG_PRIMARY.into()),
                ..Default::default()
            });

        // Stack for overlays (modals, toasts)
        let mut layers: Vec<Element<'_, Message>> = vec![base.into()];

        if self.settings_open {
            layers.push(ui::settings_modal::settings_modal(&self.settings_draft));
        }

        if !self.toasts.is_empty() {
            layers.push(
                container(ui::toast::toast_container(&self.toasts))
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .align_x(iced::alignment::Horizontal::Right)
                    .align_y(iced::alignment::Vertical::Bottom)
                    .into(),
            );
        }

        stack(layers)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn catalog_view(&self) -> Element<'_, Message> {
        let catalog = &self.catalog;

        let mut content = column![
            ui::header::header_bar(&catalog.search_text, self.config.trending_backend()),
            ui::trending_row::trending_row(&catalog.trending, &self.poster_cache),
            ui::header::section_heading(
                catalog.heading(),
                catalog.show_favorites,
                self.favorites.len()
            ),
        ];

        if catalog.shows_filters() {
            content = content.push(ui::filters::filters_bar(catalog.sort, catalog.min_rating));
        }

        content = content.push(ui::movie_grid::results(
            catalog.result_view(&self.favorites),
            &self.poster_cache,
        ));

        scrollable(content.width(Length::Fill).spacing(4))
            .height(Length::Fill)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_starts_at_catalog() {
        let mut history = History::default();
        assert_eq!(history.current(), Route::Catalog);
        assert_eq!(history.back(), None);
        assert_eq!(history.current(), Route::Catalog);
    }

    #[test]
    fn back_returns_through_detail_chain() {
        let mut history = History::default();
        history.push(Route::Detail(1));
        history.push(Route::Detail(2));
        assert_eq!(history.current(), Route::Detail(2));

        assert_eq!(history.back(), Some(Route::Detail(1)));
        assert_eq!(history.back(), Some(Route::Catalog));
        assert_eq!(history.back(), None);
    }

    #[test]
    fn reopening_current_route_is_not_duplicated() {
        let mut history = History::default();
        history.push(Route::Detail(5));
        history.push(Route::Detail(5));
        assert_eq!(history.back(), Some(Route::Catalog));
    }
}
