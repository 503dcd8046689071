use iced::widget::{button, column, container, image, row, text, Space};
use iced::{Border, Element, Length, Padding, Theme};
use std::collections::HashMap;

use crate::app::Message;
use crate::core::catalog::ResultView;
use crate::core::favorites::FavoriteEntry;
use crate::core::tmdb::Movie;
use crate::theme;
use crate::ui::badges;

pub type PosterCache = HashMap<String, image::Handle>;

pub const POSTER_SIZE: &str = "w500";
const CARD_WIDTH: f32 = 200.0;
const POSTER_HEIGHT: f32 = 300.0;
const COLUMNS: usize = 5;

/// Fields a movie card shows, from either a fetched movie or a stored favorite.
pub struct CardInfo<'a> {
    pub id: i64,
    pub title: &'a str,
    pub vote_average: Option<f64>,
    pub language: Option<&'a str>,
    pub year: Option<&'a str>,
    pub poster_url: Option<String>,
}

impl<'a> From<&'a Movie> for CardInfo<'a> {
    fn from(movie: &'a Movie) -> Self {
        Self {
            id: movie.id,
            title: &movie.title,
            vote_average: Some(movie.vote_average),
            language: Some(movie.original_language.as_str()),
            year: movie.year(),
            poster_url: movie.poster_url(POSTER_SIZE),
        }
    }
}

impl<'a> From<&'a FavoriteEntry> for CardInfo<'a> {
    fn from(entry: &'a FavoriteEntry) -> Self {
        Self {
            id: entry.id,
            title: &entry.title,
            vote_average: entry.vote_average,
            language: entry.original_language.as_deref(),
            year: entry.year(),
            poster_url: entry.poster_url(POSTER_SIZE),
        }
    }
}

/// Cached image for `url`, or a flat placeholder while it loads or when there is none.
pub fn poster<'a>(
    url: Option<&str>,
    cache: &'a PosterCache,
    width: f32,
    height: f32,
) -> Element<'a, Message> {
    match url.and_then(|u| cache.get(u)) {
        Some(handle) => image(handle.clone()).width(width).height(height).into(),
        None => container(text("No poster").size(11).color(theme::TEXT_MUTED))
            .width(width)
            .height(height)
            .center_x(width)
            .center_y(height)
            .style(|_: &Theme| container::Style {
                background: Some(theme::BG_TERTIARY.into()),
                border: Border::default().rounded(6),
                ..Default::default()
            })
            .into(),
    }
}

pub fn movie_card<'a>(card: CardInfo<'a>, cache: &'a PosterCache) -> Element<'a, Message> {
    let meta = row![
        badges::language_badge(card.language),
        text("•").size(12).color(theme::TEXT_MUTED),
        text(card.year.unwrap_or("N/A")).size(12).color(theme::TEXT_SECONDARY),
    ]
    .spacing(6)
    .align_y(iced::Alignment::Center);

    let content = column![
        poster(card.poster_url.as_deref(), cache, CARD_WIDTH - 16.0, POSTER_HEIGHT),
        badges::rating_badge(card.vote_average),
        text(card.title).size(14).color(theme::TEXT_PRIMARY),
        meta,
    ]
    .spacing(6);

    button(content)
        .width(CARD_WIDTH)
        .padding(8)
        .style(|_, status| {
            let border_color = match status {
                button::Status::Hovered => theme::BORDER_LIGHT,
                _ => theme::BORDER,
            };
            button::Style {
                background: Some(theme::BG_SECONDARY.into()),
                text_color: theme::TEXT_PRIMARY,
                border: Border {
                    color: border_color,
                    width: 1.0,
                    radius: 10.0.into(),
                },
                ..Default::default()
            }
        })
        .on_press(Message::OpenMovie(card.id))
        .into()
}

/// Lay cards out in fixed-width rows.
pub fn card_grid<'a>(cards: Vec<Element<'a, Message>>) -> Element<'a, Message> {
    let mut rows: Vec<Element<'a, Message>> = Vec::new();
    let mut current: Vec<Element<'a, Message>> = Vec::with_capacity(COLUMNS);

    for card in cards {
        current.push(card);
        if current.len() == COLUMNS {
            rows.push(row(std::mem::take(&mut current)).spacing(16).into());
        }
    }
    if !current.is_empty() {
        rows.push(row(current).spacing(16).into());
    }

    column(rows).spacing(16).into()
}

/// The results section: exactly one of spinner, error, empty message or grid.
pub fn results<'a>(view: ResultView<'a>, cache: &'a PosterCache) -> Element<'a, Message> {
    let body: Element<'a, Message> = match view {
        ResultView::Loading => status_line("Loading...", theme::TEXT_SECONDARY),
        ResultView::Error(message) => status_line(message, theme::ERROR),
        ResultView::Empty(message) => status_line(message, theme::TEXT_PRIMARY),
        ResultView::Movies(movies) => card_grid(
            movies
                .iter()
                .map(|m| movie_card(CardInfo::from(m), cache))
                .collect(),
        ),
        ResultView::Favorites(favorites) => card_grid(
            favorites
                .iter()
                .map(|f| movie_card(CardInfo::from(f), cache))
                .collect(),
        ),
    };

    container(body)
        .width(Length::Fill)
        .padding(Padding::from([8, 24]))
        .into()
}

fn status_line<'a>(message: &'a str, color: iced::Color) -> Element<'a, Message> {
    container(
        column![Space::new().height(48), text(message).size(15).color(color)]
            .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .center_x(Length::Fill)
    .into()
}
