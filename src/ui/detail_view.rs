use iced::widget::{column, container, row, scrollable, text, Space};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::core::detail::{DetailData, DetailState, NOT_FOUND_MESSAGE};
use crate::core::tmdb::{self, CastMember, MovieDetail};
use crate::theme;
use crate::ui::badges;
use crate::ui::header::styled_button;
use crate::ui::movie_grid::{card_grid, movie_card, poster, CardInfo, PosterCache, POSTER_SIZE};

const BACKDROP_SIZE: &str = "w1280";
const PROFILE_SIZE: &str = "w185";

/// Every image the detail page can show, for prefetching into the poster cache.
pub fn image_urls(data: &DetailData) -> Vec<String> {
    let mut urls = Vec::new();
    if let Some(movie) = &data.movie {
        urls.extend(movie.backdrop_path.as_deref().map(|p| tmdb::image_url(BACKDROP_SIZE, p)));
        urls.extend(movie.poster_path.as_deref().map(|p| tmdb::image_url(POSTER_SIZE, p)));
    }
    urls.extend(
        data.cast
            .iter()
            .filter_map(|c| c.profile_path.as_deref())
            .map(|p| tmdb::image_url(PROFILE_SIZE, p)),
    );
    urls.extend(data.similar.iter().filter_map(|m| m.poster_url(POSTER_SIZE)));
    urls
}

pub fn detail_view<'a>(state: &'a DetailState, cache: &'a PosterCache) -> Element<'a, Message> {
    let back = styled_button("← Back".to_string(), Message::Back, false);

    let body: Element<'a, Message> = if state.loading {
        message_line("Loading...", theme::TEXT_SECONDARY)
    } else {
        match &state.data.movie {
            None => message_line(NOT_FOUND_MESSAGE, theme::TEXT_PRIMARY),
            Some(movie) => movie_page(movie, state, cache),
        }
    };

    container(scrollable(
        column![back, body]
            .spacing(16)
            .padding(Padding::from([16, 24])),
    ))
    .width(Length::Fill)
    .height(Length::Fill)
    .style(|_: &Theme| container::Style {
        background: Some(theme::BG_PRIMARY.into()),
        ..Default::default()
    })
    .into()
}

fn movie_page<'a>(
    movie: &'a MovieDetail,
    state: &'a DetailState,
    cache: &'a PosterCache,
) -> Element<'a, Message> {
    let data = &state.data;

    let backdrop_url = movie
        .backdrop_path
        .as_deref()
        .map(|p| tmdb::image_url(BACKDROP_SIZE, p));
    let hero: Element<'a, Message> = match backdrop_url {
        Some(url) if cache.contains_key(&url) => poster(Some(&url), cache, 960.0, 400.0),
        _ => Space::new().height(0).into(),
    };

    let favorite_label = if state.is_favorite {
        "♥ Remove from Favorites"
    } else {
        "♡ Add to Favorites"
    };
    let mut actions = row![
        styled_button(favorite_label.to_string(), Message::ToggleFavorite, state.is_favorite),
        styled_button("Share".to_string(), Message::Share, false),
    ]
    .spacing(8);
    if data.trailer.is_some() {
        actions = actions.push(styled_button("▶ Watch Trailer".to_string(), Message::OpenTrailer, true));
    }

    let mut facts = row![badges::rating_badge(movie.vote_average)]
        .spacing(10)
        .align_y(iced::Alignment::Center);
    if let Some(year) = movie.year() {
        facts = facts.push(text(year).size(13).color(theme::TEXT_SECONDARY));
    }
    if let Some(runtime) = movie.runtime.filter(|r| *r > 0) {
        facts = facts.push(text(tmdb::format_runtime(runtime)).size(13).color(theme::TEXT_SECONDARY));
    }

    let genres = row(movie.genres.iter().map(|g| badges::genre_tag(&g.name))).spacing(6);

    let info = column![
        text(&movie.title).size(30).color(theme::TEXT_PRIMARY),
        actions,
        facts,
        genres,
        text(movie.overview.as_deref().unwrap_or("")).size(14).color(theme::TEXT_SECONDARY),
        fact_line("Release date", movie.release_date.as_deref().map(tmdb::format_release_date)),
        fact_line(
            "Language",
            movie.original_language.as_deref().map(str::to_uppercase)
        ),
        fact_line("Budget", Some(tmdb::format_money(movie.budget))),
        fact_line("Revenue", Some(tmdb::format_money(movie.revenue))),
        fact_line("Status", movie.status.clone()),
    ]
    .spacing(12)
    .width(Length::Fill);

    let poster_url = movie.poster_path.as_deref().map(|p| tmdb::image_url(POSTER_SIZE, p));
    let summary = row![poster(poster_url.as_deref(), cache, 260.0, 390.0), info].spacing(24);

    let mut page = column![hero, summary].spacing(24);

    if !data.cast.is_empty() {
        page = page.push(section(
            "Cast",
            row(data.cast.iter().map(|c| cast_card(c, cache))).spacing(12).into(),
        ));
    }
    if !data.similar.is_empty() {
        page = page.push(section(
            "Similar Anime",
            card_grid(
                data.similar
                    .iter()
                    .map(|m| movie_card(CardInfo::from(m), cache))
                    .collect(),
            ),
        ));
    }

    page.into()
}

fn cast_card<'a>(member: &'a CastMember, cache: &'a PosterCache) -> Element<'a, Message> {
    let url = member
        .profile_path
        .as_deref()
        .map(|p| tmdb::image_url(PROFILE_SIZE, p));
    container(
        column![
            poster(url.as_deref(), cache, 120.0, 180.0),
            text(&member.name).size(13).color(theme::TEXT_PRIMARY),
            text(member.character.as_deref().unwrap_or("")).size(11).color(theme::TEXT_MUTED),
        ]
        .spacing(4)
        .width(120),
    )
    .padding(6)
    .style(|_: &Theme| container::Style {
        background: Some(theme::BG_SECONDARY.into()),
        border: Border::default().rounded(8),
        ..Default::default()
    })
    .into()
}

fn section<'a>(title: &'a str, content: Element<'a, Message>) -> Element<'a, Message> {
    column![text(title).size(22).color(theme::TEXT_PRIMARY), content]
        .spacing(12)
        .into()
}

fn fact_line(label: &str, value: Option<String>) -> Element<'static, Message> {
    row![
        text(format!("{label}:")).size(13).color(theme::TEXT_MUTED),
        text(value.unwrap_or_else(|| "N/A".to_string()))
            .size(13)
            .color(theme::TEXT_PRIMARY),
    ]
    .spacing(8)
    .into()
}

fn message_line(message: &str, color: iced::Color) -> Element<'_, Message> {
    container(text(message).size(16).color(color))
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding(48)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tmdb::Movie;

    #[test]
    fn image_urls_cover_every_slice() {
        let movie: MovieDetail = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Akira",
            "poster_path": "/p.jpg",
            "backdrop_path": "/b.jpg"
        }))
        .unwrap();
        let similar: Movie = serde_json::from_value(serde_json::json!({
            "id": 2,
            "title": "Ghost in the Shell",
            "poster_path": "/s.jpg"
        }))
        .unwrap();
        let data = DetailData {
            movie: Some(movie),
            trailer: None,
            cast: vec![CastMember {
                id: 3,
                name: "Mitsuo Iwata".to_string(),
                character: Some("Kaneda".to_string()),
                profile_path: Some("/c.jpg".to_string()),
            }],
            similar: vec![similar],
        };

        assert_eq!(
            image_urls(&data),
            vec![
                "https://image.tmdb.org/t/p/w1280/b.jpg",
                "https://image.tmdb.org/t/p/w500/p.jpg",
                "https://image.tmdb.org/t/p/w185/c.jpg",
                "https://image.tmdb.org/t/p/w500/s.jpg",
            ]
        );
    }
}
