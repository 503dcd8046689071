use iced::widget::{button, column, container, row, scrollable, text, Space};
use iced::{Border, Element, Length, Padding};

use crate::app::Message;
use crate::core::trending::TrendingEntry;
use crate::theme;
use crate::ui::movie_grid::{poster, PosterCache};

const POSTER_WIDTH: f32 = 110.0;
const POSTER_HEIGHT: f32 = 165.0;

/// Ranked row of the most searched terms. Renders nothing when empty.
pub fn trending_row<'a>(entries: &'a [TrendingEntry], cache: &'a PosterCache) -> Element<'a, Message> {
    if entries.is_empty() {
        return Space::new().height(0).into();
    }

    let items: Vec<Element<'a, Message>> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let item = row![
                text(format!("{}", index + 1)).size(56).color(theme::ACCENT_DIM),
                column![
                    poster(entry.poster_url.as_deref(), cache, POSTER_WIDTH, POSTER_HEIGHT),
                    text(&entry.term).size(11).color(theme::TEXT_SECONDARY),
                ]
                .spacing(4),
            ]
            .spacing(4)
            .align_y(iced::Alignment::Center);

            button(item)
                .padding(4)
                .style(|_, status| button::Style {
                    background: match status {
                        button::Status::Hovered => Some(theme::BG_HOVER.into()),
                        _ => None,
                    },
                    border: Border::default().rounded(8),
                    ..Default::default()
                })
                .on_press(Message::OpenMovie(entry.movie_id))
                .into()
        })
        .collect();

    container(
        column![
            text("Trending Anime").size(22).color(theme::TEXT_PRIMARY),
            scrollable(row(items).spacing(20)).direction(scrollable::Direction::Horizontal(
                scrollable::Scrollbar::default()
            )),
        ]
        .spacing(12),
    )
    .width(Length::Fill)
    .padding(Padding::from([16, 24]))
    .into()
}
