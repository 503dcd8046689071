use iced::widget::{container, pick_list, row, text, Space};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::core::tmdb::{MinRating, SortKey};
use crate::theme;

/// Sort order and minimum rating for the discover listing.
pub fn filters_bar(sort: SortKey, min_rating: MinRating) -> Element<'static, Message> {
    let sort_pick = pick_list(SortKey::ALL, Some(sort), Message::SortChanged)
        .text_size(13)
        .padding(Padding::from([4, 8]));

    let rating_pick = pick_list(MinRating::ALL, Some(min_rating), Message::MinRatingChanged)
        .text_size(13)
        .padding(Padding::from([4, 8]));

    container(
        row![
            text("Sort by").size(13).color(theme::TEXT_SECONDARY),
            sort_pick,
            Space::new().width(16),
            text("Minimum rating").size(13).color(theme::TEXT_SECONDARY),
            rating_pick,
            Space::new().width(Length::Fill),
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center)
        .padding(Padding::from([8, 24])),
    )
    .width(Length::Fill)
    .style(|_: &Theme| container::Style {
        border: Border {
            color: theme::BORDER,
            width: 1.0,
            radius: 0.0.into(),
        },
        ..Default::default()
    })
    .into()
}
