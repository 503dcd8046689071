use iced::widget::{container, row, text};
use iced::{Border, Color, Element, Padding, Theme};

use crate::app::Message;
use crate::theme;

/// Star rating, one decimal, or `N/A` when the movie has no votes.
pub fn rating_badge(vote_average: Option<f64>) -> Element<'static, Message> {
    let vote = vote_average.filter(|v| *v > 0.0);
    let label = vote.map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
    let color = vote.map_or(theme::TEXT_MUTED, theme::rating_color);

    container(
        row![
            text("★").size(12).color(theme::STAR),
            text(label).size(12).color(color),
        ]
        .spacing(4)
        .align_y(iced::Alignment::Center),
    )
    .padding(Padding::from([2, 8]))
    .style(|_: &Theme| container::Style {
        background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.6).into()),
        border: Border::default().rounded(4),
        ..Default::default()
    })
    .into()
}

/// Original language code, uppercased.
pub fn language_badge(language: Option<&str>) -> Element<'static, Message> {
    let label = language
        .filter(|l| !l.is_empty())
        .map_or_else(|| "N/A".to_string(), str::to_uppercase);
    container(text(label).size(10).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([2, 6]))
        .style(|_: &Theme| container::Style {
            background: Some(theme::ACCENT_DIM.into()),
            border: Border::default().rounded(3),
            ..Default::default()
        })
        .into()
}

pub fn genre_tag(name: &str) -> Element<'static, Message> {
    container(text(name.to_string()).size(11).color(theme::TEXT_SECONDARY))
        .padding(Padding::from([3, 10]))
        .style(|_: &Theme| container::Style {
            background: Some(theme::BG_TERTIARY.into()),
            border: Border {
                color: theme::BORDER_LIGHT,
                width: 1.0,
                radius: 12.0.into(),
            },
            ..Default::default()
        })
        .into()
}
