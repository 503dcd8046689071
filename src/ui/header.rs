use iced::widget::{button, column, container, row, text, text_input, Space};
use iced::{Border, Element, Length, Padding, Theme};

use crate::app::Message;
use crate::theme;

/// Hero title, search box and settings button.
pub fn header_bar<'a>(search_text: &'a str, trending_backend: &str) -> Element<'a, Message> {
    let title = row![
        text("Discover ").size(28).color(theme::TEXT_PRIMARY),
        text("Anime").size(28).color(theme::ACCENT),
        text(" Movies You'll Love").size(28).color(theme::TEXT_PRIMARY),
    ]
    .spacing(0);

    let search = text_input("Search through thousands of anime movies", search_text)
        .on_input(Message::SearchChanged)
        .width(520)
        .size(14)
        .padding(Padding::from([10, 14]))
        .style(|_, _| text_input::Style {
            background: theme::BG_TERTIARY.into(),
            border: Border {
                color: theme::BORDER,
                width: 1.0,
                radius: 8.0.into(),
            },
            icon: theme::TEXT_MUTED,
            placeholder: theme::TEXT_MUTED,
            value: theme::TEXT_PRIMARY,
            selection: theme::ACCENT,
        });

    let top = row![
        row![
            text("Ani").size(18).color(theme::ACCENT),
            text("Flix").size(18).color(theme::TEXT_PRIMARY),
        ],
        Space::new().width(Length::Fill),
        text(format!("trending: {trending_backend}"))
            .size(11)
            .color(theme::TEXT_MUTED),
        Space::new().width(12),
        styled_button("Settings".to_string(), Message::ToggleSettings, false),
    ]
    .align_y(iced::Alignment::Center);

    container(
        column![
            top,
            column![title, search]
                .spacing(16)
                .align_x(iced::Alignment::Center)
                .width(Length::Fill),
        ]
        .spacing(12)
        .padding(Padding::from([16, 24])),
    )
    .width(Length::Fill)
    .style(|_: &Theme| container::Style {
        background: Some(theme::BG_SECONDARY.into()),
        ..Default::default()
    })
    .into()
}

/// Section title for the results list plus the favorites toggle.
pub fn section_heading(heading: &str, show_favorites: bool, favorite_count: usize) -> Element<'static, Message> {
    let heart = if show_favorites { "♥" } else { "♡" };
    row![
        text(heading.to_string()).size(22).color(theme::TEXT_PRIMARY),
        Space::new().width(Length::Fill),
        styled_button(
            format!("{heart} Favorites ({favorite_count})"),
            Message::ToggleFavoritesView,
            show_favorites,
        ),
    ]
    .align_y(iced::Alignment::Center)
    .padding(Padding::from([12, 24]))
    .into()
}

pub fn styled_button(label: String, msg: Message, active: bool) -> Element<'static, Message> {
    button(text(label).size(13).color(theme::TEXT_PRIMARY))
        .padding(Padding::from([6, 14]))
        .style(move |_, status| {
            let bg = match (active, status) {
                (true, button::Status::Hovered) => theme::ACCENT_HOVER,
                (true, _) => theme::ACCENT,
                (false, button::Status::Hovered) => theme::BG_HOVER,
                (false, _) => theme::BG_TERTIARY,
            };
            button::Style {
                background: Some(bg.into()),
                text_color: theme::TEXT_PRIMARY,
                border: Border {
                    color: theme::BORDER,
                    width: 1.0,
                    radius: 6.0.into(),
                },
                ..Default::default()
            }
        })
        .on_press(msg)
        .into()
}
