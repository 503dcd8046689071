use iced::widget::{button, column, container, mouse_area, row, scrollable, text, text_input, Space};
use iced::{Border, Element, Length, Padding, Theme};
use std::collections::HashMap;

use crate::app::Message;
use crate::config::SETTING_KEYS;
use crate::theme;

/// TMDB token and Appwrite connection fields. Environment variables still
/// take precedence over what is saved here.
pub fn settings_modal(draft: &HashMap<String, String>) -> Element<'_, Message> {
    let fields = SETTING_KEYS.iter().map(|(key, env_key, label)| {
        let value = draft.get(*key).map(String::as_str).unwrap_or("");
        settings_field(label, value, key, env_key)
    });

    let content = column![
        text("Settings").size(18).color(theme::TEXT_PRIMARY),
        text("Leave the Appwrite fields empty to keep trending searches on this machine.")
            .size(12)
            .color(theme::TEXT_MUTED),
        column(fields).spacing(12),
        Space::new().height(8),
        row![
            button(text("Cancel").size(13).color(theme::TEXT_PRIMARY))
                .padding(Padding::from([8, 20]))
                .style(|_, _| button::Style {
                    background: Some(theme::BG_TERTIARY.into()),
                    border: Border {
                        color: theme::BORDER,
                        width: 1.0,
                        radius: 6.0.into(),
                    },
                    ..Default::default()
                })
                .on_press(Message::ToggleSettings),
            Space::new().width(Length::Fill),
            button(text("Save").size(13).color(theme::TEXT_PRIMARY))
                .padding(Padding::from([8, 20]))
                .style(|_, _| button::Style {
                    background: Some(theme::ACCENT.into()),
                    border: Border::default().rounded(6),
                    ..Default::default()
                })
                .on_press(Message::SaveSettings),
        ]
        .align_y(iced::Alignment::Center),
    ]
    .spacing(12)
    .padding(24)
    .width(520);

    let modal = container(scrollable(content).height(Length::Shrink))
        .max_height(600)
        .style(|_: &Theme| container::Style {
            background: Some(theme::BG_SECONDARY.into()),
            border: Border {
                color: theme::BORDER,
                width: 1.0,
                radius: 12.0.into(),
            },
            ..Default::default()
        });

    mouse_area(
        container(modal)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(|_: &Theme| container::Style {
                background: Some(iced::Color::from_rgba(0.0, 0.0, 0.0, 0.6).into()),
                ..Default::default()
            }),
    )
    .on_press(Message::ToggleSettings)
    .into()
}

fn settings_field<'a>(label: &'a str, value: &'a str, field: &str, env_key: &str) -> Element<'a, Message> {
    let field = field.to_string();
    let mut input = text_input(env_key, value)
        .on_input(move |v| Message::SettingChanged(field.clone(), v))
        .size(13)
        .padding(Padding::from([6, 10]))
        .style(|_, _| text_input::Style {
            background: theme::BG_TERTIARY.into(),
            border: Border {
                color: theme::BORDER,
                width: 1.0,
                radius: 6.0.into(),
            },
            icon: theme::TEXT_MUTED,
            placeholder: theme::TEXT_MUTED,
            value: theme::TEXT_PRIMARY,
            selection: theme::ACCENT,
        });
    if label.contains("Token") || label.contains("Key") {
        input = input.secure(true);
    }

    column![text(label).size(13).color(theme::TEXT_SECONDARY), input]
        .spacing(4)
        .into()
}
