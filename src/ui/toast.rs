use iced::widget::{column, container, mouse_area, text};
use iced::{Border, Color, Element, Length, Padding, Theme};
use std::time::{Duration, Instant};

use crate::app::Message;
use crate::theme;

const TOAST_LIFETIME: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToastType {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub toast_type: ToastType,
    pub created_at: Instant,
}

impl Toast {
    pub fn new(id: u64, message: String, toast_type: ToastType) -> Self {
        Self {
            id,
            message,
            toast_type,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > TOAST_LIFETIME
    }
}

fn toast_colors(tt: ToastType) -> (Color, Color, Color) {
    // (border, background, text)
    match tt {
        ToastType::Success => (theme::SUCCESS, with_alpha(theme::SUCCESS, 0.1), theme::SUCCESS),
        ToastType::Error => (theme::ERROR, with_alpha(theme::ERROR, 0.1), theme::ERROR),
        ToastType::Info => (theme::INFO, with_alpha(theme::INFO, 0.1), theme::INFO),
    }
}

fn with_alpha(color: Color, alpha: f32) -> Color {
    Color { a: alpha, ..color }
}

/// Bottom-right notification stack; click a toast to dismiss it.
pub fn toast_container(toasts: &[Toast]) -> Element<'_, Message> {
    let toast_views: Vec<Element<'_, Message>> = toasts
        .iter()
        .map(|t| {
            let (border_color, bg_color, text_color) = toast_colors(t.toast_type);

            mouse_area(
                container(text(&t.message).size(13).color(text_color))
                    .padding(Padding::from([10, 16]))
                    .width(320)
                    .style(move |_: &Theme| container::Style {
                        background: Some(bg_color.into()),
                        border: Border {
                            color: border_color,
                            width: 1.0,
                            radius: 8.0.into(),
                        },
                        ..Default::default()
                    }),
            )
            .on_press(Message::DismissToast(t.id))
            .into()
        })
        .collect();

    container(column(toast_views).spacing(8))
        .padding(16)
        .width(Length::Shrink)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_toast_is_not_expired() {
        let toast = Toast::new(1, "Link copied to clipboard!".to_string(), ToastType::Success);
        assert!(!toast.is_expired());
    }

    #[test]
    fn old_toast_expires() {
        let mut toast = Toast::new(1, "x".to_string(), ToastType::Info);
        toast.created_at = Instant::now() - TOAST_LIFETIME - Duration::from_millis(1);
        assert!(toast.is_expired());
    }
}
