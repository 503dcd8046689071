mod app;
mod config;
mod core;
mod db;
mod error;
mod theme;
mod ui;

use tracing_subscriber::EnvFilter;

fn main() -> iced::Result {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    tracing::info!("AniFlix starting...");

    iced::application(app::App::new, app::App::update, app::App::view)
        .title(app::App::title)
        .subscription(app::App::subscription)
        .theme(app::App::theme)
        .window_size((1280.0, 860.0))
        .antialiasing(true)
        .run()
}
