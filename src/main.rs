#![windows_subsystem = "windows"]

mod activity;
mod category;
mod clipboard;
mod error;
mod font_info;
mod install;
mod logging;
mod paths;
mod registry;
mod render;
mod state;
pub mod theme;
mod ui;

use ui::TypeShelf;

// ─── DejaVu Sans (UI font) ──────────────────────────────────────────
pub const UI_FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

pub const UI_FONT: iced::Font = iced::Font {
    family: iced::font::Family::Name("DejaVu Sans"),
    weight: iced::font::Weight::Normal,
    stretch: iced::font::Stretch::Normal,
    style: iced::font::Style::Normal,
};

fn main() -> iced::Result {
    let log_switch = logging::init();
    tracing::info!("Typeshelf {} starting", env!("CARGO_PKG_VERSION"));

    iced::application(TypeShelf::title, TypeShelf::update, TypeShelf::view)
        .subscription(TypeShelf::subscription)
        .theme(TypeShelf::theme)
        .font(UI_FONT_BYTES)
        .default_font(UI_FONT)
        .window(iced::window::Settings {
            size: (1280.0, 860.0).into(),
            min_size: Some((900.0, 600.0).into()),
            exit_on_close_request: false,
            #[cfg(target_os = "linux")]
            platform_specific: iced::window::settings::PlatformSpecific {
                application_id: String::from("typeshelf"),
                ..Default::default()
            },
            ..Default::default()
        })
        .run_with(move || (TypeShelf::new(log_switch.clone()), iced::Task::none()))
}
