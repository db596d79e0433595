//! Modal dialogs drawn over the main window.

use std::path::PathBuf;

use iced::widget::{
    button, center, column, container, mouse_area, opaque, row, scrollable, stack, text,
    text_input, Space,
};
use iced::{Alignment, Background, Border, Color, Element, Length, Shadow, Theme, Vector};

use super::Message;
use crate::theme::Palette;

pub const NOTE_INPUT: &str = "dialog-note";
pub const RENAME_INPUT: &str = "dialog-rename";

/// Something a confirmation dialog runs when accepted.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    DeleteCategory(String),
    ClearSystemPaths,
    RemoveUserPath(usize),
    Load,
}

/// What a note editor writes back to.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteTarget {
    Font(PathBuf),
    Category(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Info { title: String, body: String },
    Warning { title: String, body: String },
    Error { title: String, body: String },
    Confirm { title: String, body: String, pending: Pending },
    /// Long monospace output such as install or cache reports.
    Report { title: String, body: String },
    /// Shown while a blocking operation runs; has no buttons.
    Wait { title: String, body: String },
    NoteEditor { target: NoteTarget, subject: String, text: String },
    Rename { old: String, new: String },
}

impl Dialog {
    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Info { title: title.into(), body: body.into() }
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Warning { title: title.into(), body: body.into() }
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Error { title: title.into(), body: body.into() }
    }

    pub fn report(title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Report { title: title.into(), body: body.into() }
    }

    pub fn confirm(title: impl Into<String>, body: impl Into<String>, pending: Pending) -> Self {
        Dialog::Confirm { title: title.into(), body: body.into(), pending }
    }

    /// Wait dialogs cannot be dismissed by the user.
    pub fn is_dismissable(&self) -> bool {
        !matches!(self, Dialog::Wait { .. })
    }

    fn title(&self) -> &str {
        match self {
            Dialog::Info { title, .. }
            | Dialog::Warning { title, .. }
            | Dialog::Error { title, .. }
            | Dialog::Confirm { title, .. }
            | Dialog::Report { title, .. }
            | Dialog::Wait { title, .. } => title,
            Dialog::NoteEditor { .. } => "Edit Note",
            Dialog::Rename { .. } => "Rename Category",
        }
    }
}

// ─── VIEW ───────────────────────────────────────────────────────

/// Lay `dialog` over `base` with a dimmed, click-blocking backdrop.
pub fn overlay<'a>(
    base: Element<'a, Message>,
    dialog: &'a Dialog,
    p: &Palette,
    mono: iced::Font,
) -> Element<'a, Message> {
    let backdrop = mouse_area(
        container(Space::new(Length::Fill, Length::Fill)).style(|_: &Theme| container::Style {
            background: Some(Background::Color(Color::from_rgba(0.0, 0.0, 0.0, 0.45))),
            ..Default::default()
        }),
    );
    let backdrop = if dialog.is_dismissable() {
        backdrop.on_press(Message::CloseDialog)
    } else {
        backdrop
    };

    stack![base, opaque(backdrop), opaque(center(card(dialog, p, mono)))].into()
}

fn card<'a>(dialog: &'a Dialog, p: &Palette, mono: iced::Font) -> Element<'a, Message> {
    let accent = p.accent;
    let title_c = match dialog {
        Dialog::Warning { .. } => p.warning,
        Dialog::Error { .. } => p.missing,
        _ => accent,
    };
    let title = text(dialog.title().to_string()).size(15).color(title_c);

    let body: Element<Message> = match dialog {
        Dialog::Info { body, .. }
        | Dialog::Warning { body, .. }
        | Dialog::Error { body, .. }
        | Dialog::Confirm { body, .. }
        | Dialog::Wait { body, .. } => text(body.as_str()).size(13).color(p.text).into(),
        Dialog::Report { body, .. } => scrollable(text(body.as_str()).size(11).font(mono).color(p.text))
            .height(Length::Fixed(320.0))
            .into(),
        Dialog::NoteEditor { subject, text: note, .. } => column![
            text(subject.as_str()).size(12).color(p.label),
            text_input("Note", note)
                .id(text_input::Id::new(NOTE_INPUT))
                .on_input(Message::DialogInput)
                .on_submit(Message::DialogAccept)
                .padding(8)
                .size(13),
        ]
        .spacing(8)
        .into(),
        Dialog::Rename { old, new } => column![
            text(format!("New name for '{old}':")).size(12).color(p.label),
            text_input("Category name", new)
                .id(text_input::Id::new(RENAME_INPUT))
                .on_input(Message::DialogInput)
                .on_submit(Message::DialogAccept)
                .padding(8)
                .size(13),
        ]
        .spacing(8)
        .into(),
    };

    let buttons: Element<Message> = match dialog {
        Dialog::Wait { .. } => Space::new(0, 0).into(),
        Dialog::Confirm { .. } => row![
            Space::with_width(Length::Fill),
            dialog_button("No", Message::CloseDialog, p, false),
            dialog_button("Yes", Message::DialogAccept, p, true),
        ]
        .spacing(8)
        .into(),
        Dialog::NoteEditor { .. } | Dialog::Rename { .. } => row![
            Space::with_width(Length::Fill),
            dialog_button("Cancel", Message::CloseDialog, p, false),
            dialog_button("Save", Message::DialogAccept, p, true),
        ]
        .spacing(8)
        .into(),
        _ => row![
            Space::with_width(Length::Fill),
            dialog_button("OK", Message::CloseDialog, p, true),
        ]
        .into(),
    };

    let panel_bg = p.panel_bg;
    let border_c = p.border;
    container(column![title, body, buttons].spacing(14).align_x(Alignment::Start))
        .width(Length::Fixed(520.0))
        .padding(18)
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(panel_bg)),
            border: Border {
                color: border_c,
                width: 1.0,
                radius: 8.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
                offset: Vector::new(0.0, 4.0),
                blur_radius: 16.0,
            },
            ..Default::default()
        })
        .into()
}

fn dialog_button(
    label: &'static str,
    msg: Message,
    p: &Palette,
    primary: bool,
) -> Element<'static, Message> {
    let accent = p.accent;
    let text_c = if primary { Color::WHITE } else { p.text };
    let idle = if primary { accent } else { Color::TRANSPARENT };
    button(text(label).size(12).color(text_c))
        .on_press(msg)
        .padding([5, 16])
        .style(move |_: &Theme, status| {
            let bg = match status {
                button::Status::Hovered if primary => Color { a: 0.85, ..accent },
                button::Status::Hovered => Color::from_rgba(accent.r, accent.g, accent.b, 0.15),
                _ => idle,
            };
            button::Style {
                background: Some(Background::Color(bg)),
                text_color: text_c,
                border: Border {
                    color: accent,
                    width: 1.0,
                    radius: 6.0.into(),
                },
                ..Default::default()
            }
        })
        .into()
}
