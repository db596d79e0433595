use iced::widget::image::Image as ImageView;
use iced::widget::{
    button, checkbox, column, container, row, scrollable, slider, text, text_input, Column, Space,
};
use iced::{Alignment, Background, Border, Color, ContentFit, Element, Length, Shadow, Theme, Vector};

use super::{dialog, Action, Menu, Message, Pane, PathKind, TypeShelf};
use super::{CATEGORY_INPUT, RENDER_INPUT, SEARCH_INPUT};
use crate::activity::Severity;
use crate::paths;
use crate::render::{MAX_SIZE, MIN_SIZE};
use crate::theme::Palette;

const MONO: iced::Font = iced::Font::MONOSPACE;

const MENUS: [(Menu, &str); 5] = [
    (Menu::File, "File"),
    (Menu::View, "View"),
    (Menu::Categories, "Categories"),
    (Menu::Tools, "Tools"),
    (Menu::Help, "Help"),
];

fn menu_items(menu: Menu) -> &'static [(&'static str, &'static str, Action)] {
    match menu {
        Menu::File => &[
            ("Save", "Ctrl+S", Action::Save),
            ("Save As", "Ctrl+Shift+S", Action::SaveAs),
            ("Load", "Ctrl+O", Action::Load),
            ("Load From File", "", Action::LoadFromFile),
            ("Rescan", "", Action::Rescan),
            ("Exit", "Esc", Action::Exit),
        ],
        Menu::View => &[
            ("Toggle Paths", "P", Action::TogglePaths),
            ("Hide System Fonts", "H", Action::ToggleHideSystem),
            ("Hide User Fonts", "J", Action::ToggleHideUser),
            ("Clear Filters", "", Action::ClearFilters),
            ("Next Theme", "", Action::CycleTheme),
        ],
        Menu::Categories => &[
            ("New", "Enter", Action::NewCategory),
            ("Rename", "", Action::RenameCategory),
            ("Delete", "", Action::DeleteCategory),
            ("Edit Note", "N", Action::EditCategoryNote),
            ("Set Icon", "O", Action::SetCategoryIcon),
            ("Install", "L", Action::InstallCategory),
            ("Uninstall", "K", Action::UninstallCategory),
        ],
        Menu::Tools => &[
            ("Update Font Cache", "U", Action::UpdateFontCache),
            ("Export Category List", "", Action::ExportCategoryList),
            ("Export Font List", "", Action::ExportFontList),
            ("Add System Default Paths", "", Action::AddSystemPaths),
            ("Clear System Paths", "", Action::ClearSystemPaths),
        ],
        Menu::Help => &[
            ("Quick Guide", "F1", Action::QuickGuide),
            ("Shortcuts", "F2", Action::ShortcutList),
            ("About", "", Action::About),
        ],
    }
}

impl TypeShelf {
    pub fn view(&self) -> Element<'_, Message> {
        let p = &self.pal;

        let tabs = MENUS
            .iter()
            .fold(row![].spacing(4), |r, &(menu, label)| {
                r.push(menu_tab(label, menu, self.open_menu, p))
            });
        let status = text(format!(
            "{} fonts  |  {} categories",
            self.registry.len(),
            self.state.categories.len()
        ))
        .size(11)
        .font(MONO)
        .color(p.label);
        let theme_btn = button(text(self.state.theme.name()).size(11).color(p.accent))
            .on_press(Message::Action(Action::CycleTheme))
            .style(button::text)
            .padding([2, 6]);
        let menu_bar = row![
            text("Typeshelf").size(15).color(p.accent),
            Space::with_width(12),
            tabs,
            Space::with_width(Length::Fill),
            status,
            Space::with_width(8),
            theme_btn,
        ]
        .align_y(Alignment::Center)
        .padding([6, 12]);

        let mut main = Column::new().spacing(0);
        main = main.push(panel_bg(menu_bar.into(), p.header_bg, p.border));
        if let Some(menu) = self.open_menu {
            main = main.push(panel_bg(self.view_menu_ribbon(menu), p.panel_bg, p.border));
        }

        let mut left = Column::new().spacing(6).width(Length::FillPortion(3));
        if self.show_paths {
            left = left.push(self.view_paths());
        }
        left = left.push(self.view_font_table());

        let right = column![self.view_categories(), self.view_category_fonts()]
            .spacing(6)
            .width(Length::FillPortion(2));

        let body = column![
            row![left, right].spacing(6).height(Length::Fill),
            self.view_render_frame(),
            self.view_activity_log(),
        ]
        .spacing(6)
        .padding(6);
        main = main.push(body);

        let bg = p.bg;
        let base: Element<Message> = container(main)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(move |_: &Theme| container::Style {
                background: Some(Background::Color(bg)),
                ..Default::default()
            })
            .into();

        match &self.dialog {
            Some(d) => dialog::overlay(base, d, p, MONO),
            None => base,
        }
    }

    fn view_menu_ribbon(&self, menu: Menu) -> Element<'_, Message> {
        let p = &self.pal;
        let items = menu_items(menu)
            .iter()
            .fold(row![].spacing(2), |r, &(label, hint, action)| {
                r.push(menu_item(label, hint, action, p))
            });
        container(items).padding([4, 12]).into()
    }

    // ─── PATHS ──────────────────────────────────────────────────

    fn view_paths(&self) -> Element<'_, Message> {
        let p = &self.pal;
        let actions = row![
            small_button("Add Path", Action::AddUserPath, p),
            small_button("Remove Path", Action::RemoveUserPath, p),
            small_button("Add System Paths", Action::AddSystemPaths, p),
            small_button("Clear System Paths", Action::ClearSystemPaths, p),
            Space::with_width(Length::Fill),
            small_button("Rescan", Action::Rescan, p),
        ]
        .spacing(4);

        let content = column![
            row![
                column![
                    section_title("System Paths", p),
                    self.path_list(PathKind::Predefined, &self.state.font_paths_predefined)
                ]
                .spacing(4)
                .width(Length::Fill),
                column![
                    section_title("User Paths", p),
                    self.path_list(PathKind::User, &self.state.font_paths_user)
                ]
                .spacing(4)
                .width(Length::Fill),
            ]
            .spacing(8),
            actions,
        ]
        .spacing(6);
        panel(content.into(), p)
    }

    fn path_list<'a>(&'a self, kind: PathKind, entries: &'a [String]) -> Element<'a, Message> {
        let p = &self.pal;
        let rows = entries.iter().enumerate().map(|(i, s)| {
            let selected = self.selected_path == Some((kind, i));
            let color = if paths::expand(s).exists() { p.text } else { p.missing };
            select_row(
                text(s.as_str()).size(11).font(MONO).color(color).into(),
                selected,
                i,
                Message::SelectPath(kind, i),
                p,
            )
        });
        scrollable(Column::with_children(rows)).height(90).into()
    }

    // ─── FONT TABLE ─────────────────────────────────────────────

    fn view_font_table(&self) -> Element<'_, Message> {
        let p = &self.pal;
        let fonts = self.visible_fonts();
        let count = fonts.len();

        let search = text_input("Search fonts (S)", &self.search)
            .id(text_input::Id::new(SEARCH_INPUT))
            .on_input(Message::SearchChanged)
            .padding(5)
            .size(12);
        let filters = row![
            checkbox("Hide system", self.hide_system)
                .on_toggle(|_| Message::Action(Action::ToggleHideSystem))
                .size(14)
                .text_size(11),
            checkbox("Hide user", self.hide_user)
                .on_toggle(|_| Message::Action(Action::ToggleHideUser))
                .size(14)
                .text_size(11),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let header = row![
            column_header("Name", Length::Fixed(200.0), p),
            column_header("Style", Length::Fixed(90.0), p),
            column_header("File", Length::Fixed(190.0), p),
            column_header("Note", Length::Fill, p),
        ]
        .spacing(6)
        .padding([2, 8]);

        let rows = fonts.into_iter().enumerate().map(|(i, f)| {
            let selected = self.selected_fonts.contains(&f.font_path);
            let cells = row![
                text(f.font_name.as_str()).size(12).color(p.text).width(200),
                text(f.font_style.as_str()).size(11).color(p.label).width(90),
                text(f.font_file.as_str()).size(11).font(MONO).color(p.label).width(190),
                text(f.user_note.as_str()).size(11).color(p.text).width(Length::Fill),
            ]
            .spacing(6)
            .into();
            select_row(cells, selected, i, Message::SelectFont(f.font_path.clone()), p)
        });

        let content = column![
            row![
                section_title(format!("Found Fonts ({count})"), p),
                Space::with_width(Length::Fill),
                small_button("Copy Path", Action::CopyFontPath, p),
                small_button("Note", Action::EditNote, p),
                small_button("Drop", Action::RemoveFont, p),
                small_button("Assign", Action::AssignToCategory, p),
            ]
            .spacing(4)
            .align_y(Alignment::Center),
            row![search, filters].spacing(10).align_y(Alignment::Center),
            header,
        ]
        .spacing(6);
        let content = if self.registry.is_empty() {
            content.push(empty_hint("No fonts found. Add a font folder (P) and Rescan.", p))
        } else {
            content.push(scrollable(Column::with_children(rows)).height(Length::Fill))
        };
        focus_panel(content.into(), p, self.focus == Pane::FontTable)
    }

    // ─── CATEGORIES ─────────────────────────────────────────────

    fn view_categories(&self) -> Element<'_, Message> {
        let p = &self.pal;
        let icons_dir = paths::icons_dir();

        let entry = row![
            text_input("New category (A)", &self.category_entry)
                .id(text_input::Id::new(CATEGORY_INPUT))
                .on_input(Message::CategoryEntryChanged)
                .on_submit(Message::Action(Action::NewCategory))
                .padding(5)
                .size(12),
            small_button("Add", Action::NewCategory, p),
        ]
        .spacing(4)
        .align_y(Alignment::Center);

        let rows = self.state.categories.iter().enumerate().map(|(i, cat)| {
            let icon: Element<Message> = match cat.icon_path(&icons_dir).filter(|p| p.is_file()) {
                Some(path) => ImageView::new(path).width(24).height(24).into(),
                None => Space::new(24, 24).into(),
            };
            let marker = if cat.is_installed { "@" } else { " " };
            let cells = row![
                icon,
                text(cat.fonts_list.len().to_string()).size(11).font(MONO).color(p.label).width(32),
                text(marker).size(12).font(MONO).color(p.installed).width(14),
                text(cat.label.as_str()).size(12).color(p.text),
            ]
            .spacing(6)
            .align_y(Alignment::Center)
            .into();
            let selected = self.selected_category.as_deref() == Some(cat.label.as_str());
            select_row(cells, selected, i, Message::SelectCategory(cat.label.clone()), p)
        });

        let content = column![
            row![
                section_title("Categories", p),
                Space::with_width(Length::Fill),
                small_button("Install", Action::InstallCategory, p),
                small_button("Uninstall", Action::UninstallCategory, p),
            ]
            .spacing(4)
            .align_y(Alignment::Center),
            entry,
        ]
        .spacing(6);
        let content = if self.state.categories.is_empty() {
            content.push(empty_hint("No categories yet. Type a name above and press Enter.", p))
        } else {
            content.push(scrollable(Column::with_children(rows)).height(Length::Fill))
        };
        container(focus_panel(content.into(), p, self.focus == Pane::Categories))
            .height(Length::FillPortion(2))
            .into()
    }

    fn view_category_fonts(&self) -> Element<'_, Message> {
        let p = &self.pal;
        let category = self
            .selected_category
            .as_deref()
            .and_then(|l| self.state.categories.get(l));

        let title = match category {
            Some(cat) => format!("Fonts in '{}'", cat.label),
            None => "Fonts in Category".to_string(),
        };

        let mut body = Column::new().spacing(6);
        body = body.push(
            row![
                section_title(title, p),
                Space::with_width(Length::Fill),
                small_button("Match", Action::MatchCategoryFont, p),
                small_button("Remove", Action::RemoveFromCategory, p),
            ]
            .spacing(4)
            .align_y(Alignment::Center),
        );

        match category {
            None => {
                body = body.push(empty_hint("Select a category (C)", p));
            }
            Some(cat) => {
                let missing = self
                    .state
                    .categories
                    .missing_fonts(&cat.label, &self.registry)
                    .unwrap_or_default();
                if !missing.is_empty() {
                    body = body.push(
                        text(format!("{} font(s) not found by the last scan", missing.len()))
                            .size(11)
                            .color(p.missing),
                    );
                }
                let rows = cat.fonts_list.iter().enumerate().map(|(i, path)| {
                    let file = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    let (name, color) = if missing.contains(path) {
                        ("(missing)".to_string(), p.missing)
                    } else {
                        let name = self
                            .registry
                            .get_by_path(path)
                            .map(|r| r.font_name.clone())
                            .unwrap_or_default();
                        (name, p.text)
                    };
                    let cells = row![
                        text(file).size(11).font(MONO).color(color).width(Length::FillPortion(1)),
                        text(name).size(11).color(color).width(Length::FillPortion(1)),
                    ]
                    .spacing(6)
                    .into();
                    let selected = self.selected_category_font.as_deref() == Some(path.as_path());
                    select_row(cells, selected, i, Message::SelectCategoryFont(path.clone()), p)
                });
                body = body.push(scrollable(Column::with_children(rows)).height(Length::Fill));

                if let Some(handle) = &self.category_preview {
                    body = body.push(preview_box(
                        ImageView::new(handle.clone()).content_fit(ContentFit::None).into(),
                        p,
                    ));
                }
                let note = if cat.user_note.is_empty() { "-" } else { cat.user_note.as_str() };
                body = body.push(
                    column![
                        info_row("Note", note, p),
                        info_row("Info", cat.font_info.as_str(), p),
                        info_row("License", cat.license.as_str(), p),
                    ]
                    .spacing(2),
                );
            }
        }

        container(focus_panel(body.into(), p, self.focus == Pane::CategoryFonts))
            .height(Length::FillPortion(3))
            .into()
    }

    // ─── RENDER FRAME ───────────────────────────────────────────

    fn view_render_frame(&self) -> Element<'_, Message> {
        let p = &self.pal;
        let s = &self.state;

        let controls = row![
            text_input("Render text (T)", &s.render_text)
                .id(text_input::Id::new(RENDER_INPUT))
                .on_input(Message::RenderTextChanged)
                .padding(5)
                .size(12)
                .width(Length::Fill),
            text_input("#rrggbb", &self.color_input)
                .on_input(Message::ColorChanged)
                .padding(5)
                .size(12)
                .font(MONO)
                .width(90),
            checkbox("LCD", s.use_lcd_rendering)
                .on_toggle(Message::LcdToggled)
                .size(14)
                .text_size(11),
            checkbox("Hinting", s.use_auto_hinting)
                .on_toggle(Message::HintingToggled)
                .size(14)
                .text_size(11),
            checkbox("Kerning", s.use_kerning)
                .on_toggle(Message::KerningToggled)
                .size(14)
                .text_size(11),
            checkbox("Logging", self.logging_enabled)
                .on_toggle(Message::LoggingToggled)
                .size(14)
                .text_size(11),
            slider(MIN_SIZE..=MAX_SIZE, s.font_size, Message::SizeChanged).width(160),
            text(format!("{} px", s.font_size)).size(11).font(MONO).color(p.label).width(44),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let current = match &self.preview_font {
            Some(path) => match self.registry.get_by_path(path) {
                Some(r) => format!("{} {}  ({})", r.font_name, r.font_style, r.font_file),
                None => path.display().to_string(),
            },
            None => "No font selected".to_string(),
        };

        let preview: Element<Message> = match &self.preview {
            Some(handle) => scrollable(ImageView::new(handle.clone()).content_fit(ContentFit::None))
                .direction(scrollable::Direction::Horizontal(scrollable::Scrollbar::default()))
                .into(),
            None => Space::new(Length::Fill, 40).into(),
        };

        let content = column![
            row![
                section_title("Render", p),
                Space::with_width(10),
                text(current).size(11).color(p.label),
            ]
            .align_y(Alignment::Center),
            controls,
            preview_box(preview, p),
        ]
        .spacing(6);
        panel(content.into(), p)
    }

    // ─── ACTIVITY LOG ───────────────────────────────────────────

    fn view_activity_log(&self) -> Element<'_, Message> {
        let p = &self.pal;
        let label_c = p.label;
        let panel_bg = p.panel_bg;
        let bg = p.bg;

        let rows = self.activity.iter().rev().enumerate().map(|(i, ev)| {
            let sev_color = match ev.severity {
                Severity::Info => p.installed,
                Severity::Warning => p.warning,
                Severity::Error => p.missing,
            };
            let row_bg = if i % 2 == 0 { panel_bg } else { bg };
            container(
                row![
                    text(ev.timestamp()).size(10).font(MONO).color(label_c).width(64),
                    text("\u{25cf}").size(9).color(sev_color).width(12),
                    text(ev.message.as_str()).size(11).color(p.text),
                ]
                .spacing(6)
                .align_y(Alignment::Center),
            )
            .padding([2, 10])
            .width(Length::Fill)
            .style(move |_: &Theme| container::Style {
                background: Some(Background::Color(row_bg)),
                ..Default::default()
            })
            .into()
        });

        let content = column![
            row![
                section_title("Activity", p),
                Space::with_width(Length::Fill),
                text(format!("{} events", self.activity.len())).size(10).font(MONO).color(label_c),
            ]
            .align_y(Alignment::Center),
        ]
        .spacing(4);
        let content = if self.activity.is_empty() {
            content.push(container(empty_hint("Nothing happened yet.", p)).height(90))
        } else {
            content.push(scrollable(Column::with_children(rows)).height(90))
        };
        panel(content.into(), p)
    }
}

// ─── HELPER FUNCTIONS ────────────────────────────────────────────

fn panel<'a>(content: Element<'a, Message>, p: &Palette) -> Element<'a, Message> {
    focus_panel(content, p, false)
}

/// A panel whose border switches to the accent color when it has focus.
fn focus_panel<'a>(content: Element<'a, Message>, p: &Palette, focused: bool) -> Element<'a, Message> {
    let panel_bg = p.panel_bg;
    let border_c = if focused { p.accent } else { p.border };
    container(content)
        .width(Length::Fill)
        .padding(10)
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(panel_bg)),
            border: Border {
                color: border_c,
                width: 1.0,
                radius: 8.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.15),
                offset: Vector::new(0.0, 2.0),
                blur_radius: 8.0,
            },
            ..Default::default()
        })
        .into()
}

fn panel_bg<'a>(content: Element<'a, Message>, bg: Color, border_c: Color) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(bg)),
            border: Border {
                color: border_c,
                width: 0.0,
                radius: 0.0.into(),
            },
            ..Default::default()
        })
        .into()
}

fn preview_box<'a>(content: Element<'a, Message>, p: &Palette) -> Element<'a, Message> {
    let bg = p.preview_bg;
    let border_c = p.border;
    container(content)
        .width(Length::Fill)
        .padding(6)
        .style(move |_: &Theme| container::Style {
            background: Some(Background::Color(bg)),
            border: Border {
                color: border_c,
                width: 1.0,
                radius: 4.0.into(),
            },
            ..Default::default()
        })
        .into()
}

fn menu_tab(label: &'static str, menu: Menu, open: Option<Menu>, p: &Palette) -> Element<'static, Message> {
    let is_active = open == Some(menu);
    let accent = p.accent;
    let label_c = p.label;
    let text_c = p.text;
    let color = if is_active { accent } else { label_c };
    let hover_color = Color::from_rgba(accent.r, accent.g, accent.b, 0.15);
    button(text(label).size(12).color(color))
        .on_press(Message::OpenMenu(menu))
        .padding([4, 14])
        .style(move |_: &Theme, status| {
            let bg = match status {
                button::Status::Hovered => hover_color,
                button::Status::Pressed => Color::from_rgba(accent.r, accent.g, accent.b, 0.25),
                _ => if is_active { Color::from_rgba(accent.r, accent.g, accent.b, 0.1) } else { Color::TRANSPARENT },
            };
            button::Style {
                background: Some(Background::Color(bg)),
                text_color: text_c,
                border: Border {
                    color: if is_active { accent } else { Color::TRANSPARENT },
                    width: 0.0,
                    radius: 6.0.into(),
                },
                ..Default::default()
            }
        })
        .into()
}

fn menu_item(label: &'static str, hint: &'static str, action: Action, p: &Palette) -> Element<'static, Message> {
    let accent = p.accent;
    let text_c = p.text;
    let label_c = p.label;
    let content = if hint.is_empty() {
        row![text(label).size(12).color(text_c)]
    } else {
        row![
            text(label).size(12).color(text_c),
            text(hint).size(10).font(MONO).color(label_c),
        ]
        .spacing(6)
        .align_y(Alignment::Center)
    };
    button(content)
        .on_press(Message::Action(action))
        .padding([4, 10])
        .style(move |_: &Theme, status| {
            let bg = match status {
                button::Status::Hovered => Color::from_rgba(accent.r, accent.g, accent.b, 0.15),
                _ => Color::TRANSPARENT,
            };
            button::Style {
                background: Some(Background::Color(bg)),
                text_color: text_c,
                border: Border {
                    radius: 6.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        })
        .into()
}

fn small_button(label: &'static str, action: Action, p: &Palette) -> Element<'static, Message> {
    let accent = p.accent;
    let text_c = p.text;
    button(text(label).size(11).color(text_c))
        .on_press(Message::Action(action))
        .padding([3, 8])
        .style(move |_: &Theme, status| {
            let alpha = match status {
                button::Status::Hovered => 0.25,
                button::Status::Pressed => 0.35,
                _ => 0.1,
            };
            button::Style {
                background: Some(Background::Color(Color::from_rgba(accent.r, accent.g, accent.b, alpha))),
                text_color: text_c,
                border: Border {
                    color: accent,
                    width: 1.0,
                    radius: 5.0.into(),
                },
                ..Default::default()
            }
        })
        .into()
}

/// Full-width clickable list row with zebra striping and a selection color.
fn select_row<'a>(
    content: Element<'a, Message>,
    selected: bool,
    index: usize,
    msg: Message,
    p: &Palette,
) -> Element<'a, Message> {
    let selection = p.selection;
    let stripe = if index % 2 == 0 { Color::TRANSPARENT } else { Color { a: 0.04, ..p.text } };
    let hover = Color { a: 0.1, ..p.accent };
    let text_c = p.text;
    button(content)
        .on_press(msg)
        .width(Length::Fill)
        .padding([2, 8])
        .style(move |_: &Theme, status| {
            let bg = match (selected, status) {
                (true, _) => selection,
                (false, button::Status::Hovered) => hover,
                _ => stripe,
            };
            button::Style {
                background: Some(Background::Color(bg)),
                text_color: text_c,
                ..Default::default()
            }
        })
        .into()
}

fn column_header(label: &'static str, width: Length, p: &Palette) -> Element<'static, Message> {
    text(label).size(10).font(MONO).color(p.label).width(width).into()
}

fn section_title(label: impl ToString, p: &Palette) -> Element<'static, Message> {
    let accent = p.accent;
    text(label.to_string()).size(13).color(accent).into()
}

fn empty_hint(message: &'static str, p: &Palette) -> Element<'static, Message> {
    container(text(message).size(12).color(p.label))
        .padding([20, 10])
        .center_x(Length::Fill)
        .into()
}

fn info_row<'a>(label: &'static str, value: &'a str, p: &Palette) -> Element<'a, Message> {
    row![
        text(format!("{label}:")).size(11).color(p.label).width(60),
        text(value).size(11).color(p.text),
    ]
    .spacing(8)
    .into()
}
