use std::path::{Path, PathBuf};
use std::time::Duration;

use iced::keyboard::{self, key::Named, Key, Modifiers};
use iced::widget::image::Handle as ImageHandle;
use iced::widget::text_input;
use iced::{event, window, Event, Subscription, Task, Theme};

mod dialog;
mod shortcuts;
mod view;

pub use dialog::{Dialog, NoteTarget, Pending};
pub use shortcuts::{Action, Pane};

use crate::activity::ActivityLog;
use crate::clipboard::{self, Payload, SystemClipboard};
use crate::error::{chain, AppError, RegistryError};
use crate::font_info::FontRecord;
use crate::install::{self, FontCacheCommand};
use crate::logging::LogSwitch;
use crate::paths;
use crate::registry::FontRegistry;
use crate::render::{self, TextColor, MAX_SIZE, MIN_SIZE};
use crate::state::AppState;
use crate::theme::{build_palette, Palette};

pub const SEARCH_INPUT: &str = "search";
pub const CATEGORY_INPUT: &str = "category-entry";
pub const RENDER_INPUT: &str = "render-text";

const CACHE_DELAY: Duration = Duration::from_millis(100);

const QUICK_GUIDE: &str = "\
1. Add folders with fonts in the paths panel (P), then Rescan.
2. Create a category: type a name in the category entry (A) and press Enter.
3. Select fonts in the found fonts table (Ctrl+click for several) and press G.
4. Select a category and press L to install its fonts for your user.
5. Press U to rebuild the font cache so other programs see them.

Type in the render entry (T) to preview any font at any size.
Press F2 for the full shortcut list.";

// ─── MESSAGE & ENUMS ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    File,
    View,
    Categories,
    Tools,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Predefined,
    User,
}

#[derive(Debug, Clone)]
pub enum Message {
    Action(Action),
    KeyPressed {
        key: Key,
        modifiers: Modifiers,
        captured: bool,
    },
    ModifiersChanged(Modifiers),
    CloseRequested(window::Id),
    OpenMenu(Menu),
    SelectPath(PathKind, usize),
    SearchChanged(String),
    SelectFont(PathBuf),
    CategoryEntryChanged(String),
    SelectCategory(String),
    SelectCategoryFont(PathBuf),
    RenderTextChanged(String),
    ColorChanged(String),
    SizeChanged(u32),
    LcdToggled(bool),
    HintingToggled(bool),
    KerningToggled(bool),
    LoggingToggled(bool),
    DialogInput(String),
    DialogAccept,
    CloseDialog,
    RunFontCache,
}

// ─── APP STATE ──────────────────────────────────────────────────

pub struct TypeShelf {
    state: AppState,
    state_path: PathBuf,
    install_dir: PathBuf,
    registry: FontRegistry,
    clipboard: SystemClipboard,
    activity: ActivityLog,
    cache_command: FontCacheCommand,
    log_switch: Option<LogSwitch>,
    logging_enabled: bool,
    pal: Palette,

    show_paths: bool,
    open_menu: Option<Menu>,
    focus: Pane,
    modifiers: Modifiers,
    search: String,
    hide_system: bool,
    hide_user: bool,
    category_entry: String,
    /// Text of the color entry; applied to the state once it parses.
    color_input: String,

    selected_path: Option<(PathKind, usize)>,
    selected_fonts: Vec<PathBuf>,
    selected_category: Option<String>,
    selected_category_font: Option<PathBuf>,

    preview_font: Option<PathBuf>,
    preview: Option<ImageHandle>,
    category_preview: Option<ImageHandle>,
    dialog: Option<Dialog>,
}

impl TypeShelf {
    pub fn new(log_switch: Option<LogSwitch>) -> Self {
        let state_path = paths::state_file();
        let state = AppState::load_or_default(&state_path);
        let mut app = Self::with_state(state, state_path, paths::install_dir());
        app.log_switch = log_switch;
        app.rescan();
        app
    }

    /// Build the shell around an already loaded state without scanning.
    pub fn with_state(state: AppState, state_path: PathBuf, install_dir: PathBuf) -> Self {
        let pal = build_palette(state.theme);
        let color_input = state.font_color.clone();
        Self {
            registry: FontRegistry::with_excluded(&install_dir),
            state,
            state_path,
            install_dir,
            clipboard: SystemClipboard::new(),
            activity: ActivityLog::default(),
            cache_command: FontCacheCommand::default(),
            log_switch: None,
            logging_enabled: true,
            pal,
            show_paths: false,
            open_menu: None,
            focus: Pane::default(),
            modifiers: Modifiers::empty(),
            search: String::new(),
            hide_system: false,
            hide_user: false,
            category_entry: String::new(),
            color_input,
            selected_path: None,
            selected_fonts: Vec::new(),
            selected_category: None,
            selected_category_font: None,
            preview_font: None,
            preview: None,
            category_preview: None,
            dialog: None,
        }
    }

    pub fn title(&self) -> String {
        String::from("Typeshelf")
    }

    pub fn theme(&self) -> Theme {
        if self.state.theme.is_light() { Theme::Light } else { Theme::Dark }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let keys = event::listen_with(|event, status, _window| match event {
            Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
                Some(Message::KeyPressed {
                    key,
                    modifiers,
                    captured: matches!(status, event::Status::Captured),
                })
            }
            Event::Keyboard(keyboard::Event::ModifiersChanged(m)) => {
                Some(Message::ModifiersChanged(m))
            }
            _ => None,
        });
        let close = window::close_requests().map(Message::CloseRequested);
        Subscription::batch([keys, close])
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match self.handle(message) {
            Ok(task) => task,
            Err(err) => {
                self.show_error(&err);
                Task::none()
            }
        }
    }

    fn show_error(&mut self, err: &AppError) {
        let detail = chain(err);
        if err.is_warning() {
            self.activity.warn(detail.clone());
            self.dialog = Some(Dialog::warning(err.title(), detail));
        } else {
            self.activity.error(detail.clone());
            self.dialog = Some(Dialog::error(err.title(), detail));
        }
    }

    fn handle(&mut self, message: Message) -> Result<Task<Message>, AppError> {
        match message {
            Message::Action(action) => {
                self.open_menu = None;
                return self.perform(action);
            }
            Message::KeyPressed { key, modifiers, captured } => {
                if let Some(dialog) = &self.dialog {
                    if matches!(key, Key::Named(Named::Escape)) && dialog.is_dismissable() {
                        self.dialog = None;
                    }
                    return Ok(Task::none());
                }
                if let Some(action) = shortcuts::action_for(&key, modifiers, captured) {
                    return self.perform(action);
                }
            }
            Message::ModifiersChanged(m) => self.modifiers = m,
            Message::CloseRequested(id) => {
                if let Err(e) = self.persist() {
                    tracing::error!("Saving on close failed: {}", chain(&e));
                }
                return Ok(window::close(id));
            }
            Message::OpenMenu(menu) => {
                self.open_menu = if self.open_menu == Some(menu) { None } else { Some(menu) };
            }
            Message::SelectPath(kind, i) => self.selected_path = Some((kind, i)),
            Message::SearchChanged(s) => self.search = s,
            Message::SelectFont(path) => {
                self.focus = Pane::FontTable;
                if self.modifiers.control() {
                    if let Some(pos) = self.selected_fonts.iter().position(|p| *p == path) {
                        self.selected_fonts.remove(pos);
                    } else {
                        self.selected_fonts.push(path.clone());
                    }
                } else {
                    self.selected_fonts = vec![path.clone()];
                }
                self.preview_font = Some(path);
                self.rerender()?;
            }
            Message::CategoryEntryChanged(s) => self.category_entry = s,
            Message::SelectCategory(label) => self.select_category(Some(label)),
            Message::SelectCategoryFont(path) => {
                self.focus = Pane::CategoryFonts;
                self.select_category_font(path)?;
            }
            Message::RenderTextChanged(s) => {
                self.state.render_text = s;
                self.rerender()?;
            }
            Message::ColorChanged(s) => {
                if let Ok(color) = s.trim().parse::<TextColor>() {
                    self.state.font_color = color.to_string();
                    self.color_input = s;
                    self.rerender()?;
                } else {
                    self.color_input = s;
                }
            }
            Message::SizeChanged(size) => {
                self.state.font_size = size.clamp(MIN_SIZE, MAX_SIZE);
                self.rerender()?;
            }
            Message::LcdToggled(v) => {
                self.state.use_lcd_rendering = v;
                self.rerender()?;
            }
            Message::HintingToggled(v) => {
                self.state.use_auto_hinting = v;
                self.rerender()?;
            }
            Message::KerningToggled(v) => {
                self.state.use_kerning = v;
                self.rerender()?;
            }
            Message::LoggingToggled(v) => {
                if let Some(switch) = &self.log_switch {
                    switch.set_enabled(v)?;
                }
                self.logging_enabled = v;
                tracing::warn!("Logging {}", if v { "enabled" } else { "disabled" });
            }
            Message::DialogInput(s) => match &mut self.dialog {
                Some(Dialog::NoteEditor { text, .. }) => *text = s,
                Some(Dialog::Rename { new, .. }) => *new = s,
                _ => {}
            },
            Message::DialogAccept => return self.accept_dialog(),
            Message::CloseDialog => {
                if self.dialog.as_ref().is_some_and(Dialog::is_dismissable) {
                    self.dialog = None;
                }
            }
            Message::RunFontCache => {
                self.dialog = None;
                let output = self.cache_command.run()?;
                self.activity.info(format!("'{}' completed", self.cache_command));
                self.dialog = Some(Dialog::report(
                    "Font Cache Update - Report",
                    format!("Success:\n{output}"),
                ));
            }
        }
        Ok(Task::none())
    }

    // ─── ACTIONS ────────────────────────────────────────────────

    fn perform(&mut self, action: Action) -> Result<Task<Message>, AppError> {
        match action {
            Action::Save => {
                self.persist()?;
                self.activity.info(format!("Saved to {}", self.state_path.display()));
            }
            Action::SaveAs => {
                let dir = paths::saves_dir();
                ensure_dir(&dir);
                let Some(path) = rfd::FileDialog::new()
                    .set_title("Save Collection As")
                    .add_filter("JSON", &["json"])
                    .set_directory(&dir)
                    .set_file_name("collection.json")
                    .save_file()
                else {
                    return Ok(Task::none());
                };
                self.state.save(&path)?;
                self.activity.info(format!("Saved to {}", path.display()));
            }
            Action::Load => {
                self.dialog = Some(Dialog::confirm(
                    "Load State",
                    format!(
                        "Reload {}? Unsaved changes are lost.",
                        self.state_path.display()
                    ),
                    Pending::Load,
                ));
            }
            Action::LoadFromFile => {
                let Some(path) = rfd::FileDialog::new()
                    .set_title("Load Collection")
                    .add_filter("JSON", &["json"])
                    .set_directory(paths::saves_dir())
                    .pick_file()
                else {
                    return Ok(Task::none());
                };
                self.load_from(&path)?;
                self.persist()?;
            }
            Action::Rescan => {
                self.rescan();
                self.rerender()?;
            }
            Action::Exit => {
                self.persist()?;
                return Ok(iced::exit());
            }
            Action::TogglePaths => self.show_paths = !self.show_paths,
            Action::ToggleHideSystem => self.hide_system = !self.hide_system,
            Action::ToggleHideUser => self.hide_user = !self.hide_user,
            Action::ClearFilters => {
                self.search.clear();
                self.hide_system = false;
                self.hide_user = false;
            }
            Action::ClearSearch => self.search.clear(),
            Action::CycleTheme => {
                self.state.theme = self.state.theme.next();
                self.pal = build_palette(self.state.theme);
                self.persist()?;
            }
            Action::AddUserPath => {
                let Some(dir) = rfd::FileDialog::new()
                    .set_title("Add Font Folder")
                    .pick_folder()
                else {
                    return Ok(Task::none());
                };
                self.add_user_path(&dir)?;
            }
            Action::RemoveUserPath => {
                let Some((PathKind::User, i)) = self.selected_path else {
                    return Err(AppError::Selection("No user path selected."));
                };
                let path = self.state.font_paths_user.get(i).cloned().unwrap_or_default();
                self.dialog = Some(Dialog::confirm(
                    "Remove Path",
                    format!("Remove '{path}' from the user font paths?"),
                    Pending::RemoveUserPath(i),
                ));
            }
            Action::AddSystemPaths => {
                let added = self.add_system_paths();
                self.rescan();
                self.persist()?;
                self.dialog = Some(Dialog::info(
                    "System Paths",
                    format!("Added {added} system font path(s)."),
                ));
            }
            Action::ClearSystemPaths => {
                self.dialog = Some(Dialog::confirm(
                    "Clear System Paths",
                    "Remove every predefined system font path?",
                    Pending::ClearSystemPaths,
                ));
            }
            Action::NewCategory => {
                let label = self.category_entry.trim().to_string();
                self.state.categories.add(&label)?;
                self.category_entry.clear();
                self.activity.info(format!("Category '{label}' created"));
                self.select_category(Some(label));
                self.persist()?;
            }
            Action::RenameCategory => {
                let old = self.require_category()?.to_string();
                self.dialog = Some(Dialog::Rename { new: old.clone(), old });
                return Ok(text_input::focus(text_input::Id::new(dialog::RENAME_INPUT)));
            }
            Action::DeleteCategory => {
                let label = self.require_category()?.to_string();
                self.dialog = Some(Dialog::confirm(
                    "Delete Category",
                    format!("Delete category '{label}'? Installed fonts stay installed."),
                    Pending::DeleteCategory(label),
                ));
            }
            Action::EditCategoryNote => {
                let label = self.require_category()?.to_string();
                let note = self
                    .state
                    .categories
                    .get(&label)
                    .map(|c| c.user_note.clone())
                    .unwrap_or_default();
                self.dialog = Some(Dialog::NoteEditor {
                    subject: format!("Category: {label}"),
                    target: NoteTarget::Category(label),
                    text: note,
                });
                return Ok(text_input::focus(text_input::Id::new(dialog::NOTE_INPUT)));
            }
            Action::SetCategoryIcon => {
                let label = self.require_category()?.to_string();
                let Some(file) = rfd::FileDialog::new()
                    .set_title("Select Category Icon")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp", "webp"])
                    .pick_file()
                else {
                    return Ok(Task::none());
                };
                self.state.categories.set_icon(&label, &file, &paths::icons_dir())?;
                self.persist()?;
            }
            Action::RemoveFont => self.remove_selected_fonts()?,
            Action::InstallCategory => self.install_selected()?,
            Action::UninstallCategory => self.uninstall_selected()?,
            Action::UpdateFontCache => {
                self.dialog = Some(Dialog::Wait {
                    title: "Font Cache".into(),
                    body: format!("Running '{}', please wait...", self.cache_command),
                });
                return Ok(Task::perform(tokio::time::sleep(CACHE_DELAY), |()| {
                    Message::RunFontCache
                }));
            }
            Action::ExportCategoryList => {
                let Some(path) = save_text_dialog("Export Category List", "category_list.txt")
                else {
                    return Ok(Task::none());
                };
                let n = self.state.categories.export_category_list(&path)?;
                self.dialog = Some(Dialog::info(
                    "Export",
                    format!("Exported {n} categories to {}", path.display()),
                ));
            }
            Action::ExportFontList => {
                let Some(path) = save_text_dialog("Export Font List", "font_list.txt") else {
                    return Ok(Task::none());
                };
                let n = self.registry.export_font_list(&path)?;
                self.dialog = Some(Dialog::info(
                    "Export",
                    format!("Exported {n} fonts to {}", path.display()),
                ));
            }
            Action::QuickGuide => self.dialog = Some(Dialog::report("Quick Guide", QUICK_GUIDE)),
            Action::ShortcutList => {
                self.dialog = Some(Dialog::report("Shortcuts", shortcuts::SHORTCUT_HELP));
            }
            Action::About => {
                self.dialog = Some(Dialog::info(
                    "About",
                    format!(
                        "Typeshelf {}\nBrowse, preview, categorize and install fonts.\n\nState: {}",
                        env!("CARGO_PKG_VERSION"),
                        self.state_path.display()
                    ),
                ));
            }
            Action::Focus(pane) => self.focus = pane,
            Action::FocusCategoryEntry => {
                return Ok(text_input::focus(text_input::Id::new(CATEGORY_INPUT)));
            }
            Action::FocusSearch => return Ok(text_input::focus(text_input::Id::new(SEARCH_INPUT))),
            Action::FocusRenderEntry => {
                return Ok(text_input::focus(text_input::Id::new(RENDER_INPUT)));
            }
            Action::MatchCategoryFont => self.match_category_font()?,
            Action::EditNote => return self.edit_note(),
            Action::AssignToCategory => self.assign_selected()?,
            Action::RemoveFromCategory => self.remove_selected_from_category()?,
            Action::SelectPrevious => self.step_selection(false)?,
            Action::SelectNext => self.step_selection(true)?,
            Action::CopyFontName => {
                let name = self.current_record()?.font_name.clone();
                self.clipboard.set_text(&name)?;
                self.activity.info(format!("Copied font name '{name}'"));
            }
            Action::CopyFontPath => {
                let path = self.current_record()?.font_path.to_string_lossy().into_owned();
                self.clipboard.set_text(&path)?;
                self.activity.info(format!("Copied {path}"));
            }
            Action::CopyCategoryFontPath => {
                let path = self.require_category_font()?.to_string_lossy().into_owned();
                self.clipboard.set_text(&path)?;
                self.activity.info(format!("Copied {path}"));
            }
            Action::CopyFontRecord => {
                let json = clipboard::record_json(self.current_record()?)?;
                self.clipboard.set_text(&json)?;
                self.activity.info("Copied font record");
            }
            Action::CutFromCategory => {
                let path = self.require_category_font()?.to_path_buf();
                self.clipboard.set_text(&path.to_string_lossy())?;
                self.remove_selected_from_category()?;
            }
            Action::PasteIntoCategory => {
                let text = self.clipboard.get_text()?;
                self.paste_into_category(&text)?;
            }
            Action::Escape => {
                if self.dialog.is_some() {
                    if self.dialog.as_ref().is_some_and(Dialog::is_dismissable) {
                        self.dialog = None;
                    }
                } else {
                    self.persist()?;
                    return Ok(iced::exit());
                }
            }
        }
        Ok(Task::none())
    }

    fn accept_dialog(&mut self) -> Result<Task<Message>, AppError> {
        let Some(dialog) = self.dialog.take() else {
            return Ok(Task::none());
        };
        match dialog {
            Dialog::Confirm { pending, .. } => self.run_pending(pending)?,
            Dialog::NoteEditor { target, text, .. } => match target {
                NoteTarget::Font(path) => {
                    self.registry.set_note(&path, &text)?;
                    self.activity.info(format!("Note updated for {}", path.display()));
                }
                NoteTarget::Category(label) => {
                    self.state.categories.set_note(&label, &text)?;
                    self.persist()?;
                }
            },
            Dialog::Rename { old, new } => {
                let new = new.trim().to_string();
                if new != old {
                    self.state.categories.rename(&old, &new)?;
                    self.activity.info(format!("Category '{old}' renamed to '{new}'"));
                    self.selected_category = Some(new);
                    self.persist()?;
                }
            }
            Dialog::Wait { .. } => self.dialog = Some(dialog),
            _ => {}
        }
        Ok(Task::none())
    }

    fn run_pending(&mut self, pending: Pending) -> Result<(), AppError> {
        match pending {
            Pending::DeleteCategory(label) => {
                self.state.categories.delete(&label)?;
                self.activity.info(format!("Category '{label}' deleted"));
                self.select_category(None);
                self.persist()?;
            }
            Pending::ClearSystemPaths => {
                self.state.font_paths_predefined.clear();
                self.selected_path = None;
                self.rescan();
                self.persist()?;
            }
            Pending::RemoveUserPath(i) => {
                if i < self.state.font_paths_user.len() {
                    let removed = self.state.font_paths_user.remove(i);
                    self.activity.info(format!("Removed font path {removed}"));
                }
                self.selected_path = None;
                self.rescan();
                self.persist()?;
            }
            Pending::Load => {
                let path = self.state_path.clone();
                self.load_from(&path)?;
            }
        }
        Ok(())
    }

    // ─── PERSISTENCE & SCANNING ─────────────────────────────────

    fn persist(&self) -> Result<(), AppError> {
        self.state.save(&self.state_path)?;
        Ok(())
    }

    fn load_from(&mut self, path: &Path) -> Result<(), AppError> {
        self.state = AppState::load(path)?;
        self.pal = build_palette(self.state.theme);
        self.color_input = self.state.font_color.clone();
        self.selected_path = None;
        self.selected_fonts.clear();
        self.select_category(None);
        self.preview_font = None;
        self.preview = None;
        self.rescan();
        self.activity.info(format!("Loaded {}", path.display()));
        Ok(())
    }

    /// Rebuild the registry from the configured paths and refresh categories.
    fn rescan(&mut self) {
        self.registry.clear();
        let report = self
            .registry
            .scan(&self.state.font_paths_predefined, &self.state.font_paths_user);
        for p in &report.invalid_paths {
            self.activity.warn(format!("Font path does not exist: {}", p.display()));
        }
        self.activity.info(format!(
            "Found {} fonts ({} duplicate file names skipped)",
            report.added, report.duplicates
        ));
        self.state.categories.refresh_all(&self.registry);
        self.selected_fonts.retain(|p| self.registry.contains(p));
        self.sync_category_preview();
    }

    fn add_user_path(&mut self, dir: &Path) -> Result<(), AppError> {
        let expanded = paths::expand(dir);
        if !expanded.is_dir() {
            return Err(RegistryError::InvalidPath(dir.to_path_buf()).into());
        }
        let known = self
            .state
            .font_paths_predefined
            .iter()
            .chain(self.state.font_paths_user.iter())
            .any(|p| paths::expand(p) == expanded);
        if known {
            return Err(RegistryError::DuplicatePath(expanded).into());
        }
        self.state
            .font_paths_user
            .push(expanded.to_string_lossy().into_owned());
        self.activity.info(format!("Added font path {}", expanded.display()));
        self.rescan();
        self.persist()
    }

    /// Append existing platform font dirs not yet listed. Returns how many.
    fn add_system_paths(&mut self) -> usize {
        let mut added = 0;
        for dir in paths::system_font_dirs().into_iter().filter(|d| d.is_dir()) {
            let s = dir.to_string_lossy().into_owned();
            if !self.state.font_paths_predefined.contains(&s) {
                self.state.font_paths_predefined.push(s);
                added += 1;
            }
        }
        added
    }

    // ─── SELECTION ──────────────────────────────────────────────

    fn visible_fonts(&self) -> Vec<&FontRecord> {
        self.registry.filter(&self.search, self.hide_system, self.hide_user)
    }

    fn require_category(&self) -> Result<&str, AppError> {
        self.selected_category
            .as_deref()
            .ok_or(AppError::Selection("No category selected."))
    }

    fn require_category_font(&self) -> Result<&Path, AppError> {
        self.selected_category_font
            .as_deref()
            .ok_or(AppError::Selection("No font selected in the category."))
    }

    /// Record behind the current selection: the category font when that
    /// list has focus, otherwise the first selected font of the table.
    fn current_record(&self) -> Result<&FontRecord, AppError> {
        let path = match (self.focus, &self.selected_category_font) {
            (Pane::CategoryFonts, Some(p)) => p,
            _ => self
                .selected_fonts
                .first()
                .ok_or(AppError::Selection("No font selected."))?,
        };
        self.registry.get_by_path(path).ok_or_else(|| {
            RegistryError::FontNotFound(path.display().to_string()).into()
        })
    }

    fn select_category(&mut self, label: Option<String>) {
        if label.is_some() {
            self.focus = Pane::Categories;
        }
        self.selected_category = label;
        self.selected_category_font = None;
        self.sync_category_preview();
    }

    fn select_category_font(&mut self, path: PathBuf) -> Result<(), AppError> {
        let present = self.registry.contains(&path) || path.is_file();
        self.selected_category_font = Some(path.clone());
        if present {
            self.preview_font = Some(path);
            self.rerender()?;
        } else {
            self.activity.warn(format!("Font missing: {}", path.display()));
        }
        Ok(())
    }

    fn step_selection(&mut self, forward: bool) -> Result<(), AppError> {
        match self.focus {
            Pane::FontTable => {
                let visible: Vec<PathBuf> =
                    self.visible_fonts().iter().map(|r| r.font_path.clone()).collect();
                let current = self
                    .selected_fonts
                    .first()
                    .and_then(|s| visible.iter().position(|p| p == s));
                if let Some(i) = step_index(visible.len(), current, forward) {
                    self.selected_fonts = vec![visible[i].clone()];
                    self.preview_font = Some(visible[i].clone());
                    self.rerender()?;
                }
            }
            Pane::Categories => {
                let labels: Vec<String> =
                    self.state.categories.labels().map(str::to_string).collect();
                let current = self
                    .selected_category
                    .as_ref()
                    .and_then(|s| labels.iter().position(|l| l == s));
                if let Some(i) = step_index(labels.len(), current, forward) {
                    self.select_category(Some(labels[i].clone()));
                }
            }
            Pane::CategoryFonts => {
                let Some(cat) = self
                    .selected_category
                    .as_deref()
                    .and_then(|l| self.state.categories.get(l))
                else {
                    return Ok(());
                };
                let fonts = cat.fonts_list.clone();
                let current = self
                    .selected_category_font
                    .as_ref()
                    .and_then(|s| fonts.iter().position(|p| p == s));
                if let Some(i) = step_index(fonts.len(), current, forward) {
                    self.select_category_font(fonts[i].clone())?;
                }
            }
        }
        Ok(())
    }

    fn match_category_font(&mut self) -> Result<(), AppError> {
        let path = self.require_category_font()?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let found = self
            .registry
            .get_by_file_name(&file_name)
            .map(|r| r.font_path.clone())
            .ok_or_else(|| {
                RegistryError::FontNotFound(format!("{file_name} (try rescanning the font paths)"))
            })?;
        if !self.visible_fonts().iter().any(|r| r.font_path == found) {
            self.search.clear();
            self.hide_system = false;
            self.hide_user = false;
        }
        self.focus = Pane::FontTable;
        self.selected_fonts = vec![found.clone()];
        self.preview_font = Some(found);
        self.rerender()?;
        Ok(())
    }

    fn edit_note(&mut self) -> Result<Task<Message>, AppError> {
        if self.focus == Pane::Categories {
            return self.perform(Action::EditCategoryNote);
        }
        let record = self.current_record()?;
        self.dialog = Some(Dialog::NoteEditor {
            subject: format!("{} ({})", record.font_name, record.font_file),
            target: NoteTarget::Font(record.font_path.clone()),
            text: record.user_note.clone(),
        });
        Ok(text_input::focus(text_input::Id::new(dialog::NOTE_INPUT)))
    }

    /// Drop the selected fonts from the registry until the next rescan.
    fn remove_selected_fonts(&mut self) -> Result<(), AppError> {
        if self.selected_fonts.is_empty() {
            return Err(AppError::Selection("No font selected."));
        }
        let selected = std::mem::take(&mut self.selected_fonts);
        let removed = selected
            .iter()
            .filter(|p| self.registry.remove_by_path(p).is_some())
            .count();
        if self.preview_font.as_ref().is_some_and(|p| selected.contains(p)) {
            self.preview_font = None;
            self.preview = None;
        }
        self.state.categories.refresh_all(&self.registry);
        self.sync_category_preview();
        self.activity.info(format!("Removed {removed} font(s) from the list"));
        Ok(())
    }

    // ─── CATEGORY MUTATIONS ─────────────────────────────────────

    fn assign_selected(&mut self) -> Result<(), AppError> {
        if self.selected_fonts.is_empty() {
            return Err(AppError::Selection("No font selected."));
        }
        let label = self.require_category()?.to_string();
        let added = self
            .state
            .categories
            .assign(&label, self.selected_fonts.iter().cloned())?;
        self.refresh_category(&label)?;
        self.activity.info(format!("Assigned {added} font(s) to '{label}'"));
        self.persist()
    }

    fn remove_selected_from_category(&mut self) -> Result<(), AppError> {
        let label = self.require_category()?.to_string();
        let path = self.require_category_font()?.to_path_buf();
        self.state.categories.remove_font(&label, &path)?;
        self.selected_category_font = None;
        self.refresh_category(&label)?;
        self.activity.info(format!("Removed {} from '{label}'", path.display()));
        self.persist()
    }

    fn paste_into_category(&mut self, text: &str) -> Result<(), AppError> {
        let label = self.require_category()?.to_string();
        let payload = Payload::parse(text)?;
        // a record copied from this session resolves by id even if its path moved
        let path = match &payload {
            Payload::Record(record) => self
                .registry
                .get_by_id(&record.id)
                .map_or_else(|| payload.font_path(), |r| r.font_path.clone()),
            Payload::Path(_) => payload.font_path(),
        };
        if !path.is_file() {
            return Err(RegistryError::InvalidPath(path).into());
        }
        let in_category = self
            .state
            .categories
            .get(&label)
            .is_some_and(|c| c.contains(&path));
        if in_category {
            self.dialog = Some(Dialog::info(
                "Paste",
                format!("{} is already in '{label}'.", path.display()),
            ));
            return Ok(());
        }
        if !self.registry.contains(&path) {
            match payload {
                Payload::Record(mut record) => {
                    record.font_path.clone_from(&path);
                    self.registry.add(record);
                }
                Payload::Path(_) => {
                    self.registry.add_path(&path)?;
                }
            }
        }
        self.state.categories.assign(&label, [path.clone()])?;
        self.refresh_category(&label)?;
        self.activity.info(format!("Pasted {} into '{label}'", path.display()));
        self.persist()
    }

    fn install_selected(&mut self) -> Result<(), AppError> {
        let label = self.require_category()?.to_string();
        let cat = self.state.categories.get_mut(&label)?;
        let report = install::install_category(cat, &self.install_dir)?;

        let mut body = format!(
            "Installed {} font(s) of '{label}' into {}\nAlready present: {}\n",
            report.installed,
            self.install_dir.display(),
            report.skipped
        );
        for p in &report.missing {
            body.push_str(&format!("Missing: {}\n", p.display()));
        }
        for (p, why) in &report.failed {
            body.push_str(&format!("Failed: {} ({why})\n", p.display()));
        }
        if report.installed > 0 {
            body.push_str("\nRun Update Font Cache (U) to make the fonts visible to other programs.");
        }
        self.activity.info(format!("Installed {} font(s) of '{label}'", report.installed));
        self.dialog = Some(Dialog::report("Install Category", body));
        self.persist()
    }

    fn uninstall_selected(&mut self) -> Result<(), AppError> {
        let label = self.require_category()?.to_string();
        let cat = self.state.categories.get_mut(&label)?;
        let report = install::uninstall_category(cat, &self.install_dir);

        let mut body = format!("Removed {} font link(s) of '{label}'\n", report.removed);
        for (p, why) in &report.failed {
            body.push_str(&format!("Failed: {} ({why})\n", p.display()));
        }
        self.activity.info(format!("Uninstalled {} font(s) of '{label}'", report.removed));
        self.dialog = Some(Dialog::report("Uninstall Category", body));
        self.persist()
    }

    fn refresh_category(&mut self, label: &str) -> Result<(), AppError> {
        self.state.categories.refresh_info(label, &self.registry)?;
        self.state.categories.refresh_preview(label, &self.registry)?;
        self.sync_category_preview();
        Ok(())
    }

    // ─── RENDERING ──────────────────────────────────────────────

    fn rerender(&mut self) -> Result<(), AppError> {
        let Some(path) = self.preview_font.as_deref() else {
            self.preview = None;
            return Ok(());
        };
        let rendered =
            render::render_text(path, &self.state.render_text, &self.state.render_options())?;
        if rendered.skipped > 0 {
            tracing::debug!("{} glyphs skipped rendering {}", rendered.skipped, path.display());
        }
        let (w, h) = rendered.image.dimensions();
        self.preview = Some(ImageHandle::from_rgba(w, h, rendered.image.into_raw()));
        Ok(())
    }

    fn sync_category_preview(&mut self) {
        self.category_preview = self
            .selected_category
            .as_deref()
            .and_then(|l| self.state.categories.get(l))
            .and_then(|c| c.preview.as_ref())
            .map(|img| {
                let (w, h) = img.dimensions();
                ImageHandle::from_rgba(w, h, img.as_raw().clone())
            });
    }
}

/// Create the directory a file picker starts in; a failure is logged.
fn ensure_dir(dir: &Path) -> bool {
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Cannot create {}: {e}", dir.display());
            false
        }
    }
}

fn save_text_dialog(title: &str, file_name: &str) -> Option<PathBuf> {
    let dir = paths::saves_dir();
    ensure_dir(&dir);
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Text", &["txt"])
        .set_directory(dir)
        .set_file_name(file_name)
        .save_file()
}

/// Next index when moving through a list of `len` items.
fn step_index(len: usize, current: Option<usize>, forward: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (current, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1).min(len - 1),
        (Some(i), false) => i.saturating_sub(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dejavu() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSans.ttf")
    }

    fn app(tmp: &tempfile::TempDir) -> TypeShelf {
        let state = AppState {
            font_paths_predefined: vec![format!("{}/assets/fonts", env!("CARGO_MANIFEST_DIR"))],
            ..AppState::default()
        };
        let mut app = TypeShelf::with_state(
            state,
            tmp.path().join("contents.json"),
            tmp.path().join("installed"),
        );
        app.rescan();
        app
    }

    #[test]
    fn test_step_index() {
        assert_eq!(step_index(0, None, true), None);
        assert_eq!(step_index(3, None, false), Some(0));
        assert_eq!(step_index(3, Some(2), true), Some(2));
        assert_eq!(step_index(3, Some(0), false), Some(0));
        assert_eq!(step_index(3, Some(1), true), Some(2));
    }

    #[test]
    fn test_ensure_dir_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("saves/deeper");
        assert!(ensure_dir(&nested));
        assert!(nested.is_dir());

        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(!ensure_dir(&file.join("saves")));
    }

    #[test]
    fn test_assign_without_selection_warns() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        let _ = app.update(Message::Action(Action::AssignToCategory));
        assert!(matches!(&app.dialog, Some(Dialog::Warning { title, .. }) if title == "Selection Error"));
        assert!(app.state.categories.is_empty());
    }

    #[test]
    fn test_create_assign_and_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        assert_eq!(app.registry.len(), 1);

        let _ = app.update(Message::CategoryEntryChanged("Sans".into()));
        let _ = app.update(Message::Action(Action::NewCategory));
        let _ = app.update(Message::SelectFont(dejavu()));
        assert!(app.preview.is_some());
        let _ = app.update(Message::Action(Action::AssignToCategory));
        assert!(app.dialog.is_none());

        let cat = app.state.categories.get("Sans").unwrap();
        assert_eq!(cat.fonts_list, vec![dejavu()]);
        assert!(cat.preview.is_some());

        let saved = AppState::load(&tmp.path().join("contents.json")).unwrap();
        assert_eq!(saved.categories.get("Sans").unwrap().fonts_list.len(), 1);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.state.categories.add("Mono").unwrap();
        let _ = app.update(Message::SelectCategory("Mono".into()));
        let _ = app.update(Message::Action(Action::DeleteCategory));
        assert!(app.state.categories.get("Mono").is_some());
        let _ = app.update(Message::DialogAccept);
        assert!(app.state.categories.get("Mono").is_none());
        assert!(app.selected_category.is_none());
    }

    #[test]
    fn test_rename_through_dialog() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.state.categories.add("Old").unwrap();
        let _ = app.update(Message::SelectCategory("Old".into()));
        let _ = app.update(Message::Action(Action::RenameCategory));
        let _ = app.update(Message::DialogInput("New".into()));
        let _ = app.update(Message::DialogAccept);
        assert!(app.state.categories.get("New").is_some());
        assert_eq!(app.selected_category.as_deref(), Some("New"));
    }

    #[test]
    fn test_paste_missing_path_warns() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.state.categories.add("Serif").unwrap();
        app.select_category(Some("Serif".into()));
        let err = app.paste_into_category("/no/such/font.ttf").unwrap_err();
        assert!(err.is_warning());

        app.paste_into_category(&dejavu().to_string_lossy()).unwrap();
        assert!(app.state.categories.get("Serif").unwrap().contains(&dejavu()));
        // second paste reports instead of duplicating
        app.paste_into_category(&dejavu().to_string_lossy()).unwrap();
        assert!(matches!(app.dialog, Some(Dialog::Info { .. })));
        assert_eq!(app.state.categories.get("Serif").unwrap().fonts_list.len(), 1);
    }

    #[test]
    fn test_wait_dialog_ignores_escape() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.dialog = Some(Dialog::Wait { title: "t".into(), body: "b".into() });
        let _ = app.update(Message::KeyPressed {
            key: Key::Named(Named::Escape),
            modifiers: Modifiers::empty(),
            captured: false,
        });
        assert!(app.dialog.is_some());
        let _ = app.update(Message::CloseDialog);
        assert!(app.dialog.is_some());
    }

    #[test]
    fn test_invalid_color_keeps_state() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        let _ = app.update(Message::ColorChanged("#12".into()));
        assert_eq!(app.state.font_color, "#000000");
        let _ = app.update(Message::ColorChanged("#AbCdEf".into()));
        assert_eq!(app.state.font_color, "#abcdef");
    }

    #[test]
    fn test_load_requires_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.persist().unwrap();
        app.state.categories.add("Unsaved").unwrap();

        let _ = app.update(Message::Action(Action::Load));
        assert!(matches!(
            &app.dialog,
            Some(Dialog::Confirm { pending: Pending::Load, .. })
        ));
        assert!(app.state.categories.get("Unsaved").is_some());

        let _ = app.update(Message::DialogAccept);
        assert!(app.dialog.is_none());
        assert!(app.state.categories.get("Unsaved").is_none());
        assert_eq!(app.registry.len(), 1);
    }

    #[test]
    fn test_missing_font_keeps_preview() {
        let tmp = tempfile::tempdir().unwrap();
        let fonts = tmp.path().join("fonts");
        std::fs::create_dir_all(&fonts).unwrap();
        let copy = fonts.join("Copy.ttf");
        std::fs::copy(dejavu(), &copy).unwrap();
        let state = AppState {
            font_paths_predefined: Vec::new(),
            font_paths_user: vec![fonts.to_string_lossy().into_owned()],
            ..AppState::default()
        };
        let mut app = TypeShelf::with_state(
            state,
            tmp.path().join("contents.json"),
            tmp.path().join("installed"),
        );
        app.rescan();

        let _ = app.update(Message::SelectFont(copy.clone()));
        let before = app.preview.as_ref().map(ImageHandle::id);
        assert!(before.is_some());

        std::fs::remove_file(&copy).unwrap();
        let _ = app.update(Message::RenderTextChanged("Changed".into()));
        assert_eq!(app.preview.as_ref().map(ImageHandle::id), before);
        assert!(matches!(&app.dialog, Some(Dialog::Error { title, .. }) if title == "Render Error"));
    }

    #[test]
    fn test_drop_font_until_rescan() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.state.categories.add("Sans").unwrap();
        app.state.categories.assign("Sans", [dejavu()]).unwrap();

        let _ = app.update(Message::Action(Action::RemoveFont));
        assert!(matches!(&app.dialog, Some(Dialog::Warning { .. })));
        app.dialog = None;

        let _ = app.update(Message::SelectFont(dejavu()));
        let _ = app.update(Message::Action(Action::RemoveFont));
        assert!(app.dialog.is_none());
        assert!(app.registry.is_empty());
        assert!(app.selected_fonts.is_empty());
        assert!(app.preview.is_none());
        assert_eq!(
            app.state.categories.missing_fonts("Sans", &app.registry).unwrap(),
            vec![dejavu()]
        );

        let _ = app.update(Message::Action(Action::Rescan));
        assert_eq!(app.registry.len(), 1);
    }

    #[test]
    fn test_paste_record_resolves_by_id() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        app.state.categories.add("Serif").unwrap();
        app.select_category(Some("Serif".into()));

        let mut record = app.registry.get_by_path(&dejavu()).unwrap().clone();
        record.font_path = PathBuf::from("/moved/away/DejaVuSans.ttf");
        app.paste_into_category(&record.to_json().unwrap()).unwrap();
        assert_eq!(app.state.categories.get("Serif").unwrap().fonts_list, vec![dejavu()]);
    }

    #[test]
    fn test_logging_toggle_without_subscriber() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(&tmp);
        assert!(app.logging_enabled);
        let _ = app.update(Message::LoggingToggled(false));
        assert!(!app.logging_enabled);
        assert!(app.dialog.is_none());
    }
}
