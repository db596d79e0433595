//! Keyboard shortcut table.
//!
//! Single-letter keys only fire when no text input consumed the key press,
//! so typing into the search or render entries never triggers them. The
//! clipboard chords defer to a focused input the same way.

use iced::keyboard::key::Named;
use iced::keyboard::{Key, Modifiers};

/// Which list the arrow keys and pane-relative commands act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    FontTable,
    Categories,
    CategoryFonts,
}

/// Every command reachable from a menu, a button or a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // File
    Save,
    SaveAs,
    Load,
    LoadFromFile,
    Rescan,
    Exit,
    // View
    TogglePaths,
    ToggleHideSystem,
    ToggleHideUser,
    ClearFilters,
    CycleTheme,
    // Paths
    AddUserPath,
    RemoveUserPath,
    AddSystemPaths,
    ClearSystemPaths,
    // Categories
    NewCategory,
    RenameCategory,
    DeleteCategory,
    EditCategoryNote,
    SetCategoryIcon,
    InstallCategory,
    UninstallCategory,
    // Tools
    UpdateFontCache,
    ExportCategoryList,
    ExportFontList,
    // Help
    QuickGuide,
    ShortcutList,
    About,
    // Focus and selection
    Focus(Pane),
    FocusCategoryEntry,
    FocusSearch,
    FocusRenderEntry,
    ClearSearch,
    MatchCategoryFont,
    EditNote,
    RemoveFont,
    AssignToCategory,
    RemoveFromCategory,
    SelectPrevious,
    SelectNext,
    // Clipboard
    CopyFontName,
    CopyFontPath,
    CopyCategoryFontPath,
    CopyFontRecord,
    CutFromCategory,
    PasteIntoCategory,
    Escape,
}

/// Map a key press to an action. `captured` is true when a focused widget
/// (a text input) already handled the press.
pub fn action_for(key: &Key, modifiers: Modifiers, captured: bool) -> Option<Action> {
    let ctrl = modifiers.control();
    let shift = modifiers.shift();
    let alt = modifiers.alt();

    match key.as_ref() {
        Key::Named(Named::Escape) => return Some(Action::Escape),
        Key::Named(Named::F1) => return Some(Action::QuickGuide),
        Key::Named(Named::F2) => return Some(Action::ShortcutList),
        Key::Named(Named::ArrowUp) if !captured => return Some(Action::SelectPrevious),
        Key::Named(Named::ArrowDown) if !captured => return Some(Action::SelectNext),
        Key::Named(Named::Delete) if !captured => return Some(Action::RemoveFont),
        _ => {}
    }

    let Key::Character(c) = key.as_ref() else {
        return None;
    };
    let c = c.to_lowercase();

    if ctrl {
        return match (c.as_str(), shift, alt) {
            ("s", false, false) => Some(Action::Save),
            ("s", true, false) => Some(Action::SaveAs),
            ("o", false, false) => Some(Action::Load),
            _ if captured => None,
            ("c", false, false) => Some(Action::CopyFontName),
            ("c", true, false) => Some(Action::CopyCategoryFontPath),
            ("c", false, true) => Some(Action::CopyFontRecord),
            ("x", true, false) => Some(Action::CutFromCategory),
            ("v", true, false) => Some(Action::PasteIntoCategory),
            _ => None,
        };
    }
    if captured || alt || modifiers.logo() {
        return None;
    }

    let action = match c.as_str() {
        "x" => Action::Focus(Pane::FontTable),
        "c" => Action::Focus(Pane::Categories),
        "v" => Action::Focus(Pane::CategoryFonts),
        "a" => Action::FocusCategoryEntry,
        "s" => Action::FocusSearch,
        "t" => Action::FocusRenderEntry,
        "h" => Action::ToggleHideSystem,
        "j" => Action::ToggleHideUser,
        "z" => Action::ClearSearch,
        "m" => Action::MatchCategoryFont,
        "n" => Action::EditNote,
        "g" | "i" => Action::AssignToCategory,
        "r" => Action::RemoveFromCategory,
        "l" => Action::InstallCategory,
        "k" => Action::UninstallCategory,
        "u" => Action::UpdateFontCache,
        "p" => Action::TogglePaths,
        "o" => Action::SetCategoryIcon,
        _ => return None,
    };
    Some(action)
}

/// Help text for the shortcut dialog.
pub const SHORTCUT_HELP: &str = "\
Focus
  X  found fonts        C  categories       V  fonts in category
  A  category entry     S  search entry     T  render entry

Fonts
  H  hide system fonts  J  hide user fonts  Z  clear search
  M  match category font in table           N  edit note
  G / I  assign to category                 R  remove from category
  Delete  drop selected fonts from the list until the next rescan

Categories
  L  install            K  uninstall        O  set icon
  U  update font cache  P  toggle paths panel

Clipboard
  Ctrl+C        copy font name
  Ctrl+Shift+C  copy category font path
  Ctrl+Alt+C    copy font record (JSON)
  Ctrl+Shift+X  cut font from category
  Ctrl+Shift+V  paste font into category

File
  Ctrl+S  save    Ctrl+Shift+S  save as    Ctrl+O  load

Other
  F1  quick guide   F2  shortcuts   Up/Down  move selection
  Esc  close dialog, or save and exit";

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(s: &str) -> Key {
        Key::Character(s.into())
    }

    #[test]
    fn test_single_letters() {
        let none = Modifiers::empty();
        assert_eq!(action_for(&ch("x"), none, false), Some(Action::Focus(Pane::FontTable)));
        assert_eq!(action_for(&ch("v"), none, false), Some(Action::Focus(Pane::CategoryFonts)));
        assert_eq!(action_for(&ch("g"), none, false), Some(Action::AssignToCategory));
        assert_eq!(action_for(&ch("i"), none, false), Some(Action::AssignToCategory));
        assert_eq!(action_for(&ch("L"), Modifiers::SHIFT, false), Some(Action::InstallCategory));
        assert_eq!(action_for(&ch("q"), none, false), None);
    }

    #[test]
    fn test_letters_suppressed_while_typing() {
        assert_eq!(action_for(&ch("h"), Modifiers::empty(), true), None);
        assert_eq!(action_for(&ch("c"), Modifiers::CTRL, true), None);
        // save still works from inside an entry
        assert_eq!(action_for(&ch("s"), Modifiers::CTRL, true), Some(Action::Save));
    }

    #[test]
    fn test_ctrl_chords() {
        let cs = Modifiers::CTRL | Modifiers::SHIFT;
        assert_eq!(action_for(&ch("c"), Modifiers::CTRL, false), Some(Action::CopyFontName));
        assert_eq!(action_for(&ch("C"), cs, false), Some(Action::CopyCategoryFontPath));
        assert_eq!(
            action_for(&ch("c"), Modifiers::CTRL | Modifiers::ALT, false),
            Some(Action::CopyFontRecord)
        );
        assert_eq!(action_for(&ch("x"), cs, false), Some(Action::CutFromCategory));
        assert_eq!(action_for(&ch("v"), cs, false), Some(Action::PasteIntoCategory));
        assert_eq!(action_for(&ch("s"), cs, false), Some(Action::SaveAs));
        assert_eq!(action_for(&ch("o"), Modifiers::CTRL, false), Some(Action::Load));
        // plain Ctrl+V is left to the focused widget
        assert_eq!(action_for(&ch("v"), Modifiers::CTRL, false), None);
    }

    #[test]
    fn test_named_keys() {
        let none = Modifiers::empty();
        assert_eq!(action_for(&Key::Named(Named::F1), none, false), Some(Action::QuickGuide));
        assert_eq!(action_for(&Key::Named(Named::F2), none, true), Some(Action::ShortcutList));
        assert_eq!(action_for(&Key::Named(Named::Escape), none, true), Some(Action::Escape));
        assert_eq!(action_for(&Key::Named(Named::ArrowDown), none, false), Some(Action::SelectNext));
        assert_eq!(action_for(&Key::Named(Named::ArrowUp), none, true), None);
        assert_eq!(action_for(&Key::Named(Named::Delete), none, false), Some(Action::RemoveFont));
        assert_eq!(action_for(&Key::Named(Named::Delete), none, true), None);
    }
}
