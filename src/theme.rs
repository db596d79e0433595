use iced::Color;
use serde::{Deserialize, Serialize};

// ─── THEME VARIANTS ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThemeVariant {
    CatppuccinLatte,
    CatppuccinMocha,
    GruvboxLight,
    GruvboxDark,
}

impl ThemeVariant {
    pub const ALL: &[ThemeVariant] = &[
        ThemeVariant::CatppuccinLatte,
        ThemeVariant::CatppuccinMocha,
        ThemeVariant::GruvboxLight,
        ThemeVariant::GruvboxDark,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ThemeVariant::CatppuccinLatte => "Latte",
            ThemeVariant::CatppuccinMocha => "Mocha",
            ThemeVariant::GruvboxLight => "Gruvbox Light",
            ThemeVariant::GruvboxDark => "Gruvbox Dark",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, ThemeVariant::CatppuccinLatte | ThemeVariant::GruvboxLight)
    }

    /// Next variant in [`ThemeVariant::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&v| v == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── PALETTE ────────────────────────────────────────────────────

/// Semantic colors of the font manager shell.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub panel_bg: Color,
    pub header_bg: Color,
    pub border: Color,
    pub label: Color,
    pub text: Color,
    pub accent: Color,
    /// Background of the selected row.
    pub selection: Color,
    /// Canvas behind the rendered preview.
    pub preview_bg: Color,
    pub installed: Color,
    pub missing: Color,
    pub warning: Color,
}

pub fn build_palette(theme: ThemeVariant) -> Palette {
    match theme {
        // ── Catppuccin Latte ──
        ThemeVariant::CatppuccinLatte => Palette {
            bg:         hex(0xef, 0xf1, 0xf5),
            panel_bg:   hex(0xe6, 0xe9, 0xef),
            header_bg:  hex(0xdc, 0xe0, 0xe8),
            border:     hex(0xcc, 0xd0, 0xda),
            label:      hex(0x6c, 0x6f, 0x85),
            text:       hex(0x4c, 0x4f, 0x69),
            accent:     hex(0x1e, 0x66, 0xf5),
            selection:  with_alpha(hex(0x1e, 0x66, 0xf5), 0.18),
            preview_bg: Color::WHITE,
            installed:  hex(0x40, 0xa0, 0x2b),
            missing:    hex(0xd2, 0x0f, 0x39),
            warning:    hex(0xdf, 0x8e, 0x1d),
        },
        // ── Catppuccin Mocha ──
        ThemeVariant::CatppuccinMocha => Palette {
            bg:         hex(0x1e, 0x1e, 0x2e),
            panel_bg:   hex(0x18, 0x18, 0x25),
            header_bg:  hex(0x11, 0x11, 0x1b),
            border:     hex(0x31, 0x32, 0x44),
            label:      hex(0xa6, 0xad, 0xc8),
            text:       hex(0xcd, 0xd6, 0xf4),
            accent:     hex(0x89, 0xb4, 0xfa),
            selection:  with_alpha(hex(0x89, 0xb4, 0xfa), 0.22),
            preview_bg: hex(0xf5, 0xf5, 0xf5),
            installed:  hex(0xa6, 0xe3, 0xa1),
            missing:    hex(0xf3, 0x8b, 0xa8),
            warning:    hex(0xf9, 0xe2, 0xaf),
        },
        // ── Gruvbox Light ──
        ThemeVariant::GruvboxLight => Palette {
            bg:         hex(0xfb, 0xf1, 0xc7),
            panel_bg:   hex(0xf2, 0xe5, 0xbc),
            header_bg:  hex(0xeb, 0xdb, 0xb2),
            border:     hex(0xd5, 0xc4, 0xa1),
            label:      hex(0x66, 0x5c, 0x54),
            text:       hex(0x3c, 0x38, 0x36),
            accent:     hex(0x07, 0x66, 0x78),
            selection:  with_alpha(hex(0x07, 0x66, 0x78), 0.18),
            preview_bg: hex(0xff, 0xfb, 0xeb),
            installed:  hex(0x79, 0x74, 0x0e),
            missing:    hex(0x9d, 0x00, 0x06),
            warning:    hex(0xb5, 0x76, 0x14),
        },
        // ── Gruvbox Dark ──
        ThemeVariant::GruvboxDark => Palette {
            bg:         hex(0x28, 0x28, 0x28),
            panel_bg:   hex(0x1d, 0x20, 0x21),
            header_bg:  hex(0x17, 0x19, 0x1a),
            border:     hex(0x3c, 0x38, 0x36),
            label:      hex(0xa8, 0x99, 0x84),
            text:       hex(0xeb, 0xdb, 0xb2),
            accent:     hex(0x83, 0xa5, 0x98),
            selection:  with_alpha(hex(0x83, 0xa5, 0x98), 0.22),
            preview_bg: hex(0xfb, 0xf1, 0xc7),
            installed:  hex(0xb8, 0xbb, 0x26),
            missing:    hex(0xfb, 0x49, 0x34),
            warning:    hex(0xfa, 0xbd, 0x2f),
        },
    }
}

const fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

const fn with_alpha(c: Color, a: f32) -> Color {
    Color { a, ..c }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_wraps() {
        let mut v = ThemeVariant::CatppuccinLatte;
        for _ in 0..ThemeVariant::ALL.len() {
            v = v.next();
        }
        assert_eq!(v, ThemeVariant::CatppuccinLatte);
    }

    #[test]
    fn test_serde_names_stable() {
        let json = serde_json::to_string(&ThemeVariant::GruvboxDark).unwrap();
        assert_eq!(json, "\"GruvboxDark\"");
    }
}
