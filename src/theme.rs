use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Light,
}

pub const THEMES: [Theme; 3] = [Theme::Default, Theme::Dark, Theme::Light];

/// Colors used by the UI for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub text_dim: Color,
    pub background: Color,
    pub highlight: Color,
    pub border: Color,
    pub link: Color,
    pub error: Color,
}

impl Theme {
    pub fn id(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Unknown identifiers fall back to the default theme.
    pub fn from_id(id: &str) -> Self {
        THEMES
            .into_iter()
            .find(|t| t.id() == id.trim())
            .unwrap_or_default()
    }

    pub fn next(self) -> Self {
        let idx = THEMES.iter().position(|&t| t == self).unwrap_or(0);
        THEMES[(idx + 1) % THEMES.len()]
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Default => Palette {
                accent: Color::Rgb(0, 224, 84),
                text: Color::Reset,
                text_dim: Color::DarkGray,
                background: Color::Reset,
                highlight: Color::Rgb(64, 188, 244),
                border: Color::Gray,
                link: Color::Rgb(255, 128, 0),
                error: Color::Red,
            },
            Theme::Dark => Palette {
                accent: Color::Rgb(0, 212, 255),
                text: Color::Rgb(229, 229, 229),
                text_dim: Color::Rgb(115, 115, 115),
                background: Color::Rgb(10, 10, 10),
                highlight: Color::Rgb(59, 130, 246),
                border: Color::Rgb(51, 51, 51),
                link: Color::Rgb(251, 191, 36),
                error: Color::Rgb(239, 68, 68),
            },
            Theme::Light => Palette {
                accent: Color::Rgb(22, 101, 52),
                text: Color::Rgb(23, 23, 23),
                text_dim: Color::Rgb(115, 115, 115),
                background: Color::Rgb(250, 250, 250),
                highlight: Color::Rgb(191, 219, 254),
                border: Color::Rgb(163, 163, 163),
                link: Color::Rgb(29, 78, 216),
                error: Color::Rgb(185, 28, 28),
            },
        }
    }
}

impl Palette {
    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.text_dim)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn link(&self) -> Style {
        Style::default()
            .fg(self.link)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error(&self) -> Style {
        Style::default()
            .fg(Color::White)
            .bg(self.error)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_and_unknown_falls_back() {
        for theme in THEMES {
            assert_eq!(Theme::from_id(theme.id()), theme);
        }
        assert_eq!(Theme::from_id(" dark\n"), Theme::Dark);
        assert_eq!(Theme::from_id("solarized"), Theme::Default);
    }

    #[test]
    fn next_cycles_through_all_themes() {
        assert_eq!(Theme::Default.next(), Theme::Dark);
        assert_eq!(Theme::Dark.next(), Theme::Light);
        assert_eq!(Theme::Light.next(), Theme::Default);
    }
}
