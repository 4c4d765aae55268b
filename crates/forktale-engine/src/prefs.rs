//! Presentation preferences parsed from the options header.

use crate::console::Rgb;

/// Presentation preferences for a loaded game file.
///
/// Reset to defaults before each header pass; a file only keeps the keys it
/// sets itself. Unknown keys and unparseable values are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    /// Render inline `link@` anchors as plain output instead of hover links.
    pub link_style_text: bool,
    /// Label of the auto-restart option.
    pub option_default_text: String,
    /// Suppress the auto-restart option entirely.
    pub option_default_disable: bool,
    /// Options pane text color.
    pub option_color: Rgb,
    /// Options pane hover color.
    pub option_hover_color: Rgb,
    /// Window background color.
    pub background_color: Rgb,
    /// Output pane font size in points.
    pub output_font_size: f64,
    /// Options pane font size in points.
    pub option_font_size: f64,
    /// Window width hint in pixels.
    pub window_width: u32,
    /// Window height hint in pixels.
    pub window_height: u32,
    /// Output font family list.
    pub output_font: String,
    /// Option font family list.
    pub option_font: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            link_style_text: false,
            option_default_text: "restart".to_string(),
            option_default_disable: false,
            option_color: Rgb::new(0xff, 0xd7, 0x00),
            option_hover_color: Rgb::new(0xff, 0xff, 0xff),
            background_color: Rgb::new(0x00, 0x00, 0x00),
            output_font_size: 16.0,
            option_font_size: 14.0,
            window_width: 800,
            window_height: 600,
            output_font: "Consolas, sans-serif".to_string(),
            option_font: "Consolas, sans-serif".to_string(),
        }
    }
}

impl Preferences {
    /// Parse an options-header blob. Starts from defaults, so a fresh call
    /// forgets everything a previous file set.
    pub fn from_header(header: &str) -> Self {
        let mut prefs = Self::default();

        for line in header.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((k, v)) => (k, v.trim()),
                None => (line, ""),
            };

            match key {
                "link-style-text" => prefs.link_style_text = true,
                "option-default-text" if !value.is_empty() => {
                    prefs.option_default_text = value.to_string();
                }
                "option-default-disable" => prefs.option_default_disable = true,
                "option-color" => {
                    if let Some(c) = Rgb::parse_hex(value) {
                        prefs.option_color = c;
                    }
                }
                "option-hover-color" => {
                    if let Some(c) = Rgb::parse_hex(value) {
                        prefs.option_hover_color = c;
                    }
                }
                "background-color" => {
                    if let Some(c) = Rgb::parse_hex(value) {
                        prefs.background_color = c;
                    }
                }
                "output-font-size" => {
                    if let Some(n) = parse_size(value) {
                        prefs.output_font_size = n;
                    }
                }
                "option-font-size" => {
                    if let Some(n) = parse_size(value) {
                        prefs.option_font_size = n;
                    }
                }
                "window-width" => {
                    if let Ok(n) = value.parse::<u32>()
                        && n > 0
                    {
                        prefs.window_width = n;
                    }
                }
                "window-height" => {
                    if let Ok(n) = value.parse::<u32>()
                        && n > 0
                    {
                        prefs.window_height = n;
                    }
                }
                "output-font" if !value.is_empty() => {
                    prefs.output_font = format!("{value}, sans-serif");
                }
                "option-font" if !value.is_empty() => {
                    prefs.option_font = format!("{value}, sans-serif");
                }
                _ => {}
            }
        }

        prefs
    }
}

/// A font size must be positive and finite.
fn parse_size(value: &str) -> Option<f64> {
    let n: f64 = value.parse().ok()?;
    (n.is_finite() && n > 0.0).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_header_keeps_defaults() {
        let prefs = Preferences::from_header("");
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn recognized_keys_apply() {
        let prefs = Preferences::from_header(
            "link-style-text\noption-default-text play again\nbackground-color 102030\nwindow-width 1024\n",
        );
        assert!(prefs.link_style_text);
        assert_eq!(prefs.option_default_text, "play again");
        assert_eq!(prefs.background_color, Rgb::new(0x10, 0x20, 0x30));
        assert_eq!(prefs.window_width, 1024);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let prefs = Preferences::from_header("no-such-key 12\n");
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn short_hex_colors_expand() {
        let prefs = Preferences::from_header("option-color fab\n");
        assert_eq!(prefs.option_color, Rgb::new(0xff, 0xaa, 0xbb));
    }

    #[test]
    fn invalid_sizes_are_ignored() {
        let prefs = Preferences::from_header(
            "output-font-size 0\noption-font-size NaN\nwindow-width -3\n",
        );
        assert_eq!(prefs.output_font_size, 16.0);
        assert_eq!(prefs.option_font_size, 14.0);
        assert_eq!(prefs.window_width, 800);
    }

    #[test]
    fn fonts_gain_a_fallback() {
        let prefs = Preferences::from_header("output-font Georgia\n");
        assert_eq!(prefs.output_font, "Georgia, sans-serif");
    }
}
