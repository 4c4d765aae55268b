//! A terminal-backed console.
//!
//! Holds everything the interpreter has emitted in a drawable form. Images
//! and sounds have no terminal rendition, so they appear as dim marker
//! lines in the output stream; speech is served by
//! [`forktale_engine::NullSpeech`].

use std::path::Path;

use forktale_engine::console::{Console, OptionAction, Rgb, StyledRun, TextStyle};
use forktale_engine::prefs::Preferences;

/// One styled segment of an output line.
#[derive(Debug, Clone)]
pub struct Segment {
    /// The text, no newlines.
    pub text: String,
    /// Emphasis.
    pub style: TextStyle,
    /// Foreground color override.
    pub color: Option<Rgb>,
    /// Set when clicking this segment navigates.
    pub action: Option<OptionAction>,
}

/// A console the TUI can draw.
#[derive(Debug, Default)]
pub struct TuiConsole {
    /// Window title.
    pub title: String,
    /// Window size hint; advisory only in a terminal.
    pub size: (u32, u32),
    /// Whether the input line accepts text.
    pub input_enabled: bool,
    /// Finished output lines, oldest first.
    pub lines: Vec<Vec<Segment>>,
    /// Options pane entries.
    pub options: Vec<(StyledRun, OptionAction)>,
    /// Active presentation preferences.
    pub prefs: Preferences,
    /// True when new output arrived since the last draw.
    pub dirty: bool,
}

impl TuiConsole {
    /// Create an empty console.
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
            ..Self::default()
        }
    }

    fn append(&mut self, run: StyledRun, action: Option<OptionAction>) {
        self.dirty = true;
        let mut pieces = run.text.split('\n');

        if let Some(first) = pieces.next()
            && !first.is_empty()
        {
            self.push_segment(first, &run, action.clone());
        }
        for piece in pieces {
            self.lines.push(Vec::new());
            if !piece.is_empty() {
                self.push_segment(piece, &run, action.clone());
            }
        }
    }

    fn push_segment(&mut self, text: &str, run: &StyledRun, action: Option<OptionAction>) {
        if self.lines.is_empty() {
            self.lines.push(Vec::new());
        }
        if let Some(line) = self.lines.last_mut() {
            line.push(Segment {
                text: text.to_string(),
                style: run.style,
                color: run.color,
                action,
            });
        }
    }

    /// Marker line for resources a terminal cannot render.
    fn marker(&mut self, kind: &str, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.append(
            StyledRun {
                text: format!("[{kind}: {name}]\n"),
                style: TextStyle::Italic,
                color: None,
            },
            None,
        );
    }
}

impl Console for TuiConsole {
    fn clear(&mut self) {
        self.lines = vec![Vec::new()];
        self.options.clear();
        self.dirty = true;
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        self.dirty = true;
    }

    fn apply_preferences(&mut self, prefs: &Preferences) {
        self.prefs = prefs.clone();
        self.dirty = true;
    }

    fn add_text(&mut self, run: StyledRun) {
        self.append(run, None);
    }

    fn add_link(&mut self, run: StyledRun, action: OptionAction) {
        self.append(run, Some(action));
    }

    fn add_option(&mut self, run: StyledRun, action: OptionAction) {
        self.options.push((run, action));
        self.dirty = true;
    }

    fn add_image(&mut self, path: &Path) {
        self.marker("image", path);
    }

    fn play_sound(&mut self, path: &Path) {
        self.marker("sound", path);
    }
}
