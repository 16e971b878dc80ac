use std::collections::BTreeMap;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::won;
use crate::models::TransactionType;
use crate::settings::{parse_hex, Palette};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const WARNING_STYLE: Style = Style::new().fg(Color::Yellow);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

// ---------------------------------------------------------------------------
// Palette → terminal colors
// ---------------------------------------------------------------------------

/// Resolved chart colors. Unparseable palette entries fall back to a plain
/// terminal color.
#[derive(Debug, Clone)]
pub struct Theme {
    pub deposit: Color,
    pub withdrawal: Color,
    pub hourly: Color,
    types: BTreeMap<String, Color>,
}

fn hex_color(value: &str, fallback: Color) -> Color {
    parse_hex(value)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(fallback)
}

impl Theme {
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            deposit: hex_color(&palette.deposit, Color::Blue),
            withdrawal: hex_color(&palette.withdrawal, Color::Red),
            hourly: hex_color(&palette.hourly, Color::Magenta),
            types: palette
                .types
                .iter()
                .map(|(label, hex)| (label.clone(), hex_color(hex, Color::Gray)))
                .collect(),
        }
    }

    pub fn type_color(&self, ty: &TransactionType) -> Color {
        self.types.get(ty.label()).copied().unwrap_or(Color::Gray)
    }

    pub fn amount_style(&self, amount: f64) -> Style {
        if amount < 0.0 {
            Style::new().fg(self.withdrawal)
        } else {
            Style::new().fg(self.deposit)
        }
    }

    /// Won amount as a colored span, keeping the sign in the text.
    pub fn won_span(&self, amount: f64) -> Span<'static> {
        Span::styled(won(amount), self.amount_style(amount))
    }
}

// ---------------------------------------------------------------------------
// Screen loop
// ---------------------------------------------------------------------------

pub enum ScreenAction {
    Continue,
    Close,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ScreenAction;
}

/// Run an interactive ratatui screen. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_screen(screen: &mut dyn Screen) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| screen.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match screen.handle_key(key.code) {
                    ScreenAction::Close => break Ok(()),
                    ScreenAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
