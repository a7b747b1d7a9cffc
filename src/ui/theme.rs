//! cliclack colors for specify prompts

use cliclack::ThemeState;
use console::Style;

/// Cyan while a prompt is active, green once answered
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecifyTheme;

impl SpecifyTheme {
    fn color(state: &ThemeState, answered: Style) -> Style {
        match state {
            ThemeState::Active => Style::new().cyan(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => answered,
        }
    }
}

impl cliclack::Theme for SpecifyTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        Self::color(state, Style::new().cyan().dim())
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        Self::color(state, Style::new().green())
    }
}

/// Install the theme before the first prompt or log line
pub fn init_theme() {
    cliclack::set_theme(SpecifyTheme);
}
