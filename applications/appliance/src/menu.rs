//! Main menu entries and drawing

use pirate_core::{AppId, DisplaySink, FontSize, Point, PowerAction, Rgb, WrappingCursor};

const TITLE: &str = "PIRATE OS";
const FIRST_ROW_Y: i32 = 80;
const ROW_PITCH: i32 = 45;

/// What selecting a menu entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    LaunchApp(AppId),
    Reboot,
    Shutdown,
}

impl MenuAction {
    /// The power action behind this entry, if any
    pub fn power(self) -> Option<PowerAction> {
        match self {
            MenuAction::LaunchApp(_) => None,
            MenuAction::Reboot => Some(PowerAction::Reboot),
            MenuAction::Shutdown => Some(PowerAction::Shutdown),
        }
    }
}

/// One row of the main menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
}

impl MenuEntry {
    pub fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    pub fn launch(id: AppId) -> Self {
        Self::new(id.label(), MenuAction::LaunchApp(id))
    }
}

/// Music Player, Synthesizer, Reboot, Shutdown
pub fn default_entries() -> Vec<MenuEntry> {
    vec![
        MenuEntry::launch(AppId::MusicPlayer),
        MenuEntry::launch(AppId::Synth),
        MenuEntry::new("Reboot", MenuAction::Reboot),
        MenuEntry::new("Shutdown", MenuAction::Shutdown),
    ]
}

/// Draw the menu with the entry under `cursor` inverted
pub fn draw_menu(display: &mut dyn DisplaySink, entries: &[MenuEntry], cursor: &WrappingCursor) {
    let (width, _) = display.size();

    display.clear(Rgb::BLACK);
    display.draw_text(Point::new(30, 20), TITLE, FontSize::Large, Rgb::MAGENTA);
    display.fill_rect(Point::new(30, 59), width.saturating_sub(60), 2, Rgb::MAGENTA);

    for (index, entry) in entries.iter().enumerate() {
        let y = FIRST_ROW_Y + ROW_PITCH * index as i32;
        let text_color = if index == cursor.index() {
            display.fill_rect(Point::new(15, y - 5), width.saturating_sub(30), 35, Rgb::MAGENTA);
            Rgb::BLACK
        } else {
            Rgb::MAGENTA
        };
        display.draw_text(
            Point::new(30, y + 5),
            &format!("> {}", entry.label),
            FontSize::Medium,
            text_color,
        );
    }
}

/// Full-screen power banner
pub fn draw_power_banner(display: &mut dyn DisplaySink, action: PowerAction) {
    let color = match action {
        PowerAction::Reboot => Rgb::ORANGE,
        PowerAction::Shutdown => Rgb::RED,
    };
    display.clear(Rgb::BLACK);
    display.draw_text_centered(110, action.banner(), FontSize::Medium, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_menu_order() {
        let actions: Vec<_> = default_entries().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                MenuAction::LaunchApp(AppId::MusicPlayer),
                MenuAction::LaunchApp(AppId::Synth),
                MenuAction::Reboot,
                MenuAction::Shutdown,
            ]
        );
    }

    #[test]
    fn labels_follow_app_names() {
        let labels: Vec<_> = default_entries().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["Music Player", "Synthesizer", "Reboot", "Shutdown"]);
    }

    #[test]
    fn only_power_entries_have_power_actions() {
        assert_eq!(MenuAction::LaunchApp(AppId::Synth).power(), None);
        assert_eq!(MenuAction::Reboot.power(), Some(PowerAction::Reboot));
        assert_eq!(MenuAction::Shutdown.power(), Some(PowerAction::Shutdown));
    }
}
