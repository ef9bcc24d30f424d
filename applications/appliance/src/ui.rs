//! Drawing helpers shared by the menu and the applications

use pirate_core::{DisplaySink, FontSize, Point, Rgb, WrappingCursor};
use std::time::Duration;

/// Shorten `name` to at most `max` characters, marking the cut with ".."
pub fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let keep = max.saturating_sub(1);
    let mut short: String = name.chars().take(keep).collect();
    short.push_str("..");
    short
}

/// `m:ss`
pub fn format_clock(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Screen title with a rule underneath
pub fn draw_header(display: &mut dyn DisplaySink, title: &str, font: FontSize, color: Rgb) {
    let (width, _) = display.size();
    display.draw_text(Point::new(10, 5), title, font, color);
    display.fill_rect(Point::new(10, 30), width.saturating_sub(20), 1, color);
}

/// Layout of a scrolling list
#[derive(Debug, Clone, Copy)]
pub struct ListStyle {
    pub top: i32,
    pub row_height: u32,
    pub row_gap: u32,
    pub visible_rows: usize,
    pub max_chars: usize,
    pub font: FontSize,
    pub highlight: Rgb,
    pub selected_text: Rgb,
    pub text: Rgb,
}

/// Rows kept above the cursor while scrolling
const LEAD_ROWS: usize = 3;

/// Draw the window of `names` around `cursor`, the selected row highlighted
pub fn draw_list<S: AsRef<str>>(
    display: &mut dyn DisplaySink,
    names: &[S],
    cursor: &WrappingCursor,
    style: &ListStyle,
) {
    let (width, _) = display.size();
    let start = cursor.window_start(style.visible_rows, LEAD_ROWS);
    let mut y = style.top;

    for (index, name) in names.iter().enumerate().skip(start).take(style.visible_rows) {
        let selected = index == cursor.index();
        let marker = if selected { "> " } else { "  " };
        let label = format!("{marker}{}", truncate(name.as_ref(), style.max_chars));
        let color = if selected {
            display.fill_rect(Point::new(0, y), width, style.row_height, style.highlight);
            style.selected_text
        } else {
            style.text
        };
        let text_y = y + (style.row_height.saturating_sub(style.font.line_height()) / 2) as i32;
        display.draw_text(Point::new(10, text_y), &label, style.font, color);
        y += (style.row_height + style.row_gap) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_names() {
        assert_eq!(truncate("Abbey Road", 18), "Abbey Road");
        assert_eq!(truncate("exactly-eighteen!!", 18), "exactly-eighteen!!");
    }

    #[test]
    fn truncate_marks_cut() {
        let short = truncate("The Dark Side of the Moon", 18);
        assert_eq!(short, "The Dark Side of ..");
        assert_eq!(short.chars().count(), 19);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("ÄÖÜäöü", 4), "ÄÖÜ..");
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(Duration::from_secs(0)), "0:00");
        assert_eq!(format_clock(Duration::from_millis(65_900)), "1:05");
        assert_eq!(format_clock(Duration::from_secs(3600)), "60:00");
    }
}
