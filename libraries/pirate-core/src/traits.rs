//! Hardware contracts
//!
//! The launcher and applications only ever talk to the hardware through these
//! traits. Concrete implementations live in `pirate-input`, `pirate-display`
//! and the appliance crate; tests substitute scripted doubles.

use crate::error::Result;
use crate::types::{Bitmap, ButtonEvent, FontSize, Point, PowerAction, Rgb};

/// Source of debounced button events
pub trait InputSource {
    /// Events since the previous call, in physical transition order
    ///
    /// Called once per frame. Must not block.
    fn poll(&mut self) -> Vec<ButtonEvent>;
}

/// Fixed-size raster target
///
/// Drawing calls only touch an off-screen buffer; nothing is visible until
/// [`DisplaySink::present`] is called.
pub trait DisplaySink {
    /// Screen size in pixels (width, height)
    fn size(&self) -> (u32, u32);

    /// Fill the whole screen with `color`
    fn clear(&mut self, color: Rgb);

    /// Draw `text` with its top-left corner at `pos`
    fn draw_text(&mut self, pos: Point, text: &str, font: FontSize, color: Rgb);

    /// Fill an axis-aligned rectangle
    fn fill_rect(&mut self, pos: Point, width: u32, height: u32, color: Rgb);

    /// Copy `bitmap` with its top-left corner at `pos`, clipped to the screen
    fn draw_image(&mut self, pos: Point, bitmap: &Bitmap);

    /// Turn the backlight on or off
    fn set_backlight(&mut self, on: bool) -> Result<()>;

    /// Make everything drawn since the last present visible
    fn present(&mut self) -> Result<()>;

    /// Draw `text` horizontally centered on the screen at height `y`
    fn draw_text_centered(&mut self, y: i32, text: &str, font: FontSize, color: Rgb) {
        let (width, _) = self.size();
        let x = (width as i32 - font.text_width(text) as i32) / 2;
        self.draw_text(Point::new(x, y), text, font, color);
    }
}

/// System power collaborator
pub trait PowerControl {
    /// Carry out a reboot or shutdown
    ///
    /// Returns once the request was handed to the system. The process is
    /// expected to be terminated by the OS shortly after.
    fn execute(&mut self, action: PowerAction) -> Result<()>;
}
