//! `DisplaySink` over a back buffer and a panel

use crate::framebuffer::{to_rgb565, FrameBuffer};
use crate::panel::Panel;
use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_6X13, FONT_9X15};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::prelude::{DrawTarget, Drawable, Pixel, Primitive, Size};
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use pirate_core::{Bitmap, DisplaySink, FontSize, Point, Rgb};

type EgPoint = embedded_graphics::prelude::Point;

fn font(size: FontSize) -> &'static MonoFont<'static> {
    match size {
        FontSize::Small => &FONT_6X13,
        FontSize::Medium => &FONT_9X15,
        FontSize::Large => &FONT_10X20,
    }
}

fn eg_point(pos: Point) -> EgPoint {
    EgPoint::new(pos.x, pos.y)
}

/// Double-buffered display
///
/// Drawing goes to the back buffer; `present` flushes it to the panel.
pub struct BufferedDisplay<P: Panel> {
    panel: P,
    back: FrameBuffer,
    frames_presented: u64,
}

impl<P: Panel> BufferedDisplay<P> {
    pub fn new(panel: P, width: u32, height: u32) -> Self {
        Self {
            panel,
            back: FrameBuffer::new(width, height),
            frames_presented: 0,
        }
    }

    /// Back buffer (what the next `present` will show)
    pub fn frame(&self) -> &FrameBuffer {
        &self.back
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl<P: Panel> DisplaySink for BufferedDisplay<P> {
    fn size(&self) -> (u32, u32) {
        (self.back.width(), self.back.height())
    }

    fn clear(&mut self, color: Rgb) {
        let _ = self.back.clear(to_rgb565(color));
    }

    fn draw_text(&mut self, pos: Point, text: &str, size: FontSize, color: Rgb) {
        let style = MonoTextStyle::new(font(size), to_rgb565(color));
        let _ = Text::with_baseline(text, eg_point(pos), style, Baseline::Top).draw(&mut self.back);
    }

    fn fill_rect(&mut self, pos: Point, width: u32, height: u32, color: Rgb) {
        let _ = Rectangle::new(eg_point(pos), Size::new(width, height))
            .into_styled(PrimitiveStyle::with_fill(to_rgb565(color)))
            .draw(&mut self.back);
    }

    fn draw_image(&mut self, pos: Point, bitmap: &Bitmap) {
        let width = bitmap.width().max(1) as usize;
        let pixels = bitmap.pixels().iter().enumerate().map(|(i, &color)| {
            let x = pos.x + (i % width) as i32;
            let y = pos.y + (i / width) as i32;
            Pixel(EgPoint::new(x, y), to_rgb565(color))
        });
        let _ = self.back.draw_iter(pixels);
    }

    fn set_backlight(&mut self, on: bool) -> pirate_core::Result<()> {
        self.panel.set_backlight(on)?;
        Ok(())
    }

    fn present(&mut self) -> pirate_core::Result<()> {
        self.panel.flush(&self.back)?;
        self.frames_presented += 1;
        Ok(())
    }
}
