//! SSD1306 OLED driver behind the [`Panel`] trait.

use defmt::warn;
use embedded_graphics::mono_font::ascii::FONT_5X8;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use crate::config::{DISPLAY_HEIGHT, DISPLAY_I2C_ADDR, DISPLAY_WIDTH};
use crate::error::Error;
use crate::ui::anim::{get_pixel, Frame};
use crate::ui::Panel;

/// Height of one text line in pixels.
const LINE_HEIGHT: i32 = 8;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_5X8)
        .text_color(BinaryColor::On)
        .build()
}

fn inverted_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_5X8)
        .text_color(BinaryColor::Off)
        .background_color(BinaryColor::On)
        .build()
}

pub struct OledPanel<I2C> {
    display: Display<I2C>,
    cursor: Point,
}

impl<I2C> OledPanel<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the panel, clear it and leave it switched off until a
    /// page opens.
    pub fn init(i2c: I2C) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, DISPLAY_I2C_ADDR);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        display.set_display_on(false).map_err(|_| Error::Display)?;
        Ok(Self {
            display,
            cursor: Point::zero(),
        })
    }

    fn draw_lines(&mut self, text: &str, style: MonoTextStyle<'static, BinaryColor>) {
        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if !line.is_empty() {
                let text = Text::with_baseline(line, self.cursor, style, Baseline::Top);
                if let Ok(next) = text.draw(&mut self.display) {
                    self.cursor = next;
                }
            }
            if lines.peek().is_some() {
                self.cursor = Point::new(0, self.cursor.y + LINE_HEIGHT);
            }
        }
    }
}

impl<I2C> Panel for OledPanel<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn clear(&mut self) {
        self.display.clear_buffer();
        self.cursor = Point::zero();
    }

    fn goto(&mut self, x: u8, line: u8) {
        self.cursor = Point::new(i32::from(x), i32::from(line) * LINE_HEIGHT);
    }

    fn put_text(&mut self, text: &str) {
        self.draw_lines(text, text_style());
    }

    fn put_text_inverted(&mut self, text: &str) {
        self.draw_lines(text, inverted_style());
    }

    fn put_bitmap(&mut self, frame: &Frame) {
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                self.display
                    .set_pixel(x as u32, y as u32, get_pixel(frame, x, y));
            }
        }
    }

    fn present(&mut self) {
        if self.display.flush().is_err() {
            warn!("display flush failed");
        }
    }

    fn set_power(&mut self, on: bool) {
        if self.display.set_display_on(on).is_err() {
            warn!("display power {} failed", on);
        }
    }
}
