// StepWatch — SSD1306 OLED Driver
//
// Custom register-level driver over the shared I2C bus with a local
// 128x64 page-addressed framebuffer. Drawing goes through
// embedded-graphics; `flush()` streams the buffer to the panel.

use std::convert::Infallible;
use std::sync::Mutex;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_5X8, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};
use esp_idf_hal::i2c::I2cDriver;

use crate::config::*;
use crate::events::StepSnapshot;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

// SSD1306 control bytes: first byte of a write selects command or data.
const CTRL_COMMAND: u8 = 0x00;
const CTRL_DATA: u8 = 0x40;

pub struct OledDisplay {
    bus: SharedBus,
    buffer: [u8; DISPLAY_BUFFER_SIZE],
}

impl OledDisplay {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            buffer: [0u8; DISPLAY_BUFFER_SIZE],
        }
    }

    /// Panel power-up sequence (charge pump on, horizontal addressing).
    pub fn init(&mut self) -> anyhow::Result<()> {
        self.command(&[
            0xAE, // display off
            0xD5, 0x80, // clock divide
            0xA8, 0x3F, // multiplex 64
            0xD3, 0x00, // display offset
            0x40, // start line 0
            0x8D, 0x14, // charge pump on
            0x20, 0x00, // horizontal addressing
            0xA1, // segment remap
            0xC8, // COM scan direction
            0xDA, 0x12, // COM pins
            0x81, 0xCF, // contrast
            0xD9, 0xF1, // precharge
            0xDB, 0x40, // VCOMH level
            0xA4, // resume from RAM
            0xA6, // normal (non-inverted)
            0x2E, // scrolling off
            0xAF, // display on
        ])?;
        self.clear();
        self.flush()?;
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    /// Verify the panel answers on the I2C bus (NOP command probe).
    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_OLED, &[CTRL_COMMAND, 0xE3], I2C_TIMEOUT_TICKS)
            .is_ok()
    }

    // ---- screens ----------------------------------------------------------

    /// Boot splash shown while the rest of the system comes up.
    pub fn show_splash(&mut self) -> anyhow::Result<()> {
        self.clear();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_alignment("Step Counter", Point::new(64, 28), style, Alignment::Center)
            .draw(self)?;
        Text::with_alignment("Starting...", Point::new(64, 44), style, Alignment::Center)
            .draw(self)?;
        self.flush()
    }

    /// Shown when the accelerometer fails its boot self-test.
    pub fn show_wiring_error(&mut self) -> anyhow::Result<()> {
        self.clear();
        let title = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let small = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        Text::new("MPU-6050 Error!", Point::new(5, 18), title).draw(self)?;
        Text::new("Check wiring:", Point::new(5, 34), small).draw(self)?;
        Text::new("VCC->3.3V GND->GND", Point::new(5, 48), small).draw(self)?;
        Text::new("SCL->22 SDA->21", Point::new(5, 58), small).draw(self)?;
        self.flush()
    }

    /// Brief confirmation screen after WiFi association.
    pub fn show_wifi_connected(&mut self, ip: &str) -> anyhow::Result<()> {
        self.clear();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_alignment("WiFi Connected!", Point::new(64, 28), style, Alignment::Center)
            .draw(self)?;
        Text::with_alignment(ip, Point::new(64, 44), style, Alignment::Center).draw(self)?;
        self.flush()
    }

    /// Main screen: framed layout with the running count and device IP.
    pub fn show_steps(&mut self, snapshot: &StepSnapshot, ip: &str) -> anyhow::Result<()> {
        self.clear();

        let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
        Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT))
            .into_styled(stroke)
            .draw(self)?;
        Line::new(Point::new(5, 15), Point::new(123, 15))
            .into_styled(stroke)
            .draw(self)?;

        let title = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_alignment("Step Counter", Point::new(64, 11), title, Alignment::Center)
            .draw(self)?;

        let big = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        let count = snapshot.step_count.to_string();
        Text::with_alignment(&count, Point::new(64, 40), big, Alignment::Center).draw(self)?;

        Text::with_alignment("Steps", Point::new(64, 52), title, Alignment::Center).draw(self)?;

        let small = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        let footer = format!("IP: {}", ip);
        Text::new(&footer, Point::new(4, 61), small).draw(self)?;

        self.flush()
    }

    // ---- framebuffer plumbing ---------------------------------------------

    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Stream the framebuffer to the panel in one data write.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.command(&[
            0x21, 0x00, (SCREEN_WIDTH - 1) as u8, // column window
            0x22, 0x00, (SCREEN_HEIGHT / 8 - 1) as u8, // page window
        ])?;

        let mut payload = [0u8; DISPLAY_BUFFER_SIZE + 1];
        payload[0] = CTRL_DATA;
        payload[1..].copy_from_slice(&self.buffer);

        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_OLED, &payload, I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn command(&self, commands: &[u8]) -> anyhow::Result<()> {
        // One transaction: control byte, then a run of command bytes.
        let mut payload = [0u8; 32];
        payload[0] = CTRL_COMMAND;
        payload[1..=commands.len()].copy_from_slice(commands);

        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_OLED, &payload[..=commands.len()], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        let index = (x + (y / 8) * SCREEN_WIDTH) as usize;
        let mask = 1u8 << (y % 8);
        if on {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }
}

// The framebuffer is an embedded-graphics draw target; all screen layout
// above runs through this.
impl DrawTarget for OledDisplay {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if (0..SCREEN_WIDTH as i32).contains(&point.x)
                && (0..SCREEN_HEIGHT as i32).contains(&point.y)
            {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

impl OriginDimensions for OledDisplay {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}
