//! SSD1306 OLED adapter (128x64, I2C).
//!
//! Implements [`DisplayPort`]. Rendering is plain 5x7 text, one
//! snapshot field per line, matching the layout the device has always
//! shown:
//!
//! ```text
//! Temp: 72.5 F
//! Humidity: 40.0 %
//! CO2: 750 ppm
//! PM: 4/9/15 ug/m3
//! AQI: 42
//! Gas: 220000 ohm
//! ```
//!
//! On the host, `paint` records the rendered lines for test inspection.

use log::{info, warn};

use crate::app::ports::DisplayPort;
use crate::app::snapshot::SensorSnapshot;
use crate::error::CommsError;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
#[cfg(target_os = "espidf")]
const PAGES: usize = HEIGHT / 8;
#[cfg(target_os = "espidf")]
const FB_LEN: usize = WIDTH * PAGES;

/// Format the snapshot into display lines. Shared by both targets so
/// host tests see exactly what the panel would.
pub fn format_lines(snapshot: &SensorSnapshot) -> [String; 6] {
    [
        format!("Temp: {:.1} F", snapshot.temperature_f),
        format!("Humidity: {:.1} %", snapshot.humidity_pct),
        format!("CO2: {} ppm", snapshot.co2_ppm),
        format!("PM: {}/{}/{} ug/m3", snapshot.pm1_0, snapshot.pm2_5, snapshot.pm10),
        format!("AQI: {}", snapshot.aqi),
        format!("Gas: {:.0} ohm", snapshot.gas_resistance_ohm),
    ]
}

pub struct OledAdapter {
    initialised: bool,
    #[cfg(target_os = "espidf")]
    framebuffer: [u8; FB_LEN],
    #[cfg(not(target_os = "espidf"))]
    sim_last_frame: Option<Vec<String>>,
    #[cfg(not(target_os = "espidf"))]
    sim_paint_count: u32,
}

impl Default for OledAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OledAdapter {
    pub fn new() -> Self {
        Self {
            initialised: false,
            #[cfg(target_os = "espidf")]
            framebuffer: [0; FB_LEN],
            #[cfg(not(target_os = "espidf"))]
            sim_last_frame: None,
            #[cfg(not(target_os = "espidf"))]
            sim_paint_count: 0,
        }
    }

    /// Last painted frame; `None` after a blank paint (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn last_frame(&self) -> Option<&[String]> {
        self.sim_last_frame.as_deref()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn paint_count(&self) -> u32 {
        self.sim_paint_count
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_init(&mut self) -> Result<(), CommsError> {
        // Standard SSD1306 128x64 bring-up sequence.
        const INIT: &[u8] = &[
            0xAE, // display off
            0xD5, 0x80, // clock divide
            0xA8, 0x3F, // multiplex 64
            0xD3, 0x00, // display offset
            0x40, // start line 0
            0x8D, 0x14, // charge pump on
            0x20, 0x00, // horizontal addressing
            0xA1, 0xC8, // segment remap + COM scan direction
            0xDA, 0x12, // COM pins
            0x81, 0xCF, // contrast
            0xD9, 0xF1, // pre-charge
            0xDB, 0x40, // VCOM detect
            0xA4, // resume from RAM
            0xA6, // normal (non-inverted)
            0xAF, // display on
        ];
        for &cmd in INIT {
            if !hw_init::i2c_write(pins::SSD1306_I2C_ADDR, &[0x00, cmd]) {
                return Err(CommsError::NotConnected);
            }
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn flush(&mut self) -> bool {
        // Reset the addressing window, then stream the framebuffer.
        let ok = hw_init::i2c_write(pins::SSD1306_I2C_ADDR, &[0x00, 0x21, 0, 127])
            && hw_init::i2c_write(pins::SSD1306_I2C_ADDR, &[0x00, 0x22, 0, 7]);
        if !ok {
            return false;
        }
        let mut out = [0u8; FB_LEN + 1];
        out[0] = 0x40; // data control byte
        out[1..].copy_from_slice(&self.framebuffer);
        hw_init::i2c_write(pins::SSD1306_I2C_ADDR, &out)
    }

    #[cfg(target_os = "espidf")]
    fn render_text(&mut self, lines: &[String]) {
        self.framebuffer.fill(0);
        for (row, line) in lines.iter().take(PAGES).enumerate() {
            let mut col = 0;
            for ch in line.chars() {
                if col + 6 > WIDTH {
                    break;
                }
                let glyph = glyph_for(ch);
                for (i, &bits) in glyph.iter().enumerate() {
                    self.framebuffer[row * WIDTH + col + i] = bits;
                }
                col += 6; // 5 px glyph + 1 px spacing
            }
        }
    }
}

impl DisplayPort for OledAdapter {
    fn init(&mut self) -> Result<(), CommsError> {
        #[cfg(target_os = "espidf")]
        self.platform_init()?;
        self.initialised = true;
        info!("oled: SSD1306 initialised");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn paint(&mut self, snapshot: &SensorSnapshot, enabled: bool) {
        if !self.initialised {
            return;
        }
        if enabled {
            let lines = format_lines(snapshot);
            self.render_text(&lines);
        } else {
            self.framebuffer.fill(0);
        }
        if !self.flush() {
            warn!("oled: frame flush failed");
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn paint(&mut self, snapshot: &SensorSnapshot, enabled: bool) {
        if !self.initialised {
            warn!("oled(sim): paint before init ignored");
            return;
        }
        self.sim_paint_count += 1;
        self.sim_last_frame = if enabled {
            Some(format_lines(snapshot).to_vec())
        } else {
            None
        };
    }
}

/// 5x7 column-major glyphs for the printable ASCII the status lines
/// use. Unknown characters render as blanks.
#[cfg(target_os = "espidf")]
fn glyph_for(ch: char) -> [u8; 5] {
    match ch {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00],
        '%' => [0x23, 0x13, 0x08, 0x64, 0x62],
        '/' => [0x20, 0x10, 0x08, 0x04, 0x02],
        '.' => [0x00, 0x60, 0x60, 0x00, 0x00],
        ':' => [0x00, 0x36, 0x36, 0x00, 0x00],
        '0' => [0x3E, 0x51, 0x49, 0x45, 0x3E],
        '1' => [0x00, 0x42, 0x7F, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4B, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7F, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3C, 0x4A, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1E],
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3E, 0x41, 0x49, 0x49, 0x7A],
        'H' => [0x7F, 0x08, 0x08, 0x08, 0x7F],
        'I' => [0x00, 0x41, 0x7F, 0x41, 0x00],
        'M' => [0x7F, 0x02, 0x0C, 0x02, 0x7F],
        'O' => [0x3E, 0x41, 0x41, 0x41, 0x3E],
        'P' => [0x7F, 0x09, 0x09, 0x09, 0x06],
        'Q' => [0x3E, 0x41, 0x51, 0x21, 0x5E],
        'T' => [0x01, 0x01, 0x7F, 0x01, 0x01],
        'a' => [0x20, 0x54, 0x54, 0x54, 0x78],
        'd' => [0x38, 0x44, 0x44, 0x48, 0x7F],
        'e' => [0x38, 0x54, 0x54, 0x54, 0x18],
        'g' => [0x0C, 0x52, 0x52, 0x52, 0x3E],
        'h' => [0x7F, 0x08, 0x04, 0x04, 0x78],
        'i' => [0x00, 0x44, 0x7D, 0x40, 0x00],
        'l' => [0x00, 0x41, 0x7F, 0x40, 0x00],
        'm' => [0x7C, 0x04, 0x18, 0x04, 0x78],
        'n' => [0x7C, 0x08, 0x04, 0x04, 0x78],
        'o' => [0x38, 0x44, 0x44, 0x44, 0x38],
        'p' => [0x7C, 0x14, 0x14, 0x14, 0x08],
        's' => [0x48, 0x54, 0x54, 0x54, 0x20],
        't' => [0x04, 0x3F, 0x44, 0x40, 0x20],
        'u' => [0x3C, 0x40, 0x40, 0x20, 0x7C],
        'y' => [0x0C, 0x50, 0x50, 0x50, 0x3C],
        _ => [0x00, 0x00, 0x00, 0x00, 0x00],
    }
}
