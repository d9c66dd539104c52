//! Board pin map and bus constants (ESP32 DevKit wiring).

/// Boot button, active low, internal pull-up. Toggles the display.
pub const BUTTON_GPIO: i32 = 0;

// ── I2C bus 0: BME680 + SCD41 + SSD1306 ──────────────────────

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;

pub const BME680_I2C_ADDR: u8 = 0x77;
pub const SCD41_I2C_ADDR: u8 = 0x62;
pub const SSD1306_I2C_ADDR: u8 = 0x3C;

// ── UART 2: PMS7003 particulate sensor ───────────────────────

pub const PMS7003_RX_GPIO: i32 = 16;
pub const PMS7003_TX_GPIO: i32 = 17;
pub const PMS7003_BAUD: u32 = 9600;
