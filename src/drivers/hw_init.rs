//! One-shot hardware peripheral initialization.
//!
//! Configures the shared I2C bus (BME680, SCD41, SSD1306), the PMS7003
//! UART, and the button GPIO interrupt using raw ESP-IDF sys calls.
//! Called once from `main()` before the tick loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    I2cInitFailed(i32),
    UartInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
            Self::UartInitFailed(rc) => write!(f, "UART init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
const I2C_PORT: i32 = 0;
#[cfg(target_os = "espidf")]
const UART_PORT: u32 = 2;
#[cfg(target_os = "espidf")]
const I2C_TIMEOUT_TICKS: u32 = 100;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick loop; single-threaded.
    unsafe {
        init_i2c()?;
        init_uart()?;
        init_button_gpio()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── I2C master ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        sda_pullup_en: true,
        scl_pullup_en: true,
        __bindgen_anon_1: i2c_config_t__bindgen_ty_1 {
            master: i2c_config_t__bindgen_ty_1__bindgen_ty_1 {
                clk_speed: pins::I2C_FREQ_HZ,
            },
        },
        ..Default::default()
    };
    let ret = unsafe { i2c_param_config(I2C_PORT, &cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::I2cInitFailed(ret));
    }
    let ret = unsafe { i2c_driver_install(I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::I2cInitFailed(ret));
    }
    info!("hw_init: I2C0 master configured (SDA={}, SCL={})",
        pins::I2C_SDA_GPIO, pins::I2C_SCL_GPIO);
    Ok(())
}

/// Write `wbuf` to a device, then read `rbuf.len()` bytes back.
/// Returns false on any bus error (caller maps to its own error type).
#[cfg(target_os = "espidf")]
pub fn i2c_write_read(addr: u8, wbuf: &[u8], rbuf: &mut [u8]) -> bool {
    // SAFETY: driver installed once in init_i2c(); main-loop access only.
    let ret = unsafe {
        i2c_master_write_read_device(
            I2C_PORT,
            addr,
            wbuf.as_ptr(),
            wbuf.len(),
            rbuf.as_mut_ptr(),
            rbuf.len(),
            I2C_TIMEOUT_TICKS,
        )
    };
    ret == ESP_OK as i32
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_write_read(_addr: u8, _wbuf: &[u8], rbuf: &mut [u8]) -> bool {
    rbuf.fill(0);
    false
}

/// Write-only transaction (commands, register setup).
#[cfg(target_os = "espidf")]
pub fn i2c_write(addr: u8, wbuf: &[u8]) -> bool {
    // SAFETY: same contract as i2c_write_read.
    let ret = unsafe {
        i2c_master_write_to_device(
            I2C_PORT,
            addr,
            wbuf.as_ptr(),
            wbuf.len(),
            I2C_TIMEOUT_TICKS,
        )
    };
    ret == ESP_OK as i32
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_write(_addr: u8, _wbuf: &[u8]) -> bool {
    false
}

// ── UART (PMS7003) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::PMS7003_BAUD as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    let ret = unsafe { uart_param_config(UART_PORT, &cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    let ret = unsafe {
        uart_set_pin(
            UART_PORT,
            pins::PMS7003_TX_GPIO,
            pins::PMS7003_RX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        )
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    // RX buffer sized for a handful of 32-byte frames.
    let ret = unsafe {
        uart_driver_install(UART_PORT, 256, 0, 0, core::ptr::null_mut(), 0)
    };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::UartInitFailed(ret));
    }
    info!("hw_init: UART2 configured for PMS7003 (RX={}, {} baud)",
        pins::PMS7003_RX_GPIO, pins::PMS7003_BAUD);
    Ok(())
}

/// Non-blocking drain of pending UART bytes into `buf`; returns the
/// number of bytes read.
#[cfg(target_os = "espidf")]
pub fn uart_read(buf: &mut [u8]) -> usize {
    // SAFETY: driver installed once in init_uart(); main-loop access only.
    let n = unsafe {
        uart_read_bytes(
            UART_PORT,
            buf.as_mut_ptr().cast::<core::ffi::c_void>(),
            buf.len() as u32,
            0,
        )
    };
    if n < 0 { 0 } else { n as usize }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_read(_buf: &mut [u8]) -> usize {
    0
}

/// Blocking write of a command frame to the sensor.
#[cfg(target_os = "espidf")]
pub fn uart_write(buf: &[u8]) -> bool {
    // SAFETY: same contract as uart_read.
    let n = unsafe {
        uart_write_bytes(UART_PORT, buf.as_ptr().cast::<core::ffi::c_void>(), buf.len())
    };
    n == buf.len() as i32
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_write(_buf: &[u8]) -> bool {
    false
}

// ── Button GPIO + ISR service ─────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_button_gpio() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BUTTON_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(_arg: *mut core::ffi::c_void) {
    crate::drivers::button::button_isr_handler();
}

/// Install the GPIO ISR service and register the button handler.
/// Call after init_peripherals() and before the tick loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The handler registered
    // below only stores into a lock-free atomic latch.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_isr_handler_add(pins::BUTTON_GPIO, Some(button_gpio_isr), core::ptr::null_mut());
        gpio_intr_enable(pins::BUTTON_GPIO);
        info!("hw_init: ISR service installed (button GPIO{})", pins::BUTTON_GPIO);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
