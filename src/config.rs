// StepWatch — Hardware & System Configuration
// Target: ESP32 DevKit (MPU6050 + SSD1306 on the shared I2C bus)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_I2C_SDA: i32 = 21;
pub const PIN_I2C_SCL: i32 = 22;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024

// ---------------------------------------------------------------------------
// WiFi (station mode, compiled-in credentials)
// ---------------------------------------------------------------------------
pub const WIFI_SSID: &str = "WRITE_UR_SSID";
pub const WIFI_PASSWORD: &str = "WRITE_UR_PASS";
pub const WIFI_CONNECT_ATTEMPTS: u32 = 30;
pub const WIFI_RETRY_DELAY_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SAMPLER: usize = 4096;
pub const STACK_STEP: usize = 4096;
pub const STACK_DISPLAY: usize = 8192;

// ---------------------------------------------------------------------------
// Task Placement
// ---------------------------------------------------------------------------
// All pipeline tasks run on core 1; the WiFi/network stack stays on
// core 0. Sampling/detection preempts best-effort rendering.
pub const PRIORITY_PIPELINE: u8 = 6;
pub const PRIORITY_DISPLAY: u8 = 4;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SAMPLE_INTERVAL_MS: u64 = 10;     // 100 Hz accelerometer tick
pub const SAMPLE_RECV_TIMEOUT_MS: u64 = 50; // detector dequeue timeout
pub const STEP_IDLE_DELAY_MS: u64 = 10;     // detector housekeeping sleep
pub const DISPLAY_REFRESH_MS: u64 = 100;    // OLED refresh period

// ---------------------------------------------------------------------------
// Step Detection
// ---------------------------------------------------------------------------
pub const SAMPLE_QUEUE_DEPTH: usize = 10;   // bounded sample FIFO
pub const MAGNITUDE_WINDOW_LEN: usize = 15; // rolling baseline length
pub const STEP_THRESHOLD: f32 = 1.0;        // g above the rolling mean
pub const STEP_DEBOUNCE_MS: u32 = 300;      // minimum inter-step interval

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factor
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_16G: f32 = 2048.0; // LSB/g at ±16 g
