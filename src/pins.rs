//! GPIO / peripheral pin assignments for the SafeX helmet board.
//!
//! Single source of truth for the wiring.  `main` takes the matching
//! `esp-idf-hal` pins; keep the two in step when the board changes.

// ---------------------------------------------------------------------------
// I²C sensor bus (MPU-6050 @ 0x68, MAX30102 @ 0x57)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Both parts support fast mode.
pub const I2C_BAUD_HZ: u32 = 400_000;
/// Per-transaction timeout; a stuck bus becomes a read failure.
pub const I2C_TIMEOUT_MS: u32 = 10;

// ---------------------------------------------------------------------------
// GPS receiver (UART1, NMEA 9600 8N1)
// ---------------------------------------------------------------------------

pub const GPS_UART_TX_GPIO: i32 = 17;
pub const GPS_UART_RX_GPIO: i32 = 18;
pub const GPS_BAUD: u32 = 9_600;

// ---------------------------------------------------------------------------
// Bluetooth module (UART2) to the paired phone
// ---------------------------------------------------------------------------

pub const BT_UART_TX_GPIO: i32 = 4;
pub const BT_UART_RX_GPIO: i32 = 5;
pub const BT_BAUD: u32 = 115_200;
/// Module STATE output: HIGH while a peer is connected.
pub const BT_STATE_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Inputs (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary SOS push-button on the helmet shell.
pub const SOS_BUTTON_GPIO: i32 = 10;
/// Chin-strap buckle / crown pressure switch. LOW = worn.
pub const WORN_SWITCH_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Engine-enable relay (active HIGH, pulled low at reset).
pub const ENGINE_RELAY_GPIO: i32 = 12;
/// Status LED (active HIGH).
pub const STATUS_LED_GPIO: i32 = 13;
