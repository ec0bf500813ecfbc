//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter            | Implements          | Connects to                 |
//! |--------------------|---------------------|-----------------------------|
//! | `hardware`         | SensorPort          | MPU-6050, MAX30102, GPS,    |
//! |                    |                     | SOS button, worn switch     |
//! |                    | ActuatorPort        | Engine relay                |
//! |                    | IndicatorPort       | Status LED                  |
//! |                    | PromptPort          | Serial log                  |
//! | `serial_transport` | TransportPort       | Bluetooth UART module       |
//! | `log_sink`         | EventSink           | Serial log output           |
//! | `nvs`              | ConfigPort          | NVS / in-memory store       |
//! |                    | StoragePort         |                             |
//! | `time`             | Clock               | ESP32 system timer          |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial_transport;
pub mod time;
