//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements          | Connects to               |
//! |------------------|---------------------|---------------------------|
//! | `config_file`    | ConfigPort          | JSON file on disk         |
//! | `console_logger` | log::Log            | stderr                    |
//! | `hal_pin`        | (PinLevel source)   | embedded-hal digital pins |
//! | `log_sink`       | EventSink           | `log` facade              |
//! | `sim`            | BoatHardware        | Kinematic boat model      |
//! | `store`          | StoragePort         | HashMap / files on disk   |
//! | `time`           | Clock, DelayNs      | std monotonic clock       |

pub mod config_file;
pub mod console_logger;
pub mod hal_pin;
pub mod log_sink;
pub mod sim;
pub mod store;
pub mod time;
