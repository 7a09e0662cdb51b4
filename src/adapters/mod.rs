//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter          | Ports                                              |
//! |------------------|----------------------------------------------------|
//! | `BoardHardware`  | Meter, LevelSensor, ModeSelector, Relay, Indicator |
//! | `LogEventSink`   | EventSink                                          |
//! | `NvsAdapter`     | ConfigPort                                         |
//! | `Esp32Clock`     | Clock, DelayNs                                     |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
