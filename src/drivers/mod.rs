//! Actuator drivers, hardware initialisation, and the indicator pattern engine.

pub mod hw_init;
pub mod led_patterns;
pub mod relay;
pub mod status_led;
