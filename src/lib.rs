//! ECHONET Lite home-energy device emulator.
//!
//! Emulated devices (smart meter, solar, battery, water heater, V2H, air
//! conditioner) answer ECHONET Lite requests over UDP and the Wi-SUN
//! B-route while a time-stepped simulation drives their measurements.

pub mod adapters;
pub mod config;
pub mod devices;
pub mod echonet;
pub mod sim;
pub mod transport_udp;
pub mod transport_wisun;

// Re-export common types for easier access
pub use config::Config;
pub use devices::{EmsState, SharedEms};
pub use echonet::{EchonetController, EchonetFrame, EchonetObject};
pub use sim::{SimulationEngine, SimulationService};
pub use transport_udp::UdpManager;
pub use transport_wisun::WiSunManager;
