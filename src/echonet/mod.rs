pub mod frame;
pub mod property_map;
pub mod controller;
pub mod consts;

pub use frame::{EchonetFrame, FrameError, ObjectKey};
pub use controller::{EchonetController, EchonetObject};
