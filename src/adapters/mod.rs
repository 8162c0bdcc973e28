pub mod air_conditioner;
pub mod battery;
pub mod node_profile;
pub mod smart_meter;
pub mod smart_meter_defs;
pub mod solar;
pub mod v2h;
pub mod water_heater;

pub use air_conditioner::AirConditionerAdapter;
pub use battery::BatteryAdapter;
pub use node_profile::NodeProfileAdapter;
pub use smart_meter::SmartMeterAdapter;
pub use solar::SolarAdapter;
pub use v2h::V2hAdapter;
pub use water_heater::WaterHeaterAdapter;

use log::warn;

use crate::echonet::property_map::encode_property_map;

/* EDT values shared by every device class */
pub const STATUS_ON: u8 = 0x30;
pub const STATUS_OFF: u8 = 0x31;
pub const NO_FAULT: u8 = 0x42;

/// Fixed identification data each adapter carries, parsed once from the
/// configuration.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub identification: Vec<u8>,
    pub manufacturer_code: u32,
}

impl DeviceIdentity {
    pub fn new(identification_hex: &str, manufacturer_code: u32) -> Self {
        let identification = match hex::decode(identification_hex) {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                if !identification_hex.is_empty() {
                    warn!("Unparseable identification '{identification_hex}', using zero id");
                }
                vec![0u8; 17]
            }
        };
        return DeviceIdentity {
            identification,
            manufacturer_code,
        };
    }
}

/// Properties every device class answers the same way. Adapters consult
/// this last: dynamic values first, then the per-device static table,
/// then this fallback.
pub(crate) fn common_property(
    epc: u8,
    identity: &DeviceIdentity,
    gettable_epcs: &[u8],
    announce_epcs: &[u8],
) -> Option<Vec<u8>> {
    match epc {
        0x88 => Some(vec![NO_FAULT]),
        0x8A => {
            let code = identity.manufacturer_code;
            Some(vec![(code >> 16) as u8, (code >> 8) as u8, code as u8])
        }
        0x83 => Some(identity.identification.clone()),
        0x9D => Some(encode_property_map(announce_epcs)),
        /* Only operation status is settable through the common surface */
        0x9E => Some(encode_property_map(&[0x80])),
        0x9F => Some(encode_property_map(gettable_epcs)),
        _ => None,
    }
}

/* Big-endian packing helpers for property EDT fields */

pub(crate) fn be_u16(v: u16) -> Vec<u8> {
    return v.to_be_bytes().to_vec();
}

pub(crate) fn be_u32(v: u32) -> Vec<u8> {
    return v.to_be_bytes().to_vec();
}

pub(crate) fn be_i32(v: i32) -> Vec<u8> {
    return v.to_be_bytes().to_vec();
}

/// Clamp a measurement into an unsigned 16-bit field with a device cap.
pub(crate) fn clamp_u16(v: f64, max: u16) -> u16 {
    if v <= 0.0 {
        return 0;
    }
    if v >= max as f64 {
        return max;
    }
    return v as u16;
}

/// Clamp a counter into an unsigned 32-bit field with a device cap.
pub(crate) fn clamp_u32(v: f64, max: u32) -> u32 {
    if v <= 0.0 {
        return 0;
    }
    if v >= max as f64 {
        return max;
    }
    return v as u32;
}

pub(crate) fn clamp_i32(v: f64) -> i32 {
    if v >= i32::MAX as f64 {
        return i32::MAX;
    }
    if v <= i32::MIN as f64 {
        return i32::MIN;
    }
    return v as i32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_from_hex() {
        let id = DeviceIdentity::new("fe00007e0000000000000000000000000001", 0x00007E);
        assert_eq!(id.identification.len(), 18);
        assert_eq!(id.identification[0], 0xFE);
    }

    #[test]
    fn identity_falls_back_to_zeroes() {
        for bad in ["", "zz", "abc"] {
            let id = DeviceIdentity::new(bad, 0x00007E);
            assert_eq!(id.identification, vec![0u8; 17]);
        }
    }

    #[test]
    fn common_fault_and_manufacturer() {
        let id = DeviceIdentity::new("", 0x123456);
        assert_eq!(common_property(0x88, &id, &[], &[]), Some(vec![0x42]));
        assert_eq!(
            common_property(0x8A, &id, &[], &[]),
            Some(vec![0x12, 0x34, 0x56])
        );
    }

    #[test]
    fn common_maps_are_codec_derived() {
        let id = DeviceIdentity::new("", 0);
        let gettable = [0x80, 0x9F, 0xE7];
        assert_eq!(
            common_property(0x9F, &id, &gettable, &[0x80, 0x88]),
            Some(vec![3, 0x80, 0x9F, 0xE7])
        );
        assert_eq!(
            common_property(0x9E, &id, &gettable, &[0x80, 0x88]),
            Some(vec![1, 0x80])
        );
        assert_eq!(
            common_property(0x9D, &id, &gettable, &[0x80, 0x88]),
            Some(vec![2, 0x80, 0x88])
        );
    }

    #[test]
    fn clamps() {
        assert_eq!(clamp_u16(70000.0, 65535), 65535);
        assert_eq!(clamp_u16(-5.0, 65535), 0);
        assert_eq!(clamp_u32(5e12, u32::MAX), u32::MAX);
        assert_eq!(clamp_i32(-250.4), -250);
    }
}
