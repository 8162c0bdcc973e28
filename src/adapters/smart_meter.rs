use crate::devices::SharedEms;
use crate::echonet::EchonetObject;

use super::{be_i32, be_u32, clamp_i32, clamp_u32, common_property, smart_meter_defs, DeviceIdentity, STATUS_OFF, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E,
    0x8F, 0x93, 0x97, 0x98, 0x99, 0x9A, 0x9D, 0x9E, 0x9F, 0xD3, 0xD7, 0xE0, 0xE1, 0xE2, 0xE3,
    0xE4, 0xE5, 0xE7, 0xE8, 0xEA, 0xEB, 0xEC, 0xED,
];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0x88];

/// Low-voltage smart meter (0x0288), served over the B-route. Live grid
/// measurements come from the simulation; everything else passes through
/// the captured device table.
pub struct SmartMeterAdapter {
    state: SharedEms,
    identity: DeviceIdentity,
}

impl SmartMeterAdapter {
    pub fn new(state: SharedEms, identity: DeviceIdentity) -> Self {
        return SmartMeterAdapter { state, identity };
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        let ems = self.state.lock().unwrap();
        let meter = &ems.smart_meter;
        match epc {
            0x80 => Some(vec![if meter.is_running { STATUS_ON } else { STATUS_OFF }]),
            /* Instantaneous power, positive while buying */
            0xE7 => Some(be_i32(clamp_i32(meter.instant_current_power))),
            /* Cumulative energy in Wh on the wire */
            0xE0 => Some(be_u32(clamp_u32(
                meter.cumulative_power_buy_kwh * 1000.0,
                u32::MAX,
            ))),
            0xE3 => Some(be_u32(clamp_u32(
                meter.cumulative_power_sell_kwh * 1000.0,
                u32::MAX,
            ))),
            _ => None,
        }
    }
}

impl EchonetObject for SmartMeterAdapter {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>> {
        return self
            .dynamic_property(epc)
            .or_else(|| smart_meter_defs::static_property(epc))
            .or_else(|| common_property(epc, &self.identity, GETTABLE_EPCS, ANNOUNCE_EPCS));
    }

    fn set_property(&self, _epc: u8, _edt: &[u8]) -> bool {
        /* The meter exposes measurements only */
        return false;
    }
}
