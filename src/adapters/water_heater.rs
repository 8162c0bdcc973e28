use crate::devices::SharedEms;
use crate::echonet::EchonetObject;

use super::{be_u16, clamp_u16, common_property, DeviceIdentity, STATUS_OFF, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[
    0x80, 0x83, 0x88, 0x8A, 0x9D, 0x9E, 0x9F, 0xB0, 0xB2, 0xC0, 0xE1, 0xE2, 0xE3,
];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0x88];

const HEATING: u8 = 0x41;
const NOT_HEATING: u8 = 0x42;

/// Electric water heater (0x026B). The automatic-heating setting (0xB0)
/// drives the tank fill/decay machine inside the engine; the adapter only
/// stores the commanded value.
pub struct WaterHeaterAdapter {
    state: SharedEms,
    identity: DeviceIdentity,
}

impl WaterHeaterAdapter {
    pub fn new(state: SharedEms, identity: DeviceIdentity) -> Self {
        return WaterHeaterAdapter { state, identity };
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        let ems = self.state.lock().unwrap();
        let wh = &ems.water_heater;
        match epc {
            0x80 => Some(vec![if wh.is_running { STATUS_ON } else { STATUS_OFF }]),
            0xB0 => Some(vec![wh.auto_setting]),
            0xB2 => Some(vec![if wh.is_heating { HEATING } else { NOT_HEATING }]),
            0xC0 => Some(vec![wh.daytime_reheating]),
            0xE1 => Some(be_u16(clamp_u16(wh.remaining_hot_water, u16::MAX))),
            0xE2 => Some(be_u16(clamp_u16(wh.tank_capacity, u16::MAX))),
            0xE3 => Some(vec![wh.bath_auto_setting]),
            _ => None,
        }
    }
}

impl EchonetObject for WaterHeaterAdapter {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>> {
        return self
            .dynamic_property(epc)
            .or_else(|| common_property(epc, &self.identity, GETTABLE_EPCS, ANNOUNCE_EPCS));
    }

    fn set_property(&self, epc: u8, edt: &[u8]) -> bool {
        if edt.len() != 1 {
            return false;
        }
        let mut ems = self.state.lock().unwrap();
        let wh = &mut ems.water_heater;
        match epc {
            0x80 => match edt[0] {
                STATUS_ON => wh.is_running = true,
                STATUS_OFF => wh.is_running = false,
                _ => return false,
            },
            /* 0x41 automatic / 0x42 manual heating / 0x43 manual stop */
            0xB0 => match edt[0] {
                0x41 | 0x42 | 0x43 => wh.auto_setting = edt[0],
                _ => return false,
            },
            0xC0 => match edt[0] {
                0x41 | 0x42 => wh.daytime_reheating = edt[0],
                _ => return false,
            },
            0xE3 => match edt[0] {
                0x41 | 0x42 => wh.bath_auto_setting = edt[0],
                _ => return false,
            },
            _ => return false,
        }
        return true;
    }
}
