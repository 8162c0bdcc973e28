use crate::devices::SharedEms;
use crate::echonet::EchonetObject;

use super::{be_u16, be_u32, clamp_u16, clamp_u32, common_property, DeviceIdentity, STATUS_OFF, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[
    0x80, 0x83, 0x84, 0x85, 0x88, 0x8A, 0x8F, 0x9D, 0x9E, 0x9F, 0xA0, 0xB0, 0xB3,
];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0x88, 0xB0];

/* Wire caps specific to this class */
const MAX_INSTANT_POWER_W: u16 = 65533;
const MAX_CUMULATIVE_WH: u32 = 0xFFFF_FFFE;

/// Home air conditioner (0x0130). Every settable field validates the
/// incoming byte against the enumerated values the class allows.
pub struct AirConditionerAdapter {
    state: SharedEms,
    identity: DeviceIdentity,
}

impl AirConditionerAdapter {
    pub fn new(state: SharedEms, identity: DeviceIdentity) -> Self {
        return AirConditionerAdapter { state, identity };
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        let ems = self.state.lock().unwrap();
        let ac = &ems.air_conditioner;
        match epc {
            0x80 => Some(vec![if ac.is_running { STATUS_ON } else { STATUS_OFF }]),
            0x84 => Some(be_u16(clamp_u16(ac.instant_power_w, MAX_INSTANT_POWER_W))),
            0x85 => Some(be_u32(clamp_u32(ac.cumulative_energy_wh, MAX_CUMULATIVE_WH))),
            0x8F => Some(vec![ac.power_saving]),
            0xA0 => Some(vec![ac.fan_speed]),
            0xB0 => Some(vec![ac.mode]),
            0xB3 => Some(vec![ac.target_temperature]),
            _ => None,
        }
    }
}

impl EchonetObject for AirConditionerAdapter {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>> {
        return self
            .dynamic_property(epc)
            .or_else(|| common_property(epc, &self.identity, GETTABLE_EPCS, ANNOUNCE_EPCS));
    }

    fn set_property(&self, epc: u8, edt: &[u8]) -> bool {
        if edt.len() != 1 {
            return false;
        }
        let value = edt[0];
        let mut ems = self.state.lock().unwrap();
        let ac = &mut ems.air_conditioner;
        match epc {
            0x80 => match value {
                STATUS_ON => ac.is_running = true,
                STATUS_OFF => ac.is_running = false,
                _ => return false,
            },
            0x8F => match value {
                0x41 | 0x42 => ac.power_saving = value,
                _ => return false,
            },
            /* 0x41 automatic, 0x31..0x38 fixed steps */
            0xA0 => match value {
                0x41 | 0x31..=0x38 => ac.fan_speed = value,
                _ => return false,
            },
            /* auto/cool/heat/dehumidify/fan/other */
            0xB0 => match value {
                0x40..=0x45 => ac.mode = value,
                _ => return false,
            },
            /* Target temperature, 0..50 degrees */
            0xB3 => match value {
                0x00..=0x32 => ac.target_temperature = value,
                _ => return false,
            },
            _ => return false,
        }
        return true;
    }
}
