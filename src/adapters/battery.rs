use crate::devices::SharedEms;
use crate::echonet::EchonetObject;

use super::{be_i32, be_u32, clamp_i32, clamp_u32, common_property, DeviceIdentity, STATUS_OFF, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[
    0x80, 0x83, 0x88, 0x8A, 0x9D, 0x9E, 0x9F, 0xA4, 0xA5, 0xA8, 0xA9, 0xCF, 0xD0, 0xD3, 0xDA,
    0xE2, 0xE4,
];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0x88];

/* Operation mode EDT values (0xDA/0xCF) */
const MODE_RAPID_CHARGE: u8 = 0x41;
const MODE_CHARGE: u8 = 0x42;
const MODE_DISCHARGE: u8 = 0x43;
const MODE_STANDBY: u8 = 0x44;

/// Residential storage battery (0x027D). SOC and the cumulative counters
/// belong to the engine; mode commands only flip the charge/discharge flags
/// the engine integrates from.
pub struct BatteryAdapter {
    state: SharedEms,
    identity: DeviceIdentity,
}

impl BatteryAdapter {
    pub fn new(state: SharedEms, identity: DeviceIdentity) -> Self {
        return BatteryAdapter { state, identity };
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        let ems = self.state.lock().unwrap();
        let bat = &ems.battery;
        match epc {
            0x80 => Some(vec![if bat.is_running { STATUS_ON } else { STATUS_OFF }]),
            /* Chargeable / dischargeable energy from the current fill */
            0xA4 => Some(be_u32(clamp_u32(
                bat.rated_capacity_wh - bat.stored_wh(),
                u32::MAX,
            ))),
            0xA5 => Some(be_u32(clamp_u32(bat.stored_wh(), u32::MAX))),
            0xA8 => Some(be_u32(clamp_u32(bat.cumulative_charge_wh, u32::MAX))),
            0xA9 => Some(be_u32(clamp_u32(bat.cumulative_discharge_wh, u32::MAX))),
            /* Working status mirrors the mode setting */
            0xCF | 0xDA => {
                if bat.is_charging {
                    Some(vec![MODE_CHARGE])
                } else if bat.is_discharging {
                    Some(vec![MODE_DISCHARGE])
                } else {
                    Some(vec![MODE_STANDBY])
                }
            }
            0xD0 => Some(be_u32(clamp_u32(bat.rated_capacity_wh, u32::MAX))),
            /* Signed instantaneous power, positive while charging */
            0xD3 => {
                let power = if bat.is_charging {
                    bat.instant_charge_power
                } else if bat.is_discharging {
                    -bat.instant_discharge_power
                } else {
                    0.0
                };
                Some(be_i32(clamp_i32(power)))
            }
            0xE2 => Some(be_u32(clamp_u32(bat.stored_wh(), u32::MAX))),
            0xE4 => Some(vec![bat.soc.clamp(0.0, 100.0) as u8]),
            _ => None,
        }
    }
}

impl EchonetObject for BatteryAdapter {
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
        let bat = &mut ems.battery;
        match epc {
            0x80 => match edt[0] {
                STATUS_ON => bat.is_running = true,
                STATUS_OFF => bat.is_running = false,
                _ => return false,
            },
            0xDA => match edt[0] {
                /* Rapid charge is not modeled separately */
                MODE_RAPID_CHARGE | MODE_CHARGE => {
                    bat.is_charging = true;
                    bat.is_discharging = false;
                    bat.instant_charge_power = bat.max_power_w;
                    bat.instant_discharge_power = 0.0;
                }
                MODE_DISCHARGE => {
                    bat.is_charging = false;
                    bat.is_discharging = true;
                    bat.instant_charge_power = 0.0;
                    bat.instant_discharge_power = bat.max_power_w;
                }
                MODE_STANDBY => {
                    bat.is_charging = false;
                    bat.is_discharging = false;
                    bat.instant_charge_power = 0.0;
                    bat.instant_discharge_power = 0.0;
                }
                _ => return false,
            },
            _ => return false,
        }
        return true;
    }
}
