use crate::devices::SharedEms;
use crate::echonet::EchonetObject;

use super::{be_i32, be_u32, clamp_i32, clamp_u32, common_property, DeviceIdentity, STATUS_OFF, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[
    0x80, 0x83, 0x88, 0x8A, 0x9D, 0x9E, 0x9F, 0xC0, 0xC2, 0xC7, 0xD0, 0xD3, 0xD6, 0xD8, 0xDA,
    0xE1, 0xE2, 0xE4, 0xEB, 0xEC,
];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0x88, 0xC7];

/* Connection/chargeability status (0xC7) */
const VEHICLE_DISCONNECTED: u8 = 0x30;
const VEHICLE_CONNECTED_CHARGEABLE: u8 = 0x43;

/* Operation mode (0xDA/0xE1) */
const MODE_CHARGE: u8 = 0x42;
const MODE_DISCHARGE: u8 = 0x43;
const MODE_STANDBY: u8 = 0x44;
const MODE_STOPPED: u8 = 0x47;

/// EV charger/discharger (0x027E). The reported instantaneous power is the
/// engine-computed flow, not the configured setpoint, so a discharge capped
/// by the household demand reads back at the capped value.
pub struct V2hAdapter {
    state: SharedEms,
    identity: DeviceIdentity,
}

impl V2hAdapter {
    pub fn new(state: SharedEms, identity: DeviceIdentity) -> Self {
        return V2hAdapter { state, identity };
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        let ems = self.state.lock().unwrap();
        let v2h = &ems.v2h;
        match epc {
            0x80 => Some(vec![if v2h.is_running { STATUS_ON } else { STATUS_OFF }]),
            0xC0 | 0xD0 => Some(be_u32(clamp_u32(v2h.battery_capacity_wh, u32::MAX))),
            0xC2 | 0xE2 => Some(be_u32(clamp_u32(v2h.remaining_capacity_wh, u32::MAX))),
            0xC7 => Some(vec![if v2h.vehicle_connected {
                VEHICLE_CONNECTED_CHARGEABLE
            } else {
                VEHICLE_DISCONNECTED
            }]),
            0xD3 => {
                let power = match v2h.operation_mode {
                    MODE_CHARGE => v2h.current_charge_w,
                    MODE_DISCHARGE => -v2h.current_discharge_w,
                    _ => 0.0,
                };
                Some(be_i32(clamp_i32(power)))
            }
            0xD6 => Some(be_u32(clamp_u32(v2h.cumulative_discharge_wh, u32::MAX))),
            0xD8 => Some(be_u32(clamp_u32(v2h.cumulative_charge_wh, u32::MAX))),
            /* The mode reads as stopped whenever no vehicle is connected */
            0xDA | 0xE1 => Some(vec![if v2h.vehicle_connected {
                v2h.operation_mode
            } else {
                MODE_STOPPED
            }]),
            0xE4 => {
                if v2h.battery_capacity_wh > 0.0 {
                    let pct = v2h.remaining_capacity_wh / v2h.battery_capacity_wh * 100.0;
                    Some(vec![pct.clamp(0.0, 100.0) as u8])
                } else {
                    Some(vec![0])
                }
            }
            0xEB => Some(be_u32(clamp_u32(v2h.charge_power_w, u32::MAX))),
            0xEC => Some(be_u32(clamp_u32(v2h.discharge_power_w, u32::MAX))),
            _ => None,
        }
    }
}

impl EchonetObject for V2hAdapter {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>> {
        return self
            .dynamic_property(epc)
            .or_else(|| common_property(epc, &self.identity, GETTABLE_EPCS, ANNOUNCE_EPCS));
    }

    fn set_property(&self, epc: u8, edt: &[u8]) -> bool {
        let mut ems = self.state.lock().unwrap();
        let v2h = &mut ems.v2h;
        match epc {
            0x80 if edt.len() == 1 => match edt[0] {
                STATUS_ON => v2h.is_running = true,
                STATUS_OFF => v2h.is_running = false,
                _ => return false,
            },
            /* Connection toggle; there is no separate disconnect EPC */
            0xCD => {
                if v2h.vehicle_connected {
                    v2h.vehicle_connected = false;
                    v2h.operation_mode = MODE_STOPPED;
                    v2h.current_charge_w = 0.0;
                    v2h.current_discharge_w = 0.0;
                } else {
                    v2h.vehicle_connected = true;
                    v2h.operation_mode = MODE_STANDBY;
                }
            }
            0xDA if edt.len() == 1 => {
                if !v2h.vehicle_connected {
                    return false;
                }
                match edt[0] {
                    MODE_CHARGE | MODE_DISCHARGE | MODE_STANDBY => v2h.operation_mode = edt[0],
                    MODE_STOPPED => {
                        /* Stopping also releases the vehicle */
                        v2h.operation_mode = MODE_STOPPED;
                        v2h.vehicle_connected = false;
                        v2h.current_charge_w = 0.0;
                        v2h.current_discharge_w = 0.0;
                    }
                    _ => return false,
                }
            }
            0xEB if edt.len() == 4 => {
                v2h.charge_power_w = u32::from_be_bytes([edt[0], edt[1], edt[2], edt[3]]) as f64;
            }
            0xEC if edt.len() == 4 => {
                v2h.discharge_power_w = u32::from_be_bytes([edt[0], edt[1], edt[2], edt[3]]) as f64;
            }
            _ => return false,
        }
        return true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{new_shared, EmsState, SharedEms};
    use std::sync::Arc;

    fn adapter() -> (V2hAdapter, SharedEms) {
        let shared = new_shared(EmsState::default());
        let a = V2hAdapter::new(Arc::clone(&shared), DeviceIdentity::new("", 0x00007E));
        return (a, shared);
    }

    #[test]
    fn disconnected_defaults() {
        let (a, _) = adapter();
        assert_eq!(a.get_property(0xC7), Some(vec![0x30]));
        assert_eq!(a.get_property(0xDA), Some(vec![0x47]));
        assert_eq!(a.get_property(0xE1), Some(vec![0x47]));
        assert_eq!(a.get_property(0xD3), Some(be_i32(0)));
    }

    #[test]
    fn mode_set_rejected_while_disconnected() {
        let (a, _) = adapter();
        assert!(!a.set_property(0xDA, &[0x42]));
        assert_eq!(a.get_property(0xDA), Some(vec![0x47]));
    }

    #[test]
    fn connect_toggle() {
        let (a, _) = adapter();
        assert!(a.set_property(0xCD, &[0x00]));
        assert_eq!(a.get_property(0xC7), Some(vec![0x43]));
        assert_eq!(a.get_property(0xDA), Some(vec![0x44]));

        assert!(a.set_property(0xCD, &[0x00]));
        assert_eq!(a.get_property(0xC7), Some(vec![0x30]));
        assert_eq!(a.get_property(0xDA), Some(vec![0x47]));
    }

    #[test]
    fn mode_transitions_when_connected() {
        let (a, _) = adapter();
        a.set_property(0xCD, &[0x00]);
        for mode in [0x42u8, 0x43, 0x44] {
            assert!(a.set_property(0xDA, &[mode]));
            assert_eq!(a.get_property(0xDA), Some(vec![mode]));
            assert_eq!(a.get_property(0xE1), Some(vec![mode]));
        }
        assert!(!a.set_property(0xDA, &[0x41]));
    }

    #[test]
    fn stop_mode_releases_vehicle() {
        let (a, _) = adapter();
        a.set_property(0xCD, &[0x00]);
        assert!(a.set_property(0xDA, &[0x47]));
        assert_eq!(a.get_property(0xC7), Some(vec![0x30]));
        assert_eq!(a.get_property(0xDA), Some(vec![0x47]));
    }

    #[test]
    fn instantaneous_power_reflects_actual_flow() {
        let (a, shared) = adapter();
        a.set_property(0xCD, &[0x00]);
        {
            let mut ems = shared.lock().unwrap();
            ems.v2h.operation_mode = 0x43;
            ems.v2h.current_discharge_w = 250.0;
        }
        assert_eq!(a.get_property(0xD3), Some(be_i32(-250)));

        {
            let mut ems = shared.lock().unwrap();
            ems.v2h.operation_mode = 0x42;
            ems.v2h.current_charge_w = 3000.0;
        }
        assert_eq!(a.get_property(0xD3), Some(be_i32(3000)));
    }

    #[test]
    fn capacity_and_percentage() {
        let (a, shared) = adapter();
        {
            let mut ems = shared.lock().unwrap();
            ems.v2h.battery_capacity_wh = 20000.0;
            ems.v2h.remaining_capacity_wh = 10000.0;
        }
        assert_eq!(a.get_property(0xC0), Some(be_u32(20000)));
        assert_eq!(a.get_property(0xD0), Some(be_u32(20000)));
        assert_eq!(a.get_property(0xC2), Some(be_u32(10000)));
        assert_eq!(a.get_property(0xE2), Some(be_u32(10000)));
        assert_eq!(a.get_property(0xE4), Some(vec![50]));

        shared.lock().unwrap().v2h.battery_capacity_wh = 0.0;
        assert_eq!(a.get_property(0xE4), Some(vec![0]));
    }

    #[test]
    fn power_setpoints_settable() {
        let (a, _) = adapter();
        assert!(a.set_property(0xEB, &be_u32(6000)));
        assert!(a.set_property(0xEC, &be_u32(4500)));
        assert_eq!(a.get_property(0xEB), Some(be_u32(6000)));
        assert_eq!(a.get_property(0xEC), Some(be_u32(4500)));
        assert!(!a.set_property(0xEB, &[0x01, 0x02]));
    }

    #[test]
    fn gettable_map_uses_bitmap_form() {
        let (a, _) = adapter();
        let map = a.get_property(0x9F).unwrap();
        assert_eq!(map.len(), 17);
        assert_eq!(map[0] as usize, GETTABLE_EPCS.len());
    }
}
