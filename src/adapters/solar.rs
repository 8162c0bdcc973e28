use crate::devices::SharedEms;
use crate::echonet::EchonetObject;

use super::{be_u16, be_u32, clamp_u16, clamp_u32, common_property, DeviceIdentity, STATUS_OFF, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[0x80, 0x83, 0x88, 0x8A, 0x9D, 0x9E, 0x9F, 0xE0, 0xE1];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0x88];

/// Residential solar power generation (0x0279).
pub struct SolarAdapter {
    state: SharedEms,
    identity: DeviceIdentity,
}

impl SolarAdapter {
    pub fn new(state: SharedEms, identity: DeviceIdentity) -> Self {
        return SolarAdapter { state, identity };
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        let ems = self.state.lock().unwrap();
        let solar = &ems.solar;
        match epc {
            0x80 => Some(vec![if solar.is_running { STATUS_ON } else { STATUS_OFF }]),
            /* Instantaneous generation, 2-byte unsigned watts */
            0xE0 => Some(be_u16(clamp_u16(solar.instant_generation_power, u16::MAX))),
            /* Cumulative generation in 0.001 kWh units */
            0xE1 => Some(be_u32(clamp_u32(
                solar.cumulative_generation_kwh * 1000.0,
                u32::MAX,
            ))),
            _ => None,
        }
    }
}

impl EchonetObject for SolarAdapter {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>> {
        return self
            .dynamic_property(epc)
            .or_else(|| common_property(epc, &self.identity, GETTABLE_EPCS, ANNOUNCE_EPCS));
    }

    fn set_property(&self, epc: u8, edt: &[u8]) -> bool {
        if epc == 0x80 && edt.len() == 1 {
            let mut ems = self.state.lock().unwrap();
            match edt[0] {
                STATUS_ON => ems.solar.is_running = true,
                STATUS_OFF => ems.solar.is_running = false,
                _ => return false,
            }
            return true;
        }
        return false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{new_shared, EmsState};

    fn adapter_with(state: EmsState) -> SolarAdapter {
        return SolarAdapter::new(new_shared(state), DeviceIdentity::new("", 0x00007E));
    }

    #[test]
    fn instant_generation_caps_at_u16() {
        let mut state = EmsState::default();
        state.solar.instant_generation_power = 1234.0;
        let a = adapter_with(state);
        assert_eq!(a.get_property(0xE0), Some(vec![0x04, 0xD2]));

        let mut state = EmsState::default();
        state.solar.instant_generation_power = 100000.0;
        let a = adapter_with(state);
        assert_eq!(a.get_property(0xE0), Some(vec![0xFF, 0xFF]));
    }

    #[test]
    fn cumulative_generation_scales_by_thousand() {
        let mut state = EmsState::default();
        state.solar.cumulative_generation_kwh = 5.5;
        let a = adapter_with(state);
        assert_eq!(a.get_property(0xE1), Some(be_u32(5500)));
    }

    #[test]
    fn operation_status_set() {
        let a = adapter_with(EmsState::default());
        assert!(a.set_property(0x80, &[0x31]));
        assert_eq!(a.get_property(0x80), Some(vec![0x31]));
        assert!(!a.set_property(0x80, &[0x99]));
        assert!(!a.set_property(0xE0, &[0x00, 0x00]));
    }
}
