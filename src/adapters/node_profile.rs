use crate::echonet::{EchonetObject, ObjectKey};

use super::{common_property, DeviceIdentity, STATUS_ON};

const GETTABLE_EPCS: &[u8] = &[
    0x80, 0x82, 0x83, 0x88, 0x8A, 0x9D, 0x9E, 0x9F, 0xD3, 0xD5, 0xD6,
];
const ANNOUNCE_EPCS: &[u8] = &[0x80, 0xD5];

/* ECHONET Lite standard version, Appendix Release format */
const STANDARD_VERSION: [u8; 4] = [0x01, 0x0D, 0x01, 0x00];

/// Node profile object (0x0EF001). Answers the self-node instance list the
/// emulator registered at startup; the list never changes afterwards.
pub struct NodeProfileAdapter {
    instances: Vec<ObjectKey>,
    identity: DeviceIdentity,
}

impl NodeProfileAdapter {
    pub fn new(instances: Vec<ObjectKey>, identity: DeviceIdentity) -> Self {
        return NodeProfileAdapter {
            instances,
            identity,
        };
    }

    fn instance_list(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.instances.len() * 3);
        out.push(self.instances.len() as u8);
        for (group, code, instance) in &self.instances {
            out.push(*group);
            out.push(*code);
            out.push(*instance);
        }
        return out;
    }

    fn dynamic_property(&self, epc: u8) -> Option<Vec<u8>> {
        match epc {
            0x80 => Some(vec![STATUS_ON]),
            0x82 => Some(STANDARD_VERSION.to_vec()),
            0xD3 => {
                let count = self.instances.len() as u32;
                Some(vec![(count >> 16) as u8, (count >> 8) as u8, count as u8])
            }
            0xD5 | 0xD6 => Some(self.instance_list()),
            _ => None,
        }
    }
}

impl EchonetObject for NodeProfileAdapter {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>> {
        return self
            .dynamic_property(epc)
            .or_else(|| common_property(epc, &self.identity, GETTABLE_EPCS, ANNOUNCE_EPCS));
    }

    fn set_property(&self, _epc: u8, _edt: &[u8]) -> bool {
        return false;
    }
}
