use std::collections::HashMap;

use log::{debug, info, warn};

use super::consts::{get_class_name, get_epc_name};
use super::frame::{
    EchonetFrame, ObjectKey, ESV_GET, ESV_GET_RES, ESV_GET_SNA, ESV_SETC_SNA, ESV_SET_C,
    ESV_SET_I, ESV_SET_RES,
};

/// A registered device object. Adapters translate between wire property
/// bytes and shared device state; they hold no data of their own beyond
/// identification.
pub trait EchonetObject: Send + Sync {
    fn get_property(&self, epc: u8) -> Option<Vec<u8>>;
    fn set_property(&self, epc: u8, edt: &[u8]) -> bool;
}

/// Registry of (class group, class code, instance) -> handler plus the
/// request/response rules. Registration happens before the transports start;
/// after that the registry is only read.
pub struct EchonetController {
    objects: HashMap<ObjectKey, Box<dyn EchonetObject>>,
}

impl EchonetController {
    pub fn new() -> Self {
        return EchonetController {
            objects: HashMap::new(),
        };
    }

    /// Last registration for a key wins.
    pub fn register_instance(
        &mut self,
        group: u8,
        code: u8,
        instance: u8,
        handler: Box<dyn EchonetObject>,
    ) {
        let key = (group, code, instance);
        info!(
            "Registered object {:02X}{:02X}-{:02X} ({})",
            group,
            code,
            instance,
            get_class_name(group, code)
        );
        self.objects.insert(key, handler);
    }

    pub fn get_object(&self, key: &ObjectKey) -> Option<&dyn EchonetObject> {
        return self.objects.get(key).map(|b| b.as_ref());
    }

    /// Process one inbound datagram and build the reply, if any. Fails
    /// closed: malformed input and unknown targets yield no reply.
    pub fn handle_frame(&self, data: &[u8]) -> Option<Vec<u8>> {
        let req = match EchonetFrame::parse(data) {
            Ok(f) => f,
            Err(e) => {
                warn!("Frame parse error: {e} | data: {}", hex::encode(data));
                return None;
            }
        };

        let handler = match self.objects.get(&req.deoj) {
            Some(h) => h,
            None => {
                /* Strictly this should answer SNA, but the emulator keeps
                the original minimal-footprint behavior and stays silent. */
                debug!("Unknown target object: {:?}", req.deoj);
                return None;
            }
        };

        let mut res_props: Vec<(u8, Vec<u8>)> = Vec::new();
        let mut is_success = true;

        for (epc, edt) in &req.props {
            match req.esv {
                ESV_GET => match handler.get_property(*epc) {
                    Some(val) => res_props.push((*epc, val)),
                    None => {
                        debug!(
                            "No value for {} (0x{epc:02X})",
                            get_epc_name(req.deoj.0, req.deoj.1, *epc)
                        );
                        /* Get SNA echoes the EPC with PDC=0 */
                        res_props.push((*epc, Vec::new()));
                        is_success = false;
                    }
                },
                ESV_SET_I | ESV_SET_C => {
                    if handler.set_property(*epc, edt) {
                        res_props.push((*epc, Vec::new()));
                    } else {
                        is_success = false;
                    }
                }
                _ => {}
            }
        }

        let res_esv = match req.esv {
            ESV_GET => {
                if is_success {
                    ESV_GET_RES
                } else {
                    ESV_GET_SNA
                }
            }
            ESV_SET_C => {
                if is_success {
                    ESV_SET_RES
                } else {
                    ESV_SETC_SNA
                }
            }
            /* SetI expects no response, success or failure */
            _ => return None,
        };

        let mut res = EchonetFrame::new(res_esv);
        res.tid = req.tid;
        res.seoj = req.deoj;
        res.deoj = req.seoj;
        res.props = res_props;
        return Some(res.to_bytes());
    }
}
