use lazy_static::lazy_static;
use std::collections::HashMap;

/* Display names for protocol logging. Keyed the way the wire carries them:
super-class EPCs apply to every object, class EPCs shadow them. */

lazy_static! {
    static ref SUPER_CLASS_EPCS: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x80, "Operation Status");
        m.insert(0x81, "Installation Location");
        m.insert(0x82, "Standard Version Information");
        m.insert(0x83, "Identification Number");
        m.insert(0x84, "Instantaneous Power Consumption");
        m.insert(0x85, "Cumulative Power Consumption");
        m.insert(0x88, "Fault Status");
        m.insert(0x8A, "Manufacturer Code");
        m.insert(0x8F, "Power-saving Operation Setting");
        m.insert(0x9D, "Status Change Announcement Property Map");
        m.insert(0x9E, "Set Property Map");
        m.insert(0x9F, "Get Property Map");
        m
    };

    static ref CLASS_EPCS: HashMap<(u8, u8), HashMap<u8, &'static str>> = {
        let mut m = HashMap::new();

        let mut node_profile = HashMap::new();
        node_profile.insert(0xD3, "Self-node Instances Total Number");
        node_profile.insert(0xD5, "Instance List Notification");
        node_profile.insert(0xD6, "Self-node Instance List S");
        m.insert((0x0E, 0xF0), node_profile);

        let mut solar = HashMap::new();
        solar.insert(0xE0, "Measured Instantaneous Amount of Electricity Generated");
        solar.insert(0xE1, "Measured Cumulative Amount of Electric Energy Generated");
        m.insert((0x02, 0x79), solar);

        let mut battery = HashMap::new();
        battery.insert(0xA4, "AC Chargeable Electric Energy");
        battery.insert(0xA5, "AC Dischargeable Electric Energy");
        battery.insert(0xA8, "AC Cumulative Charging Electric Energy");
        battery.insert(0xA9, "AC Cumulative Discharging Electric Energy");
        battery.insert(0xCF, "Working Operation Status");
        battery.insert(0xD0, "Rated Electric Energy");
        battery.insert(0xD3, "Measured Instantaneous Charge/Discharge Power");
        battery.insert(0xDA, "Operation Mode Setting");
        battery.insert(0xE2, "Remaining Stored Electricity 1");
        battery.insert(0xE4, "Remaining Stored Electricity 3");
        m.insert((0x02, 0x7D), battery);

        let mut water_heater = HashMap::new();
        water_heater.insert(0xB0, "Automatic Water Heating Setting");
        water_heater.insert(0xB2, "Water Heating Status");
        water_heater.insert(0xC0, "Daytime Reheating Permission Setting");
        water_heater.insert(0xE1, "Measured Amount of Remaining Hot Water");
        water_heater.insert(0xE2, "Tank Capacity");
        water_heater.insert(0xE3, "Automatic Bath Operation Setting");
        m.insert((0x02, 0x6B), water_heater);

        let mut v2h = HashMap::new();
        v2h.insert(0xC0, "Rated Charge Capacity");
        v2h.insert(0xC2, "Remaining Vehicle Battery Energy 1");
        v2h.insert(0xC7, "Vehicle Connection and Chargeability Status");
        v2h.insert(0xCD, "Vehicle Connection Setting");
        v2h.insert(0xD3, "Measured Instantaneous Charge/Discharge Power");
        v2h.insert(0xD6, "Cumulative Discharging Electric Energy");
        v2h.insert(0xD8, "Cumulative Charging Electric Energy");
        v2h.insert(0xDA, "Operation Mode Setting");
        v2h.insert(0xE1, "Working Operation Status");
        v2h.insert(0xE2, "Remaining Vehicle Battery Energy 3");
        v2h.insert(0xE4, "Remaining Vehicle Battery Level");
        v2h.insert(0xEB, "Charging Electric Power Setting");
        v2h.insert(0xEC, "Discharging Electric Power Setting");
        m.insert((0x02, 0x7E), v2h);

        let mut smart_meter = HashMap::new();
        smart_meter.insert(0xD3, "Coefficient");
        smart_meter.insert(0xD7, "Number of Effective Digits");
        smart_meter.insert(0xE0, "Measured Cumulative Amount of Electric Energy (Normal)");
        smart_meter.insert(0xE1, "Unit for Cumulative Amounts of Electric Energy");
        smart_meter.insert(0xE3, "Measured Cumulative Amount of Electric Energy (Reverse)");
        smart_meter.insert(0xE7, "Measured Instantaneous Electric Power");
        m.insert((0x02, 0x88), smart_meter);

        let mut air_conditioner = HashMap::new();
        air_conditioner.insert(0xA0, "Air Flow Rate Setting");
        air_conditioner.insert(0xB0, "Operation Mode Setting");
        air_conditioner.insert(0xB3, "Set Temperature Value");
        m.insert((0x01, 0x30), air_conditioner);

        m
    };

    static ref CLASS_NAMES: HashMap<(u8, u8), &'static str> = {
        let mut m = HashMap::new();
        m.insert((0x0E, 0xF0), "Node Profile");
        m.insert((0x01, 0x30), "Home Air Conditioner");
        m.insert((0x02, 0x6B), "Electric Water Heater");
        m.insert((0x02, 0x79), "Solar Power Generation");
        m.insert((0x02, 0x7D), "Storage Battery");
        m.insert((0x02, 0x7E), "EV Charger/Discharger");
        m.insert((0x02, 0x88), "Smart Meter");
        m
    };
}

pub fn get_epc_name(class_group: u8, class_code: u8, epc: u8) -> String {
    if let Some(class_map) = CLASS_EPCS.get(&(class_group, class_code)) {
        if let Some(name) = class_map.get(&epc) {
            return name.to_string();
        }
    }
    if let Some(name) = SUPER_CLASS_EPCS.get(&epc) {
        return name.to_string();
    }
    return format!("Unknown EPC (0x{epc:02X})");
}

pub fn get_class_name(class_group: u8, class_code: u8) -> String {
    return CLASS_NAMES
        .get(&(class_group, class_code))
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Unknown Class".to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_epc_shadows_super_class() {
        /* 0xE0 is class specific on the smart meter */
        assert_eq!(
            get_epc_name(0x02, 0x88, 0xE0),
            "Measured Cumulative Amount of Electric Energy (Normal)"
        );
        assert_eq!(get_epc_name(0x02, 0x88, 0x80), "Operation Status");
        assert!(get_epc_name(0x02, 0x88, 0x77).starts_with("Unknown EPC"));
    }

    #[test]
    fn class_names() {
        assert_eq!(get_class_name(0x02, 0x7E), "EV Charger/Discharger");
        assert_eq!(get_class_name(0x0A, 0x01), "Unknown Class");
    }
}
