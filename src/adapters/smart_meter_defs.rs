/// Device-describable property table for the low-voltage smart meter
/// (0x0288), captured from a production meter. Identification (0x83),
/// manufacturer code (0x8A) and the property maps (0x9D/0x9E/0x9F) are
/// intentionally absent: those are always settings- or codec-derived.
pub fn static_property(epc: u8) -> Option<Vec<u8>> {
    match epc {
        0x80 => Some(vec![0x30]),
        0x81 => Some(vec![
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00,
        ]),
        0x82 => Some(vec![0x00, 0x00, 0x46, 0x00]),
        0x84 => Some(vec![0x00, 0x00]),
        0x85 => Some(vec![0x00, 0x00, 0x00, 0x00]),
        0x86 => Some(vec![0x00, 0x00, 0x00, 0x00]),
        0x87 => Some(vec![0x64]),
        0x88 => Some(vec![0x42]),
        0x89 => Some(vec![0x00, 0x00]),
        0x8B => Some(vec![0x00, 0x00, 0x00]),
        0x8C => Some(vec![0x30; 12]),
        0x8D => Some(vec![0x30; 12]),
        0x8E => Some(vec![0x07, 0xDE, 0x07, 0x01]),
        0x8F => Some(vec![0x42]),
        0x93 => Some(vec![0x91]),
        0x97 => Some(vec![0x0E, 0x3B]),
        0x98 => Some(vec![0x07, 0xE7, 0x08, 0x18]),
        0x99 => Some(vec![0x00, 0x00]),
        0x9A => Some(vec![0x43, 0x00, 0x00, 0x00, 0x00]),
        /* Coefficient */
        0xD3 => Some(vec![0x00, 0x00, 0x00, 0x00]),
        /* Effective digits */
        0xD7 => Some(vec![0x01]),
        /* Cumulative energy unit: 1 kWh */
        0xE1 => Some(vec![0x00]),
        /* Half-hour history blocks, zeroed */
        0xE2 => Some(vec![0x00; 194]),
        0xE4 => Some(vec![0x00; 194]),
        0xE5 => Some(vec![0x00]),
        0xE8 => Some(vec![0x00, 0x00, 0x00, 0x00]),
        0xEA => Some(vec![
            0x07, 0xE7, 0x08, 0x18, 0x0E, 0x3B, 0x0B, 0x00, 0x01, 0x6C, 0xFF,
        ]),
        0xEB => Some(vec![
            0x07, 0xE7, 0x08, 0x18, 0x0E, 0x3B, 0x0C, 0x00, 0x01, 0x53, 0x6C,
        ]),
        0xEC => Some(vec![
            0x07, 0xE7, 0x08, 0x18, 0x0E, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]),
        0xED => Some(vec![0x07, 0xE7, 0x08, 0x18, 0x0E, 0x00, 0x01]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_excludes_derived_properties() {
        for epc in [0x83u8, 0x8A, 0x9D, 0x9E, 0x9F] {
            assert!(static_property(epc).is_none(), "0x{epc:02X} must be derived");
        }
    }

    #[test]
    fn pass_through_entries() {
        assert_eq!(static_property(0xD7), Some(vec![0x01]));
        assert_eq!(static_property(0xE1), Some(vec![0x00]));
        assert_eq!(static_property(0xE2).unwrap().len(), 194);
    }
}
