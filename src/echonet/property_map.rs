/// ECHONET Lite property maps (EPC 0x9D/0x9E/0x9F) come in two wire forms:
/// fewer than 16 entries is a plain list `[count, epc...]`, 16 or more is
/// `[count, bitmap]` with a fixed 16-byte bitmap covering EPC 0x80..=0xFF.
///
/// Bit layout of the bitmap form: byte `(epc - 0x80) / 8`, bit
/// `7 - ((epc - 0x80) % 8)` — bit 7 carries the lowest EPC of its group.
pub fn encode_property_map(epcs: &[u8]) -> Vec<u8> {
    let mut sorted: Vec<u8> = epcs.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let count = sorted.len() as u8;
    if sorted.len() < 16 {
        let mut out = Vec::with_capacity(1 + sorted.len());
        out.push(count);
        out.extend_from_slice(&sorted);
        return out;
    }

    let mut out = vec![0u8; 17];
    out[0] = count;
    for epc in sorted {
        if epc < 0x80 {
            /* Bitmap form only spans 0x80..=0xFF */
            continue;
        }
        let idx = (epc - 0x80) as usize;
        out[1 + idx / 8] |= 1 << (7 - (idx % 8));
    }
    return out;
}

/// Inverse of `encode_property_map`, accepting either wire form.
pub fn decode_property_map(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let count = data[0] as usize;
    if count < 16 {
        return data[1..].to_vec();
    }

    let mut epcs = Vec::with_capacity(count);
    for (byte_idx, byte) in data[1..].iter().take(16).enumerate() {
        for bit in 0..8u8 {
            if byte & (1 << (7 - bit)) != 0 {
                epcs.push(0x80 + (byte_idx * 8) as u8 + bit);
            }
        }
    }
    return epcs;
}
