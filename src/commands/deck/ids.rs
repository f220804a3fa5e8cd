use sha2::{Digest, Sha256};

const BASE91_TABLE: &[u8; 91] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&()*+,-./:;<=>?@[]^_`{|}~";

/// Note GUID derived from field content: SHA-256 over the values joined by
/// `__`, first eight bytes read big-endian, written in base91. The same
/// fields always give the same GUID, so re-imports update notes in place.
pub(super) fn guid_for(fields: &[&str]) -> String {
    let digest = Sha256::digest(fields.join("__").as_bytes());
    base91(leading_u64(&digest))
}

pub(super) fn note_id_for(guid: &str) -> i64 {
    derived_id("note", guid)
}

pub(super) fn card_id_for(guid: &str, ordinal: u32) -> i64 {
    derived_id(&format!("card{ordinal}"), guid)
}

/// Duplicate-check checksum over the sort field.
pub(super) fn field_checksum(sort_field: &str) -> i64 {
    let digest = Sha256::digest(sort_field.trim().as_bytes());
    i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Positive 52-bit ids keep clear of JavaScript's integer precision limit.
fn derived_id(namespace: &str, guid: &str) -> i64 {
    let digest = Sha256::digest(format!("{namespace}:{guid}").as_bytes());
    (leading_u64(&digest) >> 12) as i64
}

fn leading_u64(digest: &[u8]) -> u64 {
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn base91(mut number: u64) -> String {
    let mut out = Vec::<u8>::new();
    while number > 0 {
        out.push(BASE91_TABLE[(number % 91) as usize]);
        number /= 91;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
pub(super) fn base91_for_tests(number: u64) -> String {
    base91(number)
}
