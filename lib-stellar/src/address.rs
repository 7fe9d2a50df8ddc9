//! Stellar address format rules
//!
//! Public account identifiers are 56 characters, start with `G`, and use the
//! RFC 4648 base32 alphabet. The full checksum verification lives in the
//! network SDKs; a format gate here is enough to reject garbage before any
//! network round trip.

const ADDRESS_LEN: usize = 56;
const BASE32_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Check that a string looks like a Stellar public account address.
pub fn address_is_well_formed(address: &str) -> bool {
    if address.len() != ADDRESS_LEN || !address.starts_with('G') {
        return false;
    }
    address.chars().all(|c| BASE32_ALPHABET.contains(c))
}
