//! Credential obfuscation for the login packet
//!
//! The unit expects username and password bytes folded through a fixed
//! lookup table before transmission. This is obfuscation, not security:
//! the table ships in every device and every client, and the transform is
//! its own inverse. It exists so credentials do not appear verbatim in a
//! packet capture, nothing more.

/// The shared 128-byte folding table, identical on the device
static SEQUENCE: [u8; 128] = [
    0x47, 0x5D, 0x4C, 0x42, 0x66, 0x20, 0x23, 0x46, 0x4E, 0x57, 0x45, 0x3D, 0x67, 0x76, 0x60,
    0x41, 0x62, 0x39, 0x59, 0x2D, 0x68, 0x7E, 0x7C, 0x65, 0x7D, 0x49, 0x29, 0x72, 0x73, 0x78,
    0x21, 0x6E, 0x5A, 0x5E, 0x4A, 0x3E, 0x71, 0x2C, 0x2A, 0x54, 0x3C, 0x3A, 0x63, 0x4F, 0x43,
    0x75, 0x27, 0x79, 0x5B, 0x35, 0x70, 0x48, 0x6B, 0x56, 0x6F, 0x34, 0x32, 0x6C, 0x30, 0x61,
    0x6D, 0x7B, 0x2F, 0x4B, 0x64, 0x38, 0x2B, 0x2E, 0x50, 0x40, 0x3F, 0x55, 0x33, 0x37, 0x25,
    0x77, 0x24, 0x26, 0x74, 0x6A, 0x28, 0x53, 0x4D, 0x69, 0x22, 0x5C, 0x44, 0x31, 0x36, 0x58,
    0x3B, 0x7A, 0x51, 0x5F, 0x52, 0x5D, 0x47, 0x42, 0x4C, 0x20, 0x66, 0x46, 0x23, 0x57, 0x4E,
    0x3D, 0x45, 0x76, 0x67, 0x41, 0x60, 0x39, 0x62, 0x2D, 0x59, 0x7E, 0x68, 0x65, 0x7C, 0x49,
    0x7D, 0x72, 0x29, 0x78, 0x73, 0x6E, 0x21, 0x5E,
];

/// Fold a credential into its 32-byte wire form
///
/// Bytes beyond 32 are dropped, shorter credentials are zero-padded before
/// folding, and every byte is XOR'd with the table entry at its position.
pub fn encode_credential(input: &str) -> [u8; 32] {
    let bytes = input.as_bytes();
    let mut out = [0u8; 32];
    for (i, slot) in out.iter_mut().enumerate() {
        let b = bytes.get(i).copied().unwrap_or(0);
        *slot = b ^ SEQUENCE[i & 0x7F];
    }
    out
}

/// Undo [`encode_credential`] (the transform is an involution)
pub fn decode_credential(wire: &[u8; 32]) -> Vec<u8> {
    let mut out: Vec<u8> = wire
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ SEQUENCE[i & 0x7F])
        .collect();
    while out.last() == Some(&0) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_vector() {
        let enc = encode_credential("admin");
        assert_eq!(enc[0], b'a' ^ 0x47);
        assert_eq!(enc[4], b'n' ^ 0x66);
        // Padding folds to the bare table entry.
        assert_eq!(enc[5], 0x20);
    }

    #[test]
    fn not_plaintext_on_the_wire() {
        let enc = encode_credential("secret-password");
        assert_ne!(&enc[..15], b"secret-password".as_slice());
    }

    proptest! {
        #[test]
        fn involution(s in "[ -~]{0,32}") {
            let enc = encode_credential(&s);
            let dec = decode_credential(&enc);
            // Trailing NULs are padding, but printable input never ends in one.
            prop_assert_eq!(dec, s.as_bytes().to_vec());
        }
    }
}
