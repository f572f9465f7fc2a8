//! Modern-forwarding payload construction. The proxy hands the real player
//! identity to the backend inside a login plugin message on the
//! `velocity:player_info` channel, signed so the backend can trust it.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use waypoint_protocol::{
    GameProfile, Property, VarInt,
    ser::{NetworkWriteExt, WritingError},
};

type HmacSha256 = Hmac<Sha256>;

pub const PLAYER_INFO_CHANNEL: &str = "velocity:player_info";

/// Plain forwarding, no chat-signing key material.
pub const MODERN_FORWARDING_DEFAULT: u8 = 1;
pub const MAX_SUPPORTED_FORWARDING_VERSION: u8 = 4;

/// Builds the signed login-plugin response payload: a 32-byte HMAC-SHA256
/// signature followed by the forwarded version, address and profile.
pub fn create_forwarding_data(
    secret: &[u8],
    address: &str,
    profile: &GameProfile,
    version: u8,
) -> Result<Vec<u8>, WritingError> {
    let mut forwarded = Vec::new();
    forwarded.write_var_int(&VarInt(i32::from(version.min(
        MAX_SUPPORTED_FORWARDING_VERSION,
    ))))?;
    forwarded.write_string(address)?;
    forwarded.write_uuid(&profile.id)?;
    forwarded.write_string(&profile.name)?;
    forwarded.write_list::<Property>(&profile.properties, |w, property| {
        w.write_string(&property.name)?;
        w.write_string(&property.value)?;
        w.write_option(&property.signature, |w, signature| w.write_string(signature))
    })?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(&forwarded);
    let signature = mac.finalize().into_bytes();

    let mut data = Vec::with_capacity(signature.len() + forwarded.len());
    data.extend_from_slice(&signature);
    data.extend_from_slice(&forwarded);
    Ok(data)
}

/// Verifies a signed forwarding payload. `data` is the signature followed by
/// the payload, as produced by [`create_forwarding_data`].
#[must_use]
pub fn check_integrity(data: (&[u8], &[u8]), secret: &[u8]) -> bool {
    let (signature, data_without_signature) = data;
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(data_without_signature);
    mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use super::*;

    fn profile() -> GameProfile {
        GameProfile {
            id: Uuid::new_v4(),
            name: "Steve".to_string(),
            properties: vec![Property {
                name: "textures".to_string(),
                value: "dGV4dHVyZXM=".to_string(),
                signature: None,
            }],
        }
    }

    #[test]
    fn test_signed_payload_verifies() {
        let secret = b"hunter2hunter";
        let data = create_forwarding_data(
            secret,
            "203.0.113.7",
            &profile(),
            MODERN_FORWARDING_DEFAULT,
        )
        .unwrap();

        let (signature, payload) = data.split_at(32);
        assert!(check_integrity((signature, payload), secret));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let secret = b"hunter2hunter";
        let mut data = create_forwarding_data(
            secret,
            "203.0.113.7",
            &profile(),
            MODERN_FORWARDING_DEFAULT,
        )
        .unwrap();

        let last = data.len() - 1;
        data[last] ^= 0x01;
        let (signature, payload) = data.split_at(32);
        assert!(!check_integrity((signature, payload), secret));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let data = create_forwarding_data(
            b"hunter2hunter",
            "203.0.113.7",
            &profile(),
            MODERN_FORWARDING_DEFAULT,
        )
        .unwrap();

        let (signature, payload) = data.split_at(32);
        assert!(!check_integrity((signature, payload), b"password1"));
    }

    #[test]
    fn test_requested_version_is_capped() {
        let data =
            create_forwarding_data(b"s", "203.0.113.7", &profile(), u8::MAX).unwrap();
        // First payload byte after the signature is the forwarding version
        assert_eq!(data[32], MAX_SUPPORTED_FORWARDING_VERSION);
    }
}
