//! Account password hashing for registration and login.
//!
//! Passwords are never sent to the remote store: registration uploads a
//! PBKDF2-HMAC-SHA256 salt/hash pair, and login fetches that pair back and
//! verifies the candidate locally.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

const SALT_SIZE: usize = 16;
const HASH_SIZE: usize = 32;
const ITERATIONS: u32 = 100_000;

/// Hashes a password with a fresh random salt.
///
/// Returns `(salt_hex, hash_hex)` as stored by the account service.
pub fn hash_password(password: &str) -> (String, String) {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ITERATIONS, &mut hash);

    (hex::encode(salt), hex::encode(hash))
}

/// Verifies a candidate password against a stored salt/hash pair.
///
/// Malformed hex in either field verifies as false rather than erroring;
/// a corrupt account record is indistinguishable from a wrong password.
pub fn verify_password(salt_hex: &str, hash_hex: &str, candidate: &str) -> bool {
    let (salt, stored_hash) = match (hex::decode(salt_hex), hex::decode(hash_hex)) {
        (Ok(s), Ok(h)) => (s, h),
        _ => return false,
    };

    let mut check = [0u8; HASH_SIZE];
    pbkdf2_hmac::<Sha256>(candidate.as_bytes(), &salt, ITERATIONS, &mut check);

    check.as_slice() == stored_hash.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let (salt, hash) = hash_password("hunter2");
        assert!(verify_password(&salt, &hash, "hunter2"));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (salt, hash) = hash_password("hunter2");
        assert!(!verify_password(&salt, &hash, "hunter3"));
    }

    #[test]
    fn test_fresh_salt_per_hash() {
        let (salt_a, hash_a) = hash_password("same");
        let (salt_b, hash_b) = hash_password("same");
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn test_malformed_record_rejected() {
        assert!(!verify_password("zz-not-hex", "00", "pw"));
        assert!(!verify_password("00", "zz-not-hex", "pw"));
    }
}
