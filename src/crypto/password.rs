use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::CryptoError;

#[cfg(not(test))]
pub const PBKDF2_ITERATIONS: u32 = 600_000;
#[cfg(test)]
pub const PBKDF2_ITERATIONS: u32 = 1_000;
pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2_sha256";

/// Derived password hash: zeroed on drop
#[derive(Zeroize)]
#[zeroize(drop)]
struct DerivedHash {
    bytes: [u8; HASH_LENGTH],
}

impl DerivedHash {
    /// Derive from password + salt using PBKDF2-SHA256
    fn derive(password: &str, salt: &[u8], iterations: u32) -> Self {
        let mut bytes = [0u8; HASH_LENGTH];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut bytes);
        Self { bytes }
    }
}

/// Stored form of a password: `(hash, salt)` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    /// `pbkdf2_sha256$<iterations>$<base64 hash>`
    pub hash: String,
    /// base64 salt
    pub salt: String,
}

/// Hash a new password with a fresh random salt.
pub fn hash_password(password: &str) -> PasswordHash {
    let salt = generate_salt();
    let derived = DerivedHash::derive(password, &salt, PBKDF2_ITERATIONS);
    PasswordHash {
        hash: format!(
            "{SCHEME}${PBKDF2_ITERATIONS}${}",
            STANDARD_NO_PAD.encode(derived.bytes)
        ),
        salt: STANDARD_NO_PAD.encode(salt),
    }
}

/// Verify a password against its stored hash in constant time.
pub fn verify_password(password: &str, stored: &PasswordHash) -> Result<bool, CryptoError> {
    let mut parts = stored.hash.splitn(3, '$');
    let (scheme, iterations, encoded) = match (parts.next(), parts.next(), parts.next()) {
        (Some(s), Some(i), Some(h)) => (s, i, h),
        _ => return Err(CryptoError::MalformedHash),
    };
    if scheme != SCHEME {
        return Err(CryptoError::MalformedHash);
    }
    let iterations: u32 = iterations.parse().map_err(|_| CryptoError::MalformedHash)?;
    let expected = STANDARD_NO_PAD
        .decode(encoded)
        .map_err(|_| CryptoError::MalformedHash)?;
    let salt = STANDARD_NO_PAD
        .decode(&stored.salt)
        .map_err(|_| CryptoError::MalformedHash)?;

    let derived = DerivedHash::derive(password, &salt, iterations);
    Ok(derived.bytes[..].ct_eq(&expected[..]).unwrap_u8() == 1)
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("correct horse battery");
        assert!(verify_password("correct horse battery", &stored).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("correct horse battery");
        assert!(!verify_password("wrong horse battery", &stored).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = hash_password("password");
        let b = hash_password("password");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn iteration_count_is_read_from_stored_hash() {
        let salt = [7u8; SALT_LENGTH];
        let derived = DerivedHash::derive("pw-123456", &salt, 10);
        let stored = PasswordHash {
            hash: format!("{SCHEME}$10${}", STANDARD_NO_PAD.encode(derived.bytes)),
            salt: STANDARD_NO_PAD.encode(salt),
        };
        assert!(verify_password("pw-123456", &stored).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let stored = PasswordHash {
            hash: "md5$abc".into(),
            salt: String::new(),
        };
        assert!(matches!(
            verify_password("x", &stored),
            Err(CryptoError::MalformedHash)
        ));
    }
}
