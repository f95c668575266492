use crate::error::CredentialError;

/// Credential collaborator: hashes and verifies user passwords.
///
/// The directory stores only the opaque hash string this collaborator
/// produces and never inspects its content. Injected at construction, never
/// process-wide state.
pub trait CredentialHasher: Send + Sync {
    /// Hashes a password into an opaque credential string.
    fn hash(&self, password: &str) -> std::result::Result<String, CredentialError>;

    /// Verifies a password against a stored credential string.
    ///
    /// An unparseable stored credential verifies as false, not as an error.
    fn verify(
        &self,
        password: &str,
        credential_hash: &str,
    ) -> std::result::Result<bool, CredentialError>;
}

#[cfg(feature = "argon2")]
mod argon2_hasher {
    use super::CredentialHasher;
    use crate::error::CredentialError;
    use argon2::{Argon2, PasswordHasher, PasswordVerifier};
    use password_hash::{PasswordHash, SaltString};

    /// Argon2id hasher producing PHC-format credential strings.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct Argon2Hasher;

    impl Argon2Hasher {
        pub fn new() -> Self {
            Self
        }
    }

    impl CredentialHasher for Argon2Hasher {
        fn hash(&self, password: &str) -> std::result::Result<String, CredentialError> {
            let mut salt_bytes = [0u8; 16];
            getrandom::getrandom(&mut salt_bytes)
                .map_err(|e| CredentialError::from(e.to_string()))?;
            let salt = SaltString::encode_b64(&salt_bytes)
                .map_err(|e| CredentialError::from(e.to_string()))?;
            let phc = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| CredentialError::from(e.to_string()))?
                .to_string();
            Ok(phc)
        }

        fn verify(
            &self,
            password: &str,
            credential_hash: &str,
        ) -> std::result::Result<bool, CredentialError> {
            let Ok(parsed) = PasswordHash::new(credential_hash) else {
                return Ok(false);
            };
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        }
    }
}

#[cfg(feature = "argon2")]
pub use argon2_hasher::Argon2Hasher;
