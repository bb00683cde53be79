//! Login-secret generation and keyed hashing.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Secrets are sampled from plain alphanumerics: nothing that needs
/// escaping in a URL or survives poorly in a terminal paste.
const SECRET_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 48 chars over a 62-symbol alphabet is ~285 bits of entropy, comfortably
/// past the 32-byte floor for a bearer credential.
pub const SECRET_LEN: usize = 48;

const LOGIN_DOMAIN: &str = "login-secret-v1";

/// Generate a fresh login secret from the OS CSPRNG.
pub fn generate_secret() -> String {
    let mut rng = OsRng;
    (0..SECRET_LEN)
        .map(|_| SECRET_ALPHABET[rng.gen_range(0..SECRET_ALPHABET.len())] as char)
        .collect()
}

/// Server-held key for login-secret hashes and session signatures.
/// Parsed from 64 hex chars; the raw bytes are zeroed on drop.
pub struct HashKey(Zeroizing<[u8; 32]>);

impl HashKey {
    pub fn from_hex(hex_key: &str) -> anyhow::Result<Self> {
        if hex_key.len() != 64 {
            anyhow::bail!(
                "GATEHOUSE_SECRET_KEY must be 64 hex chars (32 bytes), got {} chars",
                hex_key.len()
            );
        }
        let bytes = hex::decode(hex_key)?;
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    /// HMAC-SHA256 over `payload`, domain-separated so login hashes and
    /// session signatures can never be confused for one another.
    pub fn sign(&self, domain: &str, payload: &[u8]) -> [u8; 32] {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.0[..])
            .expect("HMAC can take key of any size");
        mac.update(domain.as_bytes());
        mac.update(&[0x00]);
        mac.update(payload);
        let out = mac.finalize().into_bytes();
        let mut sig = [0u8; 32];
        sig.copy_from_slice(&out);
        sig
    }

    /// The stored form of a login secret.
    pub fn hash_secret(&self, secret: &str) -> String {
        hex::encode(self.sign(LOGIN_DOMAIN, secret.as_bytes()))
    }

    /// Constant-time check of a presented secret against a stored hash.
    /// This comparison is a security boundary; it must not short-circuit
    /// on the first differing byte.
    pub fn verify_secret(&self, presented: &str, stored_hash: &str) -> bool {
        let expected = self.hash_secret(presented);
        expected.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }
}
