//! Crypto fixtures: a provider-shaped RSA keypair for tests.

use base64::{engine::general_purpose, Engine as _};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;

/// A keypair standing in for the provider's: signs assertions the way the
/// provider does and exports the public half the way the provider
/// publishes it (base64-wrapped DER container).
pub struct TestKeyPair {
    private_key: RsaPrivateKey,
    public_base64: String,
}

impl TestKeyPair {
    /// Generate a fresh 2048-bit keypair.
    ///
    /// # Panics
    ///
    /// Panics if key generation fails, which only happens when the system
    /// RNG is broken. Fine in tests.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("RSA keypair generation");
        let der = private_key
            .to_public_key()
            .to_public_key_der()
            .expect("SPKI export");
        let public_base64 = general_purpose::STANDARD.encode(der.as_bytes());

        Self {
            private_key,
            public_base64,
        }
    }

    /// The public key in the wire format the gate consumes.
    pub fn public_material(&self) -> String {
        self.public_base64.clone()
    }

    /// Sign an assertion over `username-hostname`, base64-encoded, exactly
    /// as the provider issues them.
    pub fn sign_assertion(&self, username: &str, hostname: &str) -> String {
        let signing_key = SigningKey::<Sha1>::new(self.private_key.clone());
        let signature = signing_key.sign(format!("{}-{}", username, hostname).as_bytes());
        general_purpose::STANDARD.encode(signature.to_bytes())
    }
}
