//! TLS material resolution and rustls configuration.
//!
//! # Responsibilities
//! - Turn configured certificate/key/CA/passphrase strings into PEM bytes
//! - Accept each field either as PEM text or as base64-encoded PEM
//! - Build the rustls server configuration for the secure listener
//!
//! # Design Decisions
//! - The PEM-or-base64 decision is made per field, by looking for the
//!   `---` boundary marker; certificate and key may use different encodings
//! - Empty certificate or key disables TLS instead of failing
//! - Once TLS fields are set, bad material is fatal (no plaintext fallback)
//! - PKCS#8 keys encrypted with the configured passphrase are decrypted
//!   before rustls sees them

use std::io::BufReader;

use axum_server::tls_rustls::RustlsConfig;
use base64::{engine::general_purpose, Engine as _};

use crate::config::TlsConfig;

/// Substring whose presence marks a field as PEM text.
pub const PEM_MARKER: &str = "---";

const ENCRYPTED_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Error raised while materializing TLS credentials.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("{field} is neither PEM nor valid base64: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("no certificates found in {field}")]
    NoCertificates { field: &'static str },

    #[error("no private key found in tls private key")]
    NoPrivateKey,

    #[error("tls private key is encrypted but no passphrase is configured")]
    EncryptedKey,

    #[error("failed to decrypt tls private key: {0}")]
    KeyDecryption(String),

    #[error("failed to read PEM from {field}: {source}")]
    Pem {
        field: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("rustls rejected the certificate/key pair: {0}")]
    Rustls(#[source] std::io::Error),
}

/// Resolved credential bundle for the secure listener.
#[derive(Clone)]
pub struct TlsCredential {
    pub certificate: Vec<u8>,
    pub private_key: Vec<u8>,
    pub certificate_authority: Option<Vec<u8>>,
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for TlsCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsCredential")
            .field("certificate_len", &self.certificate.len())
            .field("private_key_len", &self.private_key.len())
            .field("certificate_authority", &self.certificate_authority.is_some())
            .field("passphrase", &self.passphrase.is_some())
            .finish()
    }
}

/// Resolve TLS material from raw configuration strings.
///
/// Returns `Ok(None)` when certificate or key is empty.
pub fn materialize(
    cert: &str,
    key: &str,
    ca: &str,
    passphrase: &str,
) -> Result<Option<TlsCredential>, TlsError> {
    if cert.is_empty() || key.is_empty() {
        return Ok(None);
    }

    let certificate = decode_field("tls certificate", cert)?;
    let private_key = decode_field("tls private key", key)?;
    let certificate_authority = if ca.is_empty() {
        None
    } else {
        Some(decode_field("tls certificate authority", ca)?)
    };
    let passphrase = (!passphrase.is_empty()).then(|| passphrase.to_string());

    Ok(Some(TlsCredential {
        certificate,
        private_key,
        certificate_authority,
        passphrase,
    }))
}

/// Resolve TLS material from the listener's TLS section.
pub fn materialize_config(config: &TlsConfig) -> Result<Option<TlsCredential>, TlsError> {
    materialize(
        &config.certificate,
        &config.private_key,
        &config.certificate_authority,
        &config.passphrase,
    )
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, TlsError> {
    if value.contains(PEM_MARKER) {
        return Ok(value.as_bytes().to_vec());
    }
    // Base64 from env vars and secrets often carries line breaks.
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| TlsError::Base64 { field, source })
}

impl TlsCredential {
    /// Parse the PEM material into DER: certificate chain (leaf first,
    /// then any CA certificates) and private key.
    pub fn to_der(&self) -> Result<(Vec<Vec<u8>>, Vec<u8>), TlsError> {
        let mut chain = read_certs("tls certificate", &self.certificate)?;
        if chain.is_empty() {
            return Err(TlsError::NoCertificates { field: "tls certificate" });
        }
        if let Some(ca) = &self.certificate_authority {
            let extra = read_certs("tls certificate authority", ca)?;
            if extra.is_empty() {
                return Err(TlsError::NoCertificates { field: "tls certificate authority" });
            }
            chain.extend(extra);
        }

        if String::from_utf8_lossy(&self.private_key).contains(ENCRYPTED_KEY_LABEL) {
            let passphrase = self.passphrase.as_deref().ok_or(TlsError::EncryptedKey)?;
            let key = decrypt_key(&self.private_key, passphrase)?;
            return Ok((chain, key));
        }

        let mut reader = BufReader::new(self.private_key.as_slice());
        let key = rustls_pemfile::private_key(&mut reader)
            .map_err(|source| TlsError::Pem { field: "tls private key", source })?
            .ok_or(TlsError::NoPrivateKey)?;

        Ok((chain, key.secret_der().to_vec()))
    }

    /// Build the rustls configuration used by the secure listener.
    pub async fn into_rustls_config(self) -> Result<RustlsConfig, TlsError> {
        let (chain, key) = self.to_der()?;
        RustlsConfig::from_der(chain, key)
            .await
            .map_err(TlsError::Rustls)
    }
}

/// Decrypt a PEM `ENCRYPTED PRIVATE KEY` into PKCS#8 DER.
fn decrypt_key(pem: &[u8], passphrase: &str) -> Result<Vec<u8>, TlsError> {
    let (label, der) = pkcs8::der::pem::decode_vec(pem.trim_ascii())
        .map_err(|e| TlsError::KeyDecryption(e.to_string()))?;
    if label != ENCRYPTED_KEY_LABEL {
        return Err(TlsError::KeyDecryption(format!("unexpected PEM label {:?}", label)));
    }
    let encrypted = pkcs8::EncryptedPrivateKeyInfo::try_from(der.as_slice())
        .map_err(|e| TlsError::KeyDecryption(e.to_string()))?;
    let document = encrypted
        .decrypt(passphrase)
        .map_err(|e| TlsError::KeyDecryption(e.to_string()))?;
    Ok(document.as_bytes().to_vec())
}

fn read_certs(field: &'static str, pem: &[u8]) -> Result<Vec<Vec<u8>>, TlsError> {
    let mut reader = BufReader::new(pem);
    rustls_pemfile::certs(&mut reader)
        .map(|cert| cert.map(|der| der.to_vec()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Pem { field, source })
}
