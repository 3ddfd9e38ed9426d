use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user name from the login body
    pub iat: i64,
    pub exp: i64,
    pub jti: String, // random per issuance
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("signing failed: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("verification failed: {0}")]
    Verify(#[source] jsonwebtoken::errors::Error),
}

/// Turns claims into an opaque token string.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &Claims) -> Result<String, SignError>;
}

/// HS256 signer keyed by the process-wide secret.
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    /// Checks the signature and returns the claims.
    ///
    /// `exp` is not enforced here: token lifetime is governed by the token
    /// store, not by the claim.
    pub fn verify(&self, token: &str) -> Result<Claims, SignError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(SignError::Verify)
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &Claims) -> Result<String, SignError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(SignError::Sign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(jti: &str) -> Claims {
        Claims {
            sub: "alice".into(),
            iat: 1_700_000_000,
            exp: 1_700_000_006,
            jti: jti.into(),
        }
    }

    #[test]
    fn signed_token_verifies_with_same_key() {
        let signer = JwtSigner::new(b"secret");
        let token = signer.sign(&claims("1")).unwrap();
        assert_eq!(signer.verify(&token).unwrap(), claims("1"));
    }

    #[test]
    fn other_key_is_rejected() {
        let token = JwtSigner::new(b"secret").sign(&claims("1")).unwrap();
        let err = JwtSigner::new(b"other").verify(&token).unwrap_err();
        assert!(matches!(err, SignError::Verify(_)));
    }

    #[test]
    fn distinct_jti_gives_distinct_tokens() {
        let signer = JwtSigner::new(b"secret");
        let a = signer.sign(&claims("1")).unwrap();
        let b = signer.sign(&claims("2")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_does_not_verify() {
        let signer = JwtSigner::new(b"secret");
        assert!(signer.verify("not-a-token").is_err());
    }
}
