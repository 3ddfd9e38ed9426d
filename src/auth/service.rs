use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use super::signer::{Claims, TokenSigner};
use crate::error::AppError;
use crate::reclaim::{ReclaimPolicy, Reclaimer};
use crate::store::TokenStore;
use crate::utils::token_prefix;

/// Login payload. Any well-formed pair is accepted.
#[derive(Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn from_json(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub deadline: DateTime<Utc>,
}

/// Issues tokens into the store and answers whether a token is authorized.
pub struct TokenService {
    store: Arc<TokenStore>,
    signer: Arc<dyn TokenSigner>,
    reclaimer: Reclaimer,
    ttl: TimeDelta,
}

impl TokenService {
    /// Creates an empty store and starts reclaiming it under `policy`.
    pub fn new(signer: Arc<dyn TokenSigner>, policy: ReclaimPolicy, ttl: TimeDelta) -> Self {
        let store = Arc::new(TokenStore::new());
        let reclaimer = Reclaimer::start(Arc::clone(&store), policy);
        Self {
            store,
            signer,
            reclaimer,
            ttl,
        }
    }

    pub fn create_token(&self, credentials: &Credentials) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let deadline = now + self.ttl;
        let claims = Claims {
            sub: credentials.user.clone(),
            iat: now.timestamp(),
            exp: deadline.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.signer.sign(&claims).map_err(|e| {
            error!(user = %credentials.user, error = %e, "token signing failed");
            AppError::SigningFailure
        })?;

        self.store.insert(token.as_str(), deadline);
        self.reclaimer.token_issued(&token, deadline);

        info!(
            user = %credentials.user,
            token = token_prefix(&token),
            %deadline,
            "token issued"
        );
        Ok(IssuedToken { token, deadline })
    }

    pub fn is_authorized(&self, token: &str) -> bool {
        self.store.validate(token)
    }

    pub fn active_tokens(&self) -> usize {
        self.store.len()
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn reclaimer(&self) -> &Reclaimer {
        &self.reclaimer
    }

    /// Upper bound on how long a token validates after issuance.
    pub fn max_lifetime(&self) -> TimeDelta {
        let slack = TimeDelta::from_std(self.reclaimer.staleness_bound()).unwrap_or(TimeDelta::MAX);
        self.ttl.checked_add(&slack).unwrap_or(TimeDelta::MAX)
    }

    pub async fn shutdown(&self) {
        self.reclaimer.shutdown().await;
    }
}
