use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::IssuedToken;

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Deadline of the token, RFC 3339.
    pub time_to_live: DateTime<Utc>,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            time_to_live: issued.deadline,
        }
    }
}
