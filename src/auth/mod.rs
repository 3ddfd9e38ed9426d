mod service;
mod signer;

pub use service::{Credentials, IssuedToken, TokenService};
pub use signer::{Claims, JwtSigner, SignError, TokenSigner};
