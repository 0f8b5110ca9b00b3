/// Authentication module
///
/// Password hashing, access token minting/validation, refresh token
/// lifecycle and Authorization header parsing.

mod claims;
mod extractor;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, ISSUER};
pub use extractor::{api_key, bearer_token, AuthenticatedUser, BillingWebhookCaller};
pub use jwt::{generate_access_token, validate_access_token, DEFAULT_ACCESS_TOKEN_TTL_SECONDS};
pub use password::{hash_password, verify_password, HASH_COST};
pub use refresh_token::{
    generate_refresh_token, issue_refresh_token, resolve_refresh_token, revoke_refresh_token,
    RefreshTokenState, REFRESH_TOKEN_LIFETIME_DAYS,
};
