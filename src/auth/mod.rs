/// Authentication primitives
///
/// Token codec, claim types, the password-hashing capability, and the
/// refresh-token ledger rules.

mod claims;
mod jwt;
mod password;
pub mod refresh_token;
mod role;

pub use claims::Claims;
pub use jwt::decode_unverified;
pub use jwt::mint_access_token;
pub use jwt::verify_access_token;
pub use jwt::verify_signature_only;
pub use jwt::IssuedAccessToken;
pub use password::BcryptHasher;
pub use password::PasswordHasher;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::hash_token;
pub use refresh_token::RefreshToken;
pub use role::Role;
