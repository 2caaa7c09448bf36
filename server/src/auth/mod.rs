//! Authentication
//!
//! Bearer JWT validation for storefront customers and admin users. Tokens are
//! issued by the storefront's auth service; the gate only validates them.

mod error;
pub mod jwt;
mod middleware;

pub use error::{AuthError, AuthResult, ErrorResponse};
pub use jwt::{generate_access_token, validate_access_token, ActorType, Claims};
pub use middleware::{authenticate_customer, require_admin, AdminUser, AuthCustomer};
