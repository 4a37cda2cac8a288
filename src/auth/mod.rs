//! Accounts, tokens and the request guards built on them.

mod extract;
pub mod google;
pub mod password;
pub mod tokens;

pub use extract::{authenticate, Admin, AuthUser, MaybeUser, Reviewer};
