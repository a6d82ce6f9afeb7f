// ABOUTME: Validated domain types and account data exchanged with the service.
// ABOUTME: Account names, public key records, users and key sets.

mod account;
mod account_name;
mod public_key;

pub use account::{KeyEntry, KeySet, User};
pub use account_name::{AccountName, AccountNameError, MAX_NAME_LEN, validate_name};
pub use public_key::{PublicKeyError, PublicKeyRecord};
