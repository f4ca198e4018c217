//! Credential resolution
//!
//! The dispatcher asks a [`CredentialResolver`] for the current bearer
//! credential before every attempt. Resolvers read through to a
//! [`TokenStore`] with no caching of their own and fail open: a store that
//! cannot be read yields no credential, and the request goes out
//! unauthenticated.

mod resolver;
mod types;

pub use resolver::{
    CredentialResolver, EnvTokenStore, FileTokenStore, MemoryTokenStore, NoCredentials,
    StaticCredential, StoreResolver, TokenStore,
};
pub use types::Credential;
