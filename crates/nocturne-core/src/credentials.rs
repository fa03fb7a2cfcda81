//! Credential store trait.

use nocturne_types::credentials::Credentials;
use nocturne_types::error::CredentialError;

/// Source of the webhook signing secret and client credentials.
///
/// Read-only from the service's point of view. Implementations are expected
/// to read fresh on every call rather than cache.
pub trait CredentialStore: Send + Sync {
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Credentials, CredentialError>> + Send;
}
