//! Sleep lookup trait used to confirm upstream trigger ids.

use nocturne_types::session::LookupOutcome;

/// Optional external collaborator that checks a sleep id exists upstream.
///
/// "Not installed" and "did not answer" are reported as
/// [`LookupOutcome::Unavailable`], a normal outcome rather than an error.
pub trait SleepLookup: Send + Sync {
    fn lookup(
        &self,
        sleep_id: &str,
    ) -> impl std::future::Future<Output = LookupOutcome> + Send;
}
