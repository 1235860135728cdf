//! Remote ledger service port and its HTTP client.
//!
//! The remote service is an external collaborator exposing CRUD over the
//! five collections. Everything that can go wrong on the wire — network
//! error, timeout, non-2xx status, non-JSON body — collapses into
//! [`crate::error::SyncError::RemoteUnavailable`], which the coordinator
//! absorbs into its local fallback path.

pub mod http;

pub use http::HttpRemote;

use crate::domain::{Event, LedgerEntry, Member, Registrar, Settings};
use crate::error::SyncError;

/// The authoritative network store, as seen by the coordinator.
///
/// Every method performs exactly one attempt; retries are the caller's
/// decision (the coordinator never retries, it falls back locally).
#[allow(async_fn_in_trait)]
pub trait RemoteStore: Send + Sync {
    /// Fetches all events.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn fetch_events(&self) -> Result<Vec<Event>, SyncError>;

    /// Creates an event; the response carries the assigned id.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn create_event(&self, event: &Event) -> Result<Event, SyncError>;

    /// Updates an event by id.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn update_event(&self, event: &Event) -> Result<Event, SyncError>;

    /// Deletes an event by id. Ledger entries are untouched server-side.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn delete_event(&self, id: &str) -> Result<(), SyncError>;

    /// Fetches all registrars.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn fetch_registrars(&self) -> Result<Vec<Registrar>, SyncError>;

    /// Creates a registrar.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn create_registrar(&self, registrar: &Registrar) -> Result<Registrar, SyncError>;

    /// Updates a registrar by id.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn update_registrar(&self, registrar: &Registrar) -> Result<Registrar, SyncError>;

    /// Deletes a registrar by id.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn delete_registrar(&self, id: &str) -> Result<(), SyncError>;

    /// Fetches all members.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn fetch_members(&self) -> Result<Vec<Member>, SyncError>;

    /// Creates a member.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn create_member(&self, member: &Member) -> Result<Member, SyncError>;

    /// Updates a member by code.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn update_member(&self, member: &Member) -> Result<Member, SyncError>;

    /// Deletes a member by code.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn delete_member(&self, code: &str) -> Result<(), SyncError>;

    /// Bulk-upserts the member collection.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn bulk_sync_members(&self, members: &[Member]) -> Result<(), SyncError>;

    /// Fetches ledger entries, optionally server-filtered by event.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn fetch_entries(&self, event_id: Option<&str>) -> Result<Vec<LedgerEntry>, SyncError>;

    /// Creates a ledger entry.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn create_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntry, SyncError>;

    /// Updates a ledger entry by serial.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn update_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntry, SyncError>;

    /// Deletes a ledger entry by serial.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn delete_entry(&self, id: &str) -> Result<(), SyncError>;

    /// Fetches the settings document.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn fetch_settings(&self) -> Result<Settings, SyncError>;

    /// Persists the settings document.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] on any wire failure.
    async fn save_settings(&self, settings: &Settings) -> Result<Settings, SyncError>;
}
