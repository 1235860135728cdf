//! Engine error types and the propagation taxonomy.
//!
//! [`SyncError`] is the central error type for the engine. Validation-class
//! variants are surfaced synchronously to the caller and refuse the write
//! entirely; [`SyncError::RemoteUnavailable`] is an infrastructure signal
//! that the coordinator absorbs into the local fallback path and never
//! surfaces to the end user.

/// Engine-wide error enum.
///
/// # Propagation Policy
///
/// | Class          | Variants                                              | Behavior                         |
/// |----------------|-------------------------------------------------------|----------------------------------|
/// | Validation     | `Validation`, `DuplicateName`, `DuplicatePhone`, `PinMismatch`, `NotFound` | synchronous, blocks the write    |
/// | Infrastructure | `RemoteUnavailable`                                   | absorbed; local fallback applies |
/// | Local storage  | `Cache`                                               | surfaced; rare                   |
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A mandatory field is missing or a field value is malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An entry with the same normalized full name already exists in the event.
    #[error("duplicate entry for '{name}' in event {event_id}")]
    DuplicateName {
        /// Normalized full name that collided.
        name: String,
        /// Event in which the collision was found.
        event_id: String,
    },

    /// The phone number is already bound to a differently-named contributor.
    #[error("phone {phone} is already registered to '{existing_name}'")]
    DuplicatePhone {
        /// Phone number that collided.
        phone: String,
        /// Name the phone number is already bound to.
        existing_name: String,
    },

    /// The supplied approval PIN does not match any issued PIN for the event.
    #[error("approval pin does not match")]
    PinMismatch,

    /// A record with the given id does not exist in the collection.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Collection kind (e.g. `"event"`, `"ledger entry"`).
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The remote ledger service could not be reached or returned an
    /// unusable response (network error, timeout, non-2xx, non-JSON body).
    #[error("remote ledger service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The local cache failed to read or persist a collection.
    #[error("local cache error: {0}")]
    Cache(String),
}

impl SyncError {
    /// Returns `true` for infrastructure failures that the coordinator
    /// absorbs into the local fallback path instead of surfacing.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Returns `true` for validation-class failures that block the
    /// operation synchronously with no state change.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateName { .. }
                | Self::DuplicatePhone { .. }
                | Self::PinMismatch
                | Self::NotFound { .. }
        )
    }
}
