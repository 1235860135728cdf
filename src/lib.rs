//! # moi-sync
//!
//! Offline-first synchronization and reconciliation engine for moi
//! (monetary gift) ledger registries at social events.
//!
//! Mutations write through to a remote ledger service when the network
//! allows and fall back to the on-device cache when it does not; a
//! bootstrap pass reconciles the two stores at startup. Registration must
//! never stall mid-event — the worst outcome of any remote failure is the
//! intended local-only degraded mode.
//!
//! ## Architecture
//!
//! ```text
//! Callers (CLI, embedding application)
//!     │
//!     ├── SyncCoordinator (coordinator)
//!     │       │
//!     │       ├── SerialAllocator (allocator)
//!     │       ├── DuplicateGuard (guard)
//!     │       ├── ApprovalPinManager (pins)
//!     │       ├── MemberAggregator (aggregate)
//!     │       └── record overlay (merge)
//!     │
//!     ├── RemoteStore port (remote/) ── HTTP ledger service
//!     └── LocalCache port (persistence/) ── on-device JSON cache
//! ```

pub mod aggregate;
pub mod allocator;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod guard;
pub mod merge;
pub mod persistence;
pub mod pins;
pub mod remote;
