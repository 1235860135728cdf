//! Domain layer: the five synchronized collections and their record types.
//!
//! All record shapes serialize as camelCase JSON matching the remote ledger
//! service's wire format. Legacy representations (bare-string PINs, historic
//! serial field names) are normalized here at the serde boundary so the rest
//! of the engine only ever sees one canonical shape.

pub mod collection;
pub mod dataset;
pub mod entry;
pub mod event;
pub mod member;
pub mod registrar;
pub mod settings;

pub use collection::Collection;
pub use dataset::Dataset;
pub use entry::{EntryKind, LedgerEntry};
pub use event::{Event, PinAction, PinRecord};
pub use member::Member;
pub use registrar::{Designation, Registrar};
pub use settings::{Settings, StationAssignment};
