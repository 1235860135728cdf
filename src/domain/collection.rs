//! The five synchronized collections and their wire/cache names.

use std::fmt;

/// A synchronized collection.
///
/// Remote paths and cache keys differ for the ledger entry collection
/// (`moi-entries` on the wire, `moiEntries` in the cache); this enum is the
/// single place both spellings live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Social events.
    Events,
    /// Station personnel.
    Registrars,
    /// Canonical contributors.
    Members,
    /// Ledger entries.
    MoiEntries,
    /// The process-wide settings document.
    Settings,
}

impl Collection {
    /// All five collections, in sync order.
    pub const ALL: [Self; 5] = [
        Self::Events,
        Self::Registrars,
        Self::Members,
        Self::MoiEntries,
        Self::Settings,
    ];

    /// URL path segment on the remote ledger service.
    #[must_use]
    pub const fn remote_path(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Registrars => "registrars",
            Self::Members => "members",
            Self::MoiEntries => "moi-entries",
            Self::Settings => "settings",
        }
    }

    /// Namespaced key in the local cache.
    #[must_use]
    pub const fn cache_key(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Registrars => "registrars",
            Self::Members => "members",
            Self::MoiEntries => "moiEntries",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.remote_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_collection_spellings_differ() {
        assert_eq!(Collection::MoiEntries.remote_path(), "moi-entries");
        assert_eq!(Collection::MoiEntries.cache_key(), "moiEntries");
    }

    #[test]
    fn display_uses_remote_path() {
        assert_eq!(Collection::Events.to_string(), "events");
    }
}
