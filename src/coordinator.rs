//! Synchronization coordinator: the engine's orchestration layer.
//!
//! Every mutation follows the same write-through-with-fallback policy:
//! attempt the remote operation exactly once; on success re-fetch the
//! authoritative collection, re-apply any in-flight local edit on top of
//! the fetched record, and overwrite the local cache; on remote failure
//! apply the mutation locally and report success anyway. Only validation
//! failures ever surface to the caller. The worst outcome is the intended
//! local-only degraded mode, never a crash.

use tokio::sync::RwLock;

use crate::allocator;
use crate::domain::{
    Collection, Dataset, EntryKind, Event, LedgerEntry, Member, PinAction, PinRecord, Registrar,
    Settings,
};
use crate::error::SyncError;
use crate::guard;
use crate::persistence::{self, CacheExport, LocalCache};
use crate::pins;
use crate::remote::RemoteStore;
use crate::{aggregate, merge};

/// Counters describing one bootstrap reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Whether the remote service answered the initial fetch.
    pub remote_reachable: bool,
    /// Local events pushed to an empty remote collection.
    pub pushed_events: usize,
    /// Local registrars pushed to an empty remote collection.
    pub pushed_registrars: usize,
    /// Local members pushed to an empty remote collection.
    pub pushed_members: usize,
    /// Local ledger entries absent remotely (by `eventId::id`) that were pushed.
    pub pushed_entries: usize,
    /// Records whose individual push failed; the batch always continues.
    pub failed_pushes: usize,
}

/// Top-level orchestrator over the remote store and local cache ports.
///
/// Holds the canonical in-memory [`Dataset`] behind a `RwLock`; one
/// logical writer per device session, so lock contention is not a concern,
/// but accessors stay cheap for concurrent readers.
#[derive(Debug)]
pub struct SyncCoordinator<R, C> {
    remote: R,
    cache: C,
    data: RwLock<Dataset>,
}

impl<R: RemoteStore, C: LocalCache> SyncCoordinator<R, C> {
    /// Opens the coordinator over the given ports, loading the dataset
    /// from the local cache.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the cache holds undecodable data.
    pub fn open(remote: R, cache: C) -> Result<Self, SyncError> {
        let data = Self::load_dataset(&cache)?;
        Ok(Self {
            remote,
            cache,
            data: RwLock::new(data),
        })
    }

    fn load_dataset(cache: &C) -> Result<Dataset, SyncError> {
        let mut data = Dataset {
            events: cache.read_collection(Collection::Events)?,
            registrars: cache.read_collection(Collection::Registrars)?,
            members: cache.read_collection(Collection::Members)?,
            entries: cache.read_collection(Collection::MoiEntries)?,
            settings: cache
                .read_document(Collection::Settings)?
                .unwrap_or_default(),
        };
        data.normalize();
        Ok(data)
    }

    // ---- accessors -------------------------------------------------------

    /// Current events snapshot.
    pub async fn events(&self) -> Vec<Event> {
        self.data.read().await.events.clone()
    }

    /// Current registrars snapshot.
    pub async fn registrars(&self) -> Vec<Registrar> {
        self.data.read().await.registrars.clone()
    }

    /// Current members snapshot.
    pub async fn members(&self) -> Vec<Member> {
        self.data.read().await.members.clone()
    }

    /// Current ledger snapshot, including entries of deleted events.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.data.read().await.entries.clone()
    }

    /// Ledger entries for one event.
    pub async fn entries_for_event(&self, event_id: &str) -> Vec<LedgerEntry> {
        self.data
            .read()
            .await
            .entries_for_event(event_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Current settings document.
    pub async fn settings(&self) -> Settings {
        self.data.read().await.settings.clone()
    }

    // ---- bootstrap reconciliation ---------------------------------------

    /// One-time startup reconciliation: backfills a reachable-but-empty
    /// remote store from local-only data, then adopts the remote state as
    /// canonical.
    ///
    /// Per-record push failures are logged and skipped; the batch always
    /// completes with whatever subset succeeded. A fully unreachable
    /// remote leaves the engine in local-only mode, which is an intended
    /// degraded state.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when adopted state cannot be persisted.
    pub async fn bootstrap(&self) -> Result<BootstrapReport, SyncError> {
        let mut report = BootstrapReport::default();

        // Fallback is disabled here: the fetch either succeeds or the
        // engine stays on its local snapshot.
        let remote_events = match self.remote.fetch_events().await {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(error = %err, "remote unreachable; operating in local-only mode");
                return Ok(report);
            }
        };
        report.remote_reachable = true;

        // Events.
        let local_events = self.data.read().await.events.clone();
        if remote_events.is_empty() && !local_events.is_empty() {
            for event in &local_events {
                match self.remote.create_event(event).await {
                    Ok(_) => report.pushed_events += 1,
                    Err(err) => {
                        report.failed_pushes += 1;
                        tracing::warn!(error = %err, id = %event.id, "event backfill failed");
                    }
                }
            }
        }
        self.adopt_remote_events(None).await?;

        // Registrars.
        match self.remote.fetch_registrars().await {
            Ok(remote_registrars) => {
                let local_registrars = self.data.read().await.registrars.clone();
                if remote_registrars.is_empty() && !local_registrars.is_empty() {
                    for registrar in &local_registrars {
                        match self.remote.create_registrar(registrar).await {
                            Ok(_) => report.pushed_registrars += 1,
                            Err(err) => {
                                report.failed_pushes += 1;
                                tracing::warn!(error = %err, id = %registrar.id, "registrar backfill failed");
                            }
                        }
                    }
                }
                self.adopt_remote_registrars(None).await?;
            }
            Err(err) => {
                tracing::warn!(error = %err, "registrar fetch failed during bootstrap");
            }
        }

        // Members.
        match self.remote.fetch_members().await {
            Ok(remote_members) => {
                let local_members = self.data.read().await.members.clone();
                if remote_members.is_empty() && !local_members.is_empty() {
                    for member in &local_members {
                        match self.remote.create_member(member).await {
                            Ok(_) => report.pushed_members += 1,
                            Err(err) => {
                                report.failed_pushes += 1;
                                tracing::warn!(error = %err, code = %member.member_code, "member backfill failed");
                            }
                        }
                    }
                }
                self.adopt_remote_members(None).await?;
            }
            Err(err) => {
                tracing::warn!(error = %err, "member fetch failed during bootstrap");
            }
        }

        // Ledger entries: diff on the composite key, push what is missing.
        match self.remote.fetch_entries(None).await {
            Ok(remote_entries) => {
                let known: std::collections::HashSet<String> = remote_entries
                    .iter()
                    .map(LedgerEntry::composite_key)
                    .collect();
                let local_entries = self.data.read().await.entries.clone();
                for entry in &local_entries {
                    if known.contains(&entry.composite_key()) {
                        continue;
                    }
                    match self.remote.create_entry(entry).await {
                        Ok(_) => report.pushed_entries += 1,
                        Err(err) => {
                            report.failed_pushes += 1;
                            tracing::warn!(error = %err, key = %entry.composite_key(), "entry backfill failed");
                        }
                    }
                }
                self.adopt_remote_entries(None).await?;
            }
            Err(err) => {
                tracing::warn!(error = %err, "entry fetch failed during bootstrap");
            }
        }

        // Settings: remote document if non-empty, else local, else default.
        let remote_settings = self.remote.fetch_settings().await;
        {
            let mut data = self.data.write().await;
            match remote_settings {
                Ok(document) if !document.is_empty() => data.settings = document,
                Ok(_) => {
                    if data.settings.is_empty() {
                        data.settings = Settings::fallback();
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "settings fetch failed during bootstrap");
                    if data.settings.is_empty() {
                        data.settings = Settings::fallback();
                    }
                }
            }
            self.persist_settings(&data)?;
        }

        tracing::info!(
            pushed_events = report.pushed_events,
            pushed_registrars = report.pushed_registrars,
            pushed_members = report.pushed_members,
            pushed_entries = report.pushed_entries,
            failed = report.failed_pushes,
            "bootstrap reconciliation complete"
        );
        Ok(report)
    }

    // ---- events ----------------------------------------------------------

    /// Creates an event, remote-first with local fallback.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] when the event name is blank;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn create_event(&self, draft: Event) -> Result<Event, SyncError> {
        if draft.event_name.trim().is_empty() {
            return Err(SyncError::Validation("event name is required".to_string()));
        }
        let mut record = draft;
        match self.remote.create_event(&record).await {
            Ok(created) => {
                if !created.id.trim().is_empty() {
                    record.id = allocator::normalize_id(&created.id);
                }
                if record.id.is_empty() {
                    let data = self.data.read().await;
                    record.id = allocator::next_event_id(&data.events, &data.entries);
                }
                if let Err(err) = self.adopt_remote_events(Some(&record)).await {
                    tracing::warn!(error = %err, "event re-fetch failed; keeping local copy");
                    self.upsert_event_locally(&record).await?;
                }
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote event create failed; writing locally");
                let mut data = self.data.write().await;
                if record.id.trim().is_empty() {
                    record.id = allocator::next_event_id(&data.events, &data.entries);
                }
                data.events.push(record.clone());
                self.persist_events(&data)?;
                Ok(record)
            }
        }
    }

    /// Updates an event, remote-first with local fallback.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when no such event exists locally;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn update_event(&self, record: Event) -> Result<Event, SyncError> {
        let mut record = record;
        record.id = allocator::normalize_id(&record.id);
        if self.data.read().await.find_event(&record.id).is_none() {
            return Err(SyncError::NotFound {
                kind: "event",
                id: record.id,
            });
        }
        match self.remote.update_event(&record).await {
            Ok(echoed) => {
                let merged = merge::overlay_record(&echoed, &record)?;
                if let Err(err) = self.adopt_remote_events(Some(&merged)).await {
                    tracing::warn!(error = %err, "event re-fetch failed; keeping local copy");
                    self.upsert_event_locally(&merged).await?;
                }
                Ok(merged)
            }
            Err(err) => {
                tracing::warn!(error = %err, id = %record.id, "remote event update failed; writing locally");
                self.upsert_event_locally(&record).await?;
                Ok(record)
            }
        }
    }

    /// Deletes an event from the active collection.
    ///
    /// The event's ledger entries are never deleted: they must outlive
    /// the event for audit retention.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when no such event exists locally;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn delete_event(&self, id: &str) -> Result<(), SyncError> {
        let id = allocator::normalize_id(id);
        {
            let mut data = self.data.write().await;
            if data.find_event(&id).is_none() {
                return Err(SyncError::NotFound { kind: "event", id });
            }
            data.events.retain(|e| e.id != id);
            self.persist_events(&data)?;
        }
        match self.remote.delete_event(&id).await {
            Ok(()) => {
                if let Err(err) = self.adopt_remote_events(None).await {
                    tracing::warn!(error = %err, "event re-fetch after delete failed");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, id = %id, "remote event delete failed; removed locally");
            }
        }
        Ok(())
    }

    // ---- registrars ------------------------------------------------------

    /// Creates a registrar, remote-first with local fallback.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] when the name is blank;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn create_registrar(&self, draft: Registrar) -> Result<Registrar, SyncError> {
        if draft.name.trim().is_empty() {
            return Err(SyncError::Validation(
                "registrar name is required".to_string(),
            ));
        }
        let mut record = draft;
        match self.remote.create_registrar(&record).await {
            Ok(created) => {
                if !created.id.trim().is_empty() {
                    record.id = allocator::normalize_id(&created.id);
                }
                if record.id.is_empty() {
                    let data = self.data.read().await;
                    record.id =
                        allocator::next_entity_id(data.registrars.iter().map(|r| r.id.as_str()));
                }
                if let Err(err) = self.adopt_remote_registrars(Some(&record)).await {
                    tracing::warn!(error = %err, "registrar re-fetch failed; keeping local copy");
                    self.upsert_registrar_locally(&record).await?;
                }
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote registrar create failed; writing locally");
                let mut data = self.data.write().await;
                if record.id.trim().is_empty() {
                    record.id =
                        allocator::next_entity_id(data.registrars.iter().map(|r| r.id.as_str()));
                }
                data.registrars.push(record.clone());
                self.persist_registrars(&data)?;
                Ok(record)
            }
        }
    }

    /// Updates a registrar, remote-first with local fallback.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when no such registrar exists locally;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn update_registrar(&self, record: Registrar) -> Result<Registrar, SyncError> {
        let mut record = record;
        record.id = allocator::normalize_id(&record.id);
        let known = self
            .data
            .read()
            .await
            .registrars
            .iter()
            .any(|r| r.id == record.id);
        if !known {
            return Err(SyncError::NotFound {
                kind: "registrar",
                id: record.id,
            });
        }
        match self.remote.update_registrar(&record).await {
            Ok(echoed) => {
                let merged = merge::overlay_record(&echoed, &record)?;
                if let Err(err) = self.adopt_remote_registrars(Some(&merged)).await {
                    tracing::warn!(error = %err, "registrar re-fetch failed; keeping local copy");
                    self.upsert_registrar_locally(&merged).await?;
                }
                Ok(merged)
            }
            Err(err) => {
                tracing::warn!(error = %err, id = %record.id, "remote registrar update failed; writing locally");
                self.upsert_registrar_locally(&record).await?;
                Ok(record)
            }
        }
    }

    /// Deletes a registrar.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when no such registrar exists locally;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn delete_registrar(&self, id: &str) -> Result<(), SyncError> {
        let id = allocator::normalize_id(id);
        {
            let mut data = self.data.write().await;
            if !data.registrars.iter().any(|r| r.id == id) {
                return Err(SyncError::NotFound {
                    kind: "registrar",
                    id,
                });
            }
            data.registrars.retain(|r| r.id != id);
            self.persist_registrars(&data)?;
        }
        match self.remote.delete_registrar(&id).await {
            Ok(()) => {
                if let Err(err) = self.adopt_remote_registrars(None).await {
                    tracing::warn!(error = %err, "registrar re-fetch after delete failed");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, id = %id, "remote registrar delete failed; removed locally");
            }
        }
        Ok(())
    }

    // ---- members ---------------------------------------------------------

    /// Creates a member, allocating a member code unless one was supplied.
    ///
    /// # Errors
    ///
    /// [`SyncError::Validation`] when the name is blank;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn create_member(&self, draft: Member) -> Result<Member, SyncError> {
        if draft.name.trim().is_empty() {
            return Err(SyncError::Validation("member name is required".to_string()));
        }
        let mut record = draft;
        {
            let data = self.data.read().await;
            record.member_code =
                allocator::next_member_code(&data.members, Some(record.member_code.as_str()));
        }
        match self.remote.create_member(&record).await {
            Ok(created) => {
                let merged = merge::overlay_record(&created, &record)?;
                if let Err(err) = self.adopt_remote_members(Some(&merged)).await {
                    tracing::warn!(error = %err, "member re-fetch failed; keeping local copy");
                    self.upsert_member_locally(&merged).await?;
                }
                Ok(merged)
            }
            Err(err) => {
                tracing::warn!(error = %err, "remote member create failed; writing locally");
                self.upsert_member_locally(&record).await?;
                Ok(record)
            }
        }
    }

    /// Updates a member by code, remote-first with local fallback.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when no member carries the code;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn update_member(&self, record: Member) -> Result<Member, SyncError> {
        let code = record.normalized_code();
        let known = self
            .data
            .read()
            .await
            .members
            .iter()
            .any(|m| m.normalized_code() == code);
        if !known {
            return Err(SyncError::NotFound {
                kind: "member",
                id: record.member_code,
            });
        }
        match self.remote.update_member(&record).await {
            Ok(echoed) => {
                let merged = merge::overlay_record(&echoed, &record)?;
                if let Err(err) = self.adopt_remote_members(Some(&merged)).await {
                    tracing::warn!(error = %err, "member re-fetch failed; keeping local copy");
                    self.upsert_member_locally(&merged).await?;
                }
                Ok(merged)
            }
            Err(err) => {
                tracing::warn!(error = %err, code = %record.member_code, "remote member update failed; writing locally");
                self.upsert_member_locally(&record).await?;
                Ok(record)
            }
        }
    }

    /// Deletes a member by code.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] when no member carries the code;
    /// [`SyncError::Cache`] when local persistence fails.
    pub async fn delete_member(&self, code: &str) -> Result<(), SyncError> {
        let normalized = code.trim().to_lowercase();
        {
            let mut data = self.data.write().await;
            if !data.members.iter().any(|m| m.normalized_code() == normalized) {
                return Err(SyncError::NotFound {
                    kind: "member",
                    id: code.to_string(),
                });
            }
            data.members.retain(|m| m.normalized_code() != normalized);
            self.persist_members(&data)?;
        }
        match self.remote.delete_member(code).await {
            Ok(()) => {
                if let Err(err) = self.adopt_remote_members(None).await {
                    tracing::warn!(error = %err, "member re-fetch after delete failed");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, code, "remote member delete failed; removed locally");
            }
        }
        Ok(())
    }

    /// Re-aggregates members from the ledger and bulk-syncs them remotely.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when local persistence fails. Remote bulk-sync
    /// failure is absorbed.
    pub async fn sync_members(&self) -> Result<Vec<Member>, SyncError> {
        self.refresh_members().await?;
        Ok(self.members().await)
    }

    // ---- ledger entries --------------------------------------------------

    /// Records a new ledger entry.
    ///
    /// The flow is: validate, re-fetch the ledger for the freshest
    /// snapshot (best-effort), run the duplicate guard, allocate the
    /// serial immediately before the write, consume the approval PIN for
    /// expenses, then write through with local fallback. Members are
    /// re-aggregated afterwards.
    ///
    /// # Errors
    ///
    /// Validation-class errors ([`SyncError::Validation`],
    /// [`SyncError::DuplicateName`], [`SyncError::DuplicatePhone`],
    /// [`SyncError::PinMismatch`], [`SyncError::NotFound`]) block the
    /// write; [`SyncError::Cache`] on local persistence failure.
    pub async fn create_entry(
        &self,
        draft: LedgerEntry,
        pin: Option<&str>,
    ) -> Result<LedgerEntry, SyncError> {
        let mut record = draft;
        record.event_id = allocator::normalize_id(&record.event_id);
        normalize_entry_amount(&mut record);
        validate_entry(&record)?;

        let is_expense = matches!(record.kind, Some(EntryKind::Expense));
        {
            let data = self.data.read().await;
            let Some(event) = data.find_event(&record.event_id) else {
                return Err(SyncError::NotFound {
                    kind: "event",
                    id: record.event_id,
                });
            };
            if is_expense {
                let candidate = pin.unwrap_or_default();
                if !pins::validate(event, candidate) {
                    return Err(SyncError::PinMismatch);
                }
            }
        }

        // Freshest available collection immediately before allocation;
        // narrows (does not close) the concurrent-station serial race.
        self.refresh_entries().await;
        {
            let data = self.data.read().await;
            guard::check_new_entry(&data.entries, &record)?;
            if record.id.trim().is_empty() {
                record.id = allocator::next_ledger_serial(&data.entries, &record.event_id);
            } else {
                record.id = allocator::normalize_id(&record.id);
            }
            if record.is_contribution() {
                record.member_code =
                    allocator::next_member_code(&data.members, Some(record.member_code.as_str()));
            }
        }

        if is_expense {
            let candidate = pin.unwrap_or_default();
            self.consume_pin(&record.event_id, candidate, &record.id, PinAction::Expense)
                .await?;
        }

        match self.remote.create_entry(&record).await {
            Ok(created) => {
                let mut merged = merge::overlay_record(&created, &record)?;
                // The remote serial is authoritative; it may renumber.
                if !created.id.trim().is_empty() {
                    merged.id = allocator::normalize_id(&created.id);
                }
                if let Err(err) = self.adopt_remote_entries(Some(&merged)).await {
                    tracing::warn!(error = %err, "entry re-fetch failed; keeping local copy");
                    self.upsert_entry_locally(&merged).await?;
                }
                record = merged;
            }
            Err(err) => {
                tracing::warn!(error = %err, key = %record.composite_key(), "remote entry create failed; writing locally");
                self.upsert_entry_locally(&record).await?;
            }
        }

        self.refresh_members().await?;
        Ok(record)
    }

    /// Edits a ledger entry. Amount decreases are PIN-gated; increases
    /// and non-financial edits persist directly.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for an unknown entry,
    /// [`SyncError::PinMismatch`] when a decrease lacks a valid PIN,
    /// [`SyncError::Validation`] for malformed amounts or denominations,
    /// and [`SyncError::Cache`] on local persistence failure.
    pub async fn update_entry(
        &self,
        record: LedgerEntry,
        pin: Option<&str>,
    ) -> Result<LedgerEntry, SyncError> {
        let mut record = record;
        record.id = allocator::normalize_id(&record.id);
        record.event_id = allocator::normalize_id(&record.event_id);
        normalize_entry_amount(&mut record);
        validate_entry(&record)?;

        let existing = {
            let data = self.data.read().await;
            data.find_entry(&record.event_id, &record.id)
                .cloned()
                .ok_or_else(|| SyncError::NotFound {
                    kind: "ledger entry",
                    id: record.composite_key(),
                })?
        };

        if record.amount < existing.amount {
            let candidate = pin.unwrap_or_default();
            self.consume_pin(&record.event_id, candidate, &record.id, PinAction::Edit)
                .await?;
        }

        match self.remote.update_entry(&record).await {
            Ok(echoed) => {
                let merged = merge::overlay_record(&echoed, &record)?;
                if let Err(err) = self.adopt_remote_entries(Some(&merged)).await {
                    tracing::warn!(error = %err, "entry re-fetch failed; keeping local copy");
                    self.upsert_entry_locally(&merged).await?;
                }
                record = merged;
            }
            Err(err) => {
                tracing::warn!(error = %err, key = %record.composite_key(), "remote entry update failed; writing locally");
                self.upsert_entry_locally(&record).await?;
            }
        }

        self.refresh_members().await?;
        Ok(record)
    }

    /// Deletes a ledger entry. Always PIN-gated.
    ///
    /// The serial is never reused: allocation is `max + 1` over surviving
    /// entries, so a deleted tail serial stays retired as long as any
    /// higher serial exists, and interior gaps are permanent.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for an unknown entry,
    /// [`SyncError::PinMismatch`] without a valid PIN,
    /// [`SyncError::Cache`] on local persistence failure.
    pub async fn delete_entry(&self, event_id: &str, id: &str, pin: &str) -> Result<(), SyncError> {
        let event_id = allocator::normalize_id(event_id);
        let id = allocator::normalize_id(id);
        {
            let data = self.data.read().await;
            if data.find_entry(&event_id, &id).is_none() {
                return Err(SyncError::NotFound {
                    kind: "ledger entry",
                    id: format!("{event_id}::{id}"),
                });
            }
        }
        self.consume_pin(&event_id, pin, &id, PinAction::Delete)
            .await?;

        {
            let mut data = self.data.write().await;
            data.entries
                .retain(|e| !(e.event_id == event_id && e.id == id));
            self.persist_entries(&data)?;
        }
        match self.remote.delete_entry(&id).await {
            Ok(()) => {
                if let Err(err) = self.adopt_remote_entries(None).await {
                    tracing::warn!(error = %err, "entry re-fetch after delete failed");
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, key = %format!("{event_id}::{id}"), "remote entry delete failed; removed locally");
            }
        }

        self.refresh_members().await?;
        Ok(())
    }

    // ---- approval pins ---------------------------------------------------

    /// Issues a fresh PIN set for the event, replacing the prior set.
    ///
    /// Replacing a non-empty set invalidates codes already distributed,
    /// so it requires `confirm_replace`.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for an unknown event,
    /// [`SyncError::Validation`] when confirmation is missing or the
    /// count is impossible, [`SyncError::Cache`] on persistence failure.
    pub async fn generate_pins(
        &self,
        event_id: &str,
        count: usize,
        confirm_replace: bool,
    ) -> Result<Vec<PinRecord>, SyncError> {
        let fresh = pins::generate(count)?;
        let snapshot = {
            let mut data = self.data.write().await;
            let Some(event) = data.find_event_mut(event_id) else {
                return Err(SyncError::NotFound {
                    kind: "event",
                    id: event_id.to_string(),
                });
            };
            if !event.approval_pins.is_empty() && !confirm_replace {
                return Err(SyncError::Validation(
                    "event already has issued pins; replacing them invalidates \
                     distributed codes and requires confirmation"
                        .to_string(),
                ));
            }
            event.approval_pins = fresh.clone();
            let snapshot = event.clone();
            self.persist_events(&data)?;
            snapshot
        };
        if let Err(err) = self.remote.update_event(&snapshot).await {
            tracing::warn!(error = %err, event_id, "pin set not persisted remotely");
        }
        Ok(fresh)
    }

    /// Textual PIN validity check. `true` even for consumed PINs.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for an unknown event.
    pub async fn validate_pin(&self, event_id: &str, pin: &str) -> Result<bool, SyncError> {
        let data = self.data.read().await;
        let Some(event) = data.find_event(event_id) else {
            return Err(SyncError::NotFound {
                kind: "event",
                id: event_id.to_string(),
            });
        };
        Ok(pins::validate(event, pin))
    }

    /// Records a PIN usage event and persists it, locally always and
    /// remotely best-effort.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotFound`] for an unknown event,
    /// [`SyncError::PinMismatch`] when the PIN does not match,
    /// [`SyncError::Cache`] on local persistence failure.
    pub async fn consume_pin(
        &self,
        event_id: &str,
        pin: &str,
        entry_id: &str,
        action: PinAction,
    ) -> Result<(), SyncError> {
        let snapshot = {
            let mut data = self.data.write().await;
            let Some(event) = data.find_event_mut(event_id) else {
                return Err(SyncError::NotFound {
                    kind: "event",
                    id: event_id.to_string(),
                });
            };
            pins::consume(event, pin, entry_id, action)?;
            let snapshot = event.clone();
            self.persist_events(&data)?;
            snapshot
        };
        if let Err(err) = self.remote.update_event(&snapshot).await {
            tracing::warn!(error = %err, event_id, "pin usage not persisted remotely");
        }
        Ok(())
    }

    // ---- settings --------------------------------------------------------

    /// Saves the settings document: top-level merge over the current one,
    /// remote-first with local fallback.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] on local persistence failure.
    pub async fn save_settings(&self, incoming: Settings) -> Result<Settings, SyncError> {
        let merged = self.data.read().await.settings.merged_with(&incoming);
        let adopted = match self.remote.save_settings(&merged).await {
            Ok(echoed) if !echoed.is_empty() => echoed,
            Ok(_) => merged.clone(),
            Err(err) => {
                tracing::warn!(error = %err, "remote settings save failed; keeping local document");
                merged.clone()
            }
        };
        let mut data = self.data.write().await;
        data.settings = adopted.clone();
        self.persist_settings(&data)?;
        Ok(adopted)
    }

    // ---- export / import -------------------------------------------------

    /// Exports all five collections from the local cache as one
    /// timestamped document.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the cache cannot be read.
    pub async fn export(&self) -> Result<CacheExport, SyncError> {
        // The cache is the durable source of truth; flush the snapshot
        // first so an export always matches what accessors return.
        {
            let data = self.data.read().await;
            self.persist_events(&data)?;
            self.persist_registrars(&data)?;
            self.persist_members(&data)?;
            self.persist_entries(&data)?;
            self.persist_settings(&data)?;
        }
        persistence::export_all(&self.cache)
    }

    /// Imports an export document, replacing all five collections and
    /// reloading the in-memory snapshot.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the cache cannot be written or reloaded.
    pub async fn import(&self, export: &CacheExport) -> Result<(), SyncError> {
        persistence::import_all(&self.cache, export)?;
        let mut data = self.data.write().await;
        *data = Self::load_dataset(&self.cache)?;
        Ok(())
    }

    // ---- internals -------------------------------------------------------

    async fn adopt_remote_events(&self, edited: Option<&Event>) -> Result<(), SyncError> {
        let mut fetched = self.remote.fetch_events().await?;
        for event in &mut fetched {
            event.id = allocator::normalize_id(&event.id);
        }
        if let Some(edited) = edited {
            apply_overlay(&mut fetched, edited, |e| e.id.clone())?;
        }
        let mut data = self.data.write().await;
        data.events = fetched;
        self.persist_events(&data)
    }

    async fn adopt_remote_registrars(&self, edited: Option<&Registrar>) -> Result<(), SyncError> {
        let mut fetched = self.remote.fetch_registrars().await?;
        for registrar in &mut fetched {
            registrar.id = allocator::normalize_id(&registrar.id);
        }
        if let Some(edited) = edited {
            apply_overlay(&mut fetched, edited, |r| r.id.clone())?;
        }
        let mut data = self.data.write().await;
        data.registrars = fetched;
        self.persist_registrars(&data)
    }

    async fn adopt_remote_members(&self, edited: Option<&Member>) -> Result<(), SyncError> {
        let mut fetched = self.remote.fetch_members().await?;
        if let Some(edited) = edited {
            apply_overlay(&mut fetched, edited, Member::normalized_code)?;
        }
        let mut data = self.data.write().await;
        data.members = fetched;
        self.persist_members(&data)
    }

    /// Adopts the remote ledger while retaining local-only entries (those
    /// awaiting bootstrap backfill); dropping them here would lose
    /// offline work recorded since the last reconciliation.
    async fn adopt_remote_entries(&self, edited: Option<&LedgerEntry>) -> Result<(), SyncError> {
        let mut fetched = self.remote.fetch_entries(None).await?;
        for entry in &mut fetched {
            entry.id = allocator::normalize_id(&entry.id);
            entry.event_id = allocator::normalize_id(&entry.event_id);
        }
        if let Some(edited) = edited {
            apply_overlay(&mut fetched, edited, LedgerEntry::composite_key)?;
        }
        let mut data = self.data.write().await;
        let known: std::collections::HashSet<String> =
            fetched.iter().map(LedgerEntry::composite_key).collect();
        for local in &data.entries {
            if !known.contains(&local.composite_key()) {
                fetched.push(local.clone());
            }
        }
        data.entries = fetched;
        self.persist_entries(&data)
    }

    /// Best-effort ledger refresh before serial allocation. Failure keeps
    /// the local snapshot; the allocation still proceeds.
    async fn refresh_entries(&self) {
        if let Err(err) = self.adopt_remote_entries(None).await {
            tracing::debug!(error = %err, "pre-allocation ledger refresh failed; using local snapshot");
        }
    }

    /// Rebuilds the member collection from the ledger, persists it, and
    /// bulk-syncs it remotely best-effort. Members without any ledger
    /// entry (created manually) are preserved.
    async fn refresh_members(&self) -> Result<(), SyncError> {
        let members = {
            let mut data = self.data.write().await;
            let rebuilt = aggregate::members_from_entries(&data.entries, &data.members);
            let mut by_code: std::collections::HashMap<String, Member> = rebuilt
                .into_iter()
                .map(|m| (m.normalized_code(), m))
                .collect();
            let mut next: Vec<Member> = Vec::with_capacity(data.members.len());
            for member in &data.members {
                match by_code.remove(&member.normalized_code()) {
                    Some(updated) => next.push(updated),
                    None => next.push(member.clone()),
                }
            }
            let mut appended: Vec<Member> = by_code.into_values().collect();
            appended.sort_by(|a, b| a.member_code.cmp(&b.member_code));
            next.extend(appended);
            data.members = next;
            self.persist_members(&data)?;
            data.members.clone()
        };
        if let Err(err) = self.remote.bulk_sync_members(&members).await {
            tracing::warn!(error = %err, "member bulk sync failed; members kept locally");
        }
        Ok(())
    }

    async fn upsert_event_locally(&self, record: &Event) -> Result<(), SyncError> {
        let mut data = self.data.write().await;
        match data.events.iter_mut().find(|e| e.id == record.id) {
            Some(slot) => *slot = record.clone(),
            None => data.events.push(record.clone()),
        }
        self.persist_events(&data)
    }

    async fn upsert_registrar_locally(&self, record: &Registrar) -> Result<(), SyncError> {
        let mut data = self.data.write().await;
        match data.registrars.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record.clone(),
            None => data.registrars.push(record.clone()),
        }
        self.persist_registrars(&data)
    }

    async fn upsert_member_locally(&self, record: &Member) -> Result<(), SyncError> {
        let code = record.normalized_code();
        let mut data = self.data.write().await;
        match data
            .members
            .iter_mut()
            .find(|m| m.normalized_code() == code)
        {
            Some(slot) => *slot = record.clone(),
            None => data.members.push(record.clone()),
        }
        self.persist_members(&data)
    }

    async fn upsert_entry_locally(&self, record: &LedgerEntry) -> Result<(), SyncError> {
        let key = record.composite_key();
        let mut data = self.data.write().await;
        match data
            .entries
            .iter_mut()
            .find(|e| e.composite_key() == key)
        {
            Some(slot) => *slot = record.clone(),
            None => data.entries.push(record.clone()),
        }
        self.persist_entries(&data)
    }

    fn persist_events(&self, data: &Dataset) -> Result<(), SyncError> {
        self.cache.write_collection(Collection::Events, &data.events)
    }

    fn persist_registrars(&self, data: &Dataset) -> Result<(), SyncError> {
        self.cache
            .write_collection(Collection::Registrars, &data.registrars)
    }

    fn persist_members(&self, data: &Dataset) -> Result<(), SyncError> {
        self.cache
            .write_collection(Collection::Members, &data.members)
    }

    fn persist_entries(&self, data: &Dataset) -> Result<(), SyncError> {
        self.cache
            .write_collection(Collection::MoiEntries, &data.entries)
    }

    fn persist_settings(&self, data: &Dataset) -> Result<(), SyncError> {
        self.cache
            .write_document(Collection::Settings, &data.settings)
    }
}

/// Replaces (or appends) the record matching `edited` in `fetched`,
/// re-applying the edited fields over the fetched echo.
fn apply_overlay<T, F>(fetched: &mut Vec<T>, edited: &T, key: F) -> Result<(), SyncError>
where
    T: Clone + serde::Serialize + serde::de::DeserializeOwned,
    F: Fn(&T) -> String,
{
    let edited_key = key(edited);
    match fetched.iter_mut().find(|item| key(item) == edited_key) {
        Some(slot) => {
            *slot = merge::overlay_record(slot, edited)?;
        }
        None => fetched.push(edited.clone()),
    }
    Ok(())
}

/// Forces the amount sign convention: expenses negative, change zero-sum.
fn normalize_entry_amount(record: &mut LedgerEntry) {
    if matches!(record.kind, Some(EntryKind::Expense)) {
        record.amount = -record.amount.abs();
    }
}

/// Synchronous field validation shared by entry create and update.
fn validate_entry(record: &LedgerEntry) -> Result<(), SyncError> {
    match record.kind {
        None => {
            if record.name.trim().is_empty() {
                return Err(SyncError::Validation(
                    "contributor name is required".to_string(),
                ));
            }
            if record.amount <= 0.0 {
                return Err(SyncError::Validation(
                    "contribution amount must be positive".to_string(),
                ));
            }
        }
        Some(EntryKind::Expense) => {
            if record.amount == 0.0 {
                return Err(SyncError::Validation(
                    "expense amount must be non-zero".to_string(),
                ));
            }
        }
        Some(EntryKind::Change) => {
            if record.amount != 0.0 {
                return Err(SyncError::Validation(
                    "change entries must balance to zero".to_string(),
                ));
            }
        }
    }
    // Change entries encode both directions of the exchange; only
    // contributions and expenses must tally against the amount.
    if !matches!(record.kind, Some(EntryKind::Change)) && !record.denominations.is_empty() {
        let total = record.denomination_total();
        if (total - record.amount.abs()).abs() > 0.005 {
            return Err(SyncError::Validation(format!(
                "denomination total {total} does not match amount {}",
                record.amount
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::persistence::MemoryCache;

    #[derive(Debug, Default)]
    struct FakeState {
        events: Mutex<Vec<Event>>,
        registrars: Mutex<Vec<Registrar>>,
        members: Mutex<Vec<Member>>,
        entries: Mutex<Vec<LedgerEntry>>,
        settings: Mutex<Settings>,
        offline: AtomicBool,
        bulk_syncs: AtomicUsize,
    }

    /// Shared-state remote double; clones see the same store, so tests can
    /// flip connectivity and inspect server state after the coordinator
    /// takes ownership of its copy.
    #[derive(Debug, Clone, Default)]
    struct FakeRemote {
        inner: Arc<FakeState>,
    }

    fn with<T, F, O>(mutex: &Mutex<T>, f: F) -> Result<O, SyncError>
    where
        F: FnOnce(&mut T) -> O,
    {
        let mut guard = mutex
            .lock()
            .map_err(|_| SyncError::RemoteUnavailable("fake lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }

    impl FakeRemote {
        fn go_offline(&self) {
            self.inner.offline.store(true, Ordering::SeqCst);
        }

        fn go_online(&self) {
            self.inner.offline.store(false, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), SyncError> {
            if self.inner.offline.load(Ordering::SeqCst) {
                return Err(SyncError::RemoteUnavailable("simulated outage".to_string()));
            }
            Ok(())
        }

        fn remote_events(&self) -> Vec<Event> {
            with(&self.inner.events, |e| e.clone()).unwrap_or_default()
        }

        fn remote_entries(&self) -> Vec<LedgerEntry> {
            with(&self.inner.entries, |e| e.clone()).unwrap_or_default()
        }

        fn remote_members(&self) -> Vec<Member> {
            with(&self.inner.members, |m| m.clone()).unwrap_or_default()
        }

        fn bulk_sync_count(&self) -> usize {
            self.inner.bulk_syncs.load(Ordering::SeqCst)
        }
    }

    impl RemoteStore for FakeRemote {
        async fn fetch_events(&self) -> Result<Vec<Event>, SyncError> {
            self.check()?;
            with(&self.inner.events, |events| events.clone())
        }

        async fn create_event(&self, event: &Event) -> Result<Event, SyncError> {
            self.check()?;
            with(&self.inner.events, |events| {
                let mut created = event.clone();
                if created.id.trim().is_empty() {
                    created.id = allocator::next_entity_id(events.iter().map(|e| e.id.as_str()));
                }
                events.push(created.clone());
                created
            })
        }

        async fn update_event(&self, event: &Event) -> Result<Event, SyncError> {
            self.check()?;
            with(&self.inner.events, |events| {
                match events.iter_mut().find(|e| e.id == event.id) {
                    Some(slot) => *slot = event.clone(),
                    None => events.push(event.clone()),
                }
                event.clone()
            })
        }

        async fn delete_event(&self, id: &str) -> Result<(), SyncError> {
            self.check()?;
            with(&self.inner.events, |events| events.retain(|e| e.id != id))
        }

        async fn fetch_registrars(&self) -> Result<Vec<Registrar>, SyncError> {
            self.check()?;
            with(&self.inner.registrars, |registrars| registrars.clone())
        }

        async fn create_registrar(&self, registrar: &Registrar) -> Result<Registrar, SyncError> {
            self.check()?;
            with(&self.inner.registrars, |registrars| {
                let mut created = registrar.clone();
                if created.id.trim().is_empty() {
                    created.id =
                        allocator::next_entity_id(registrars.iter().map(|r| r.id.as_str()));
                }
                registrars.push(created.clone());
                created
            })
        }

        async fn update_registrar(&self, registrar: &Registrar) -> Result<Registrar, SyncError> {
            self.check()?;
            with(&self.inner.registrars, |registrars| {
                match registrars.iter_mut().find(|r| r.id == registrar.id) {
                    Some(slot) => *slot = registrar.clone(),
                    None => registrars.push(registrar.clone()),
                }
                registrar.clone()
            })
        }

        async fn delete_registrar(&self, id: &str) -> Result<(), SyncError> {
            self.check()?;
            with(&self.inner.registrars, |registrars| {
                registrars.retain(|r| r.id != id);
            })
        }

        async fn fetch_members(&self) -> Result<Vec<Member>, SyncError> {
            self.check()?;
            with(&self.inner.members, |members| members.clone())
        }

        async fn create_member(&self, member: &Member) -> Result<Member, SyncError> {
            self.check()?;
            with(&self.inner.members, |members| {
                members.push(member.clone());
                member.clone()
            })
        }

        async fn update_member(&self, member: &Member) -> Result<Member, SyncError> {
            self.check()?;
            let code = member.normalized_code();
            with(&self.inner.members, |members| {
                match members.iter_mut().find(|m| m.normalized_code() == code) {
                    Some(slot) => *slot = member.clone(),
                    None => members.push(member.clone()),
                }
                member.clone()
            })
        }

        async fn delete_member(&self, code: &str) -> Result<(), SyncError> {
            self.check()?;
            let code = code.trim().to_lowercase();
            with(&self.inner.members, |members| {
                members.retain(|m| m.normalized_code() != code);
            })
        }

        async fn bulk_sync_members(&self, members: &[Member]) -> Result<(), SyncError> {
            self.check()?;
            self.inner.bulk_syncs.fetch_add(1, Ordering::SeqCst);
            with(&self.inner.members, |stored| {
                *stored = members.to_vec();
            })
        }

        async fn fetch_entries(
            &self,
            event_id: Option<&str>,
        ) -> Result<Vec<LedgerEntry>, SyncError> {
            self.check()?;
            with(&self.inner.entries, |entries| match event_id {
                None => entries.clone(),
                Some(id) => entries.iter().filter(|e| e.event_id == id).cloned().collect(),
            })
        }

        async fn create_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntry, SyncError> {
            self.check()?;
            with(&self.inner.entries, |entries| {
                entries.push(entry.clone());
                entry.clone()
            })
        }

        async fn update_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntry, SyncError> {
            self.check()?;
            with(&self.inner.entries, |entries| {
                match entries
                    .iter_mut()
                    .find(|e| e.event_id == entry.event_id && e.id == entry.id)
                {
                    Some(slot) => *slot = entry.clone(),
                    None => entries.push(entry.clone()),
                }
                entry.clone()
            })
        }

        async fn delete_entry(&self, id: &str) -> Result<(), SyncError> {
            self.check()?;
            with(&self.inner.entries, |entries| entries.retain(|e| e.id != id))
        }

        async fn fetch_settings(&self) -> Result<Settings, SyncError> {
            self.check()?;
            with(&self.inner.settings, |settings| settings.clone())
        }

        async fn save_settings(&self, settings: &Settings) -> Result<Settings, SyncError> {
            self.check()?;
            with(&self.inner.settings, |stored| {
                *stored = settings.clone();
                stored.clone()
            })
        }
    }

    fn open_coordinator() -> (FakeRemote, SyncCoordinator<FakeRemote, MemoryCache>) {
        let remote = FakeRemote::default();
        let Ok(coordinator) = SyncCoordinator::open(remote.clone(), MemoryCache::new()) else {
            panic!("coordinator open failed");
        };
        (remote, coordinator)
    }

    fn named_event(name: &str) -> Event {
        Event {
            event_name: name.to_string(),
            permission: true,
            ..Event::default()
        }
    }

    fn contribution(event_id: &str, name: &str, amount: f64) -> LedgerEntry {
        LedgerEntry {
            event_id: event_id.to_string(),
            name: name.to_string(),
            amount,
            ..LedgerEntry::default()
        }
    }

    /// Issues a pin set and returns one valid pin plus a code guaranteed
    /// not to be in the set.
    async fn issued_pin(
        coordinator: &SyncCoordinator<FakeRemote, MemoryCache>,
        event_id: &str,
    ) -> (String, String) {
        let Ok(pins) = coordinator.generate_pins(event_id, 3, true).await else {
            panic!("pin generation failed");
        };
        let Some(first) = pins.first() else {
            panic!("no pins issued");
        };
        let Some(bogus) = ["0000", "0001", "0002", "0003"]
            .into_iter()
            .find(|code| pins.iter().all(|r| r.pin != *code))
        else {
            panic!("no unissued code available");
        };
        (first.pin.clone(), bogus.to_string())
    }

    #[tokio::test]
    async fn offline_event_create_allocates_local_id() {
        let (remote, coordinator) = open_coordinator();
        remote.go_offline();

        let Ok(created) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("offline create must still succeed");
        };
        assert_eq!(created.id, "0001");
        assert_eq!(coordinator.events().await.len(), 1);
        assert!(remote.remote_events().is_empty());
    }

    #[tokio::test]
    async fn online_event_create_adopts_remote_id() {
        let (remote, coordinator) = open_coordinator();
        let Ok(first) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(second) = coordinator.create_event(named_event("Housewarming")).await else {
            panic!("create failed");
        };
        assert_eq!(first.id, "0001");
        assert_eq!(second.id, "0002");
        assert_eq!(remote.remote_events().len(), 2);
        assert_eq!(coordinator.events().await.len(), 2);
    }

    #[tokio::test]
    async fn blank_event_name_is_rejected() {
        let (_remote, coordinator) = open_coordinator();
        let result = coordinator.create_event(named_event("  ")).await;
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_remote() {
        let (remote, coordinator) = open_coordinator();
        remote.go_offline();
        let Ok(_) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("offline create failed");
        };

        let Ok(report) = coordinator.bootstrap().await else {
            panic!("bootstrap must absorb the outage");
        };
        assert!(!report.remote_reachable);
        // Local data is untouched in local-only mode.
        assert_eq!(coordinator.events().await.len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_backfills_empty_remote_from_local() {
        let (remote, coordinator) = open_coordinator();
        remote.go_offline();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("offline create failed");
        };
        let Ok(_) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("offline entry failed");
        };

        remote.go_online();
        let Ok(report) = coordinator.bootstrap().await else {
            panic!("bootstrap failed");
        };
        assert!(report.remote_reachable);
        assert_eq!(report.pushed_events, 1);
        assert_eq!(report.pushed_entries, 1);
        assert_eq!(report.failed_pushes, 0);
        assert_eq!(remote.remote_events().len(), 1);
        assert_eq!(remote.remote_entries().len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_pushes_only_entries_missing_remotely() {
        let (remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(shared) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };

        remote.go_offline();
        let Ok(_) = coordinator
            .create_entry(contribution(&event.id, "Murugan", 300.0), None)
            .await
        else {
            panic!("offline entry failed");
        };
        remote.go_online();

        let Ok(report) = coordinator.bootstrap().await else {
            panic!("bootstrap failed");
        };
        // Only the offline-recorded entry is pushed; the shared one is
        // recognized by its composite key.
        assert_eq!(report.pushed_entries, 1);
        let keys: Vec<String> = remote
            .remote_entries()
            .iter()
            .map(LedgerEntry::composite_key)
            .collect();
        assert!(keys.contains(&shared.composite_key()));
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn entry_serials_are_padded_and_sequential() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(first) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };
        let Ok(second) = coordinator
            .create_entry(contribution(&event.id, "Murugan", 300.0), None)
            .await
        else {
            panic!("entry failed");
        };
        assert_eq!(first.id, "0001");
        assert_eq!(second.id, "0002");
        assert_eq!(first.member_code, "MC000001");
        assert_eq!(second.member_code, "MC000002");
    }

    #[tokio::test]
    async fn duplicate_name_in_same_event_is_rejected() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(_) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };
        let result = coordinator
            .create_entry(contribution(&event.id, "RAMASAMY", 300.0), None)
            .await;
        assert!(matches!(result, Err(SyncError::DuplicateName { .. })));
        assert_eq!(coordinator.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn expense_requires_a_valid_pin() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let (pin, bogus) = issued_pin(&coordinator, &event.id).await;

        let expense = LedgerEntry {
            kind: Some(EntryKind::Expense),
            amount: 250.0,
            note: "generator rent".to_string(),
            ..contribution(&event.id, "", 0.0)
        };

        let denied = coordinator.create_entry(expense.clone(), None).await;
        assert!(matches!(denied, Err(SyncError::PinMismatch)));
        let denied = coordinator.create_entry(expense.clone(), Some(&bogus)).await;
        assert!(matches!(denied, Err(SyncError::PinMismatch)));

        let Ok(recorded) = coordinator.create_entry(expense, Some(&pin)).await else {
            panic!("pin-approved expense failed");
        };
        // Sign convention is enforced regardless of input.
        assert_eq!(recorded.amount, -250.0);

        let events = coordinator.events().await;
        let Some(stored) = events.first() else {
            panic!("event missing");
        };
        assert!(stored.approval_pins.iter().any(|r| {
            r.pin == pin && r.used && r.used_for == Some(PinAction::Expense)
        }));
    }

    #[tokio::test]
    async fn amount_decrease_requires_pin_increase_does_not() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let (pin, _) = issued_pin(&coordinator, &event.id).await;
        let Ok(entry) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };

        let mut decreased = entry.clone();
        decreased.amount = 400.0;
        let denied = coordinator.update_entry(decreased.clone(), None).await;
        assert!(matches!(denied, Err(SyncError::PinMismatch)));

        let Ok(updated) = coordinator.update_entry(decreased, Some(&pin)).await else {
            panic!("pin-approved decrease failed");
        };
        assert_eq!(updated.amount, 400.0);

        let mut increased = updated.clone();
        increased.amount = 600.0;
        let Ok(_) = coordinator.update_entry(increased, None).await else {
            panic!("increase must not need a pin");
        };
    }

    #[tokio::test]
    async fn interior_serial_gap_is_permanent_after_delete() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let (pin, _) = issued_pin(&coordinator, &event.id).await;
        for name in ["Ramasamy", "Murugan", "Kannan"] {
            let Ok(_) = coordinator
                .create_entry(contribution(&event.id, name, 100.0), None)
                .await
            else {
                panic!("entry failed");
            };
        }

        let Ok(()) = coordinator.delete_entry(&event.id, "0002", &pin).await else {
            panic!("delete failed");
        };
        let Ok(next) = coordinator
            .create_entry(contribution(&event.id, "Velu", 100.0), None)
            .await
        else {
            panic!("entry failed");
        };
        // max + 1 over survivors (0001, 0003), never a refill of 0002.
        assert_eq!(next.id, "0004");
    }

    #[tokio::test]
    async fn delete_entry_without_pin_fails_closed() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let (_, bogus) = issued_pin(&coordinator, &event.id).await;
        let Ok(entry) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };

        let denied = coordinator.delete_entry(&event.id, &entry.id, &bogus).await;
        assert!(matches!(denied, Err(SyncError::PinMismatch)));
        assert_eq!(coordinator.entries().await.len(), 1);
    }

    #[tokio::test]
    async fn deleting_event_retains_its_ledger_entries() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(_) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };

        let Ok(()) = coordinator.delete_event(&event.id).await else {
            panic!("delete failed");
        };
        assert!(coordinator.events().await.is_empty());
        assert_eq!(coordinator.entries_for_event(&event.id).await.len(), 1);

        // The retired event id is never reassigned while its entries exist.
        let Ok(fresh) = coordinator.create_event(named_event("Housewarming")).await else {
            panic!("create failed");
        };
        assert_ne!(fresh.id, event.id);
    }

    #[tokio::test]
    async fn offline_entries_survive_reconnection() {
        let (remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };

        remote.go_offline();
        let Ok(offline_entry) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("offline entry failed");
        };

        remote.go_online();
        let Ok(_) = coordinator
            .create_entry(contribution(&event.id, "Murugan", 300.0), None)
            .await
        else {
            panic!("online entry failed");
        };

        // Adopting the remote ledger must not drop the not-yet-pushed entry.
        let keys: Vec<String> = coordinator
            .entries()
            .await
            .iter()
            .map(LedgerEntry::composite_key)
            .collect();
        assert!(keys.contains(&offline_entry.composite_key()));
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn members_are_rebuilt_from_the_ledger() {
        let (remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        for (name, amount) in [("Ramasamy", 500.0), ("Murugan", 300.0)] {
            let Ok(_) = coordinator
                .create_entry(contribution(&event.id, name, amount), None)
                .await
            else {
                panic!("entry failed");
            };
        }

        let members = coordinator.members().await;
        assert_eq!(members.len(), 2);
        let Some(first) = members.iter().find(|m| m.name == "Ramasamy") else {
            panic!("aggregated member missing");
        };
        assert_eq!(first.amount, 500.0);
        assert!(remote.bulk_sync_count() >= 1);
        assert_eq!(remote.remote_members().len(), 2);
    }

    #[tokio::test]
    async fn manual_member_gets_generated_code() {
        let (remote, coordinator) = open_coordinator();
        remote.go_offline();
        let Ok(member) = coordinator
            .create_member(Member {
                name: "Ramasamy".to_string(),
                ..Member::default()
            })
            .await
        else {
            panic!("offline member create failed");
        };
        assert_eq!(member.member_code, "MC000001");
        assert_eq!(coordinator.members().await.len(), 1);
    }

    #[tokio::test]
    async fn pin_replacement_requires_confirmation() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(first_set) = coordinator.generate_pins(&event.id, 5, false).await else {
            panic!("initial issue failed");
        };
        assert_eq!(first_set.len(), 5);

        let denied = coordinator.generate_pins(&event.id, 5, false).await;
        assert!(matches!(denied, Err(SyncError::Validation(_))));

        let Ok(second_set) = coordinator.generate_pins(&event.id, 2, true).await else {
            panic!("confirmed replacement failed");
        };
        assert_eq!(second_set.len(), 2);
        let events = coordinator.events().await;
        let Some(stored) = events.first() else {
            panic!("event missing");
        };
        assert_eq!(stored.approval_pins.len(), 2);
    }

    #[tokio::test]
    async fn settings_merge_keeps_existing_non_empty_fields() {
        let (remote, coordinator) = open_coordinator();
        let Ok(_) = coordinator
            .save_settings(Settings {
                default_event_id: "0001".to_string(),
                ..Settings::default()
            })
            .await
        else {
            panic!("save failed");
        };

        remote.go_offline();
        let Ok(merged) = coordinator
            .save_settings(Settings {
                storage_driver: "local".to_string(),
                ..Settings::default()
            })
            .await
        else {
            panic!("offline save must fall back");
        };
        assert_eq!(merged.default_event_id, "0001");
        assert_eq!(merged.storage_driver, "local");
        assert_eq!(coordinator.settings().await, merged);
    }

    #[tokio::test]
    async fn bootstrap_falls_back_to_default_settings() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(_) = coordinator.bootstrap().await else {
            panic!("bootstrap failed");
        };
        assert_eq!(coordinator.settings().await.storage_driver, "remote");
    }

    #[tokio::test]
    async fn export_import_moves_data_between_devices() {
        let (remote, coordinator) = open_coordinator();
        remote.go_offline();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let Ok(_) = coordinator
            .create_entry(contribution(&event.id, "Ramasamy", 500.0), None)
            .await
        else {
            panic!("entry failed");
        };
        let Ok(export) = coordinator.export().await else {
            panic!("export failed");
        };

        let (other_remote, other) = open_coordinator();
        other_remote.go_offline();
        let Ok(()) = other.import(&export).await else {
            panic!("import failed");
        };
        assert_eq!(other.events().await.len(), 1);
        assert_eq!(other.entries().await.len(), 1);
        assert_eq!(other.members().await.len(), 1);
    }

    #[tokio::test]
    async fn change_entry_must_balance_to_zero() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let change = LedgerEntry {
            kind: Some(EntryKind::Change),
            amount: 10.0,
            ..contribution(&event.id, "", 0.0)
        };
        let result = coordinator.create_entry(change, None).await;
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }

    #[tokio::test]
    async fn denomination_total_must_match_amount() {
        let (_remote, coordinator) = open_coordinator();
        let Ok(event) = coordinator.create_event(named_event("Wedding")).await else {
            panic!("create failed");
        };
        let mut entry = contribution(&event.id, "Ramasamy", 500.0);
        entry.denominations.insert("100".to_string(), 3);
        let result = coordinator.create_entry(entry, None).await;
        assert!(matches!(result, Err(SyncError::Validation(_))));
    }
}
