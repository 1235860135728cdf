//! `reqwest` implementation of the remote ledger service client.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RemoteStore;
use crate::domain::{Collection, Event, LedgerEntry, Member, Registrar, Settings};
use crate::error::SyncError;

/// HTTP client for the remote ledger service.
///
/// Carries an explicit per-request timeout; an unresponsive network is a
/// remote failure, not a hang. Responses must be 2xx `application/json` —
/// anything else maps to [`SyncError::RemoteUnavailable`].
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Creates a client against `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// [`SyncError::RemoteUnavailable`] when the underlying client cannot
    /// be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::RemoteUnavailable(format!("client construction: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, SyncError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::RemoteUnavailable(format!(
                "{context}: status {status}"
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("{context}: non-json body: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SyncError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("GET {path}: {e}")))?;
        Self::decode(response, &format!("GET {path}")).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SyncError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("POST {path}: {e}")))?;
        Self::decode(response, &format!("POST {path}")).await
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SyncError> {
        let response = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("PUT {path}: {e}")))?;
        Self::decode(response, &format!("PUT {path}")).await
    }

    async fn delete_ok(&self, path: &str) -> Result<(), SyncError> {
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .map_err(|e| SyncError::RemoteUnavailable(format!("DELETE {path}: {e}")))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::RemoteUnavailable(format!(
                "DELETE {path}: status {status}"
            )))
        }
    }
}

impl RemoteStore for HttpRemote {
    async fn fetch_events(&self) -> Result<Vec<Event>, SyncError> {
        self.get_json(Collection::Events.remote_path()).await
    }

    async fn create_event(&self, event: &Event) -> Result<Event, SyncError> {
        self.post_json(Collection::Events.remote_path(), event).await
    }

    async fn update_event(&self, event: &Event) -> Result<Event, SyncError> {
        self.put_json(&format!("events/{}", event.id), event).await
    }

    async fn delete_event(&self, id: &str) -> Result<(), SyncError> {
        self.delete_ok(&format!("events/{id}")).await
    }

    async fn fetch_registrars(&self) -> Result<Vec<Registrar>, SyncError> {
        self.get_json(Collection::Registrars.remote_path()).await
    }

    async fn create_registrar(&self, registrar: &Registrar) -> Result<Registrar, SyncError> {
        self.post_json(Collection::Registrars.remote_path(), registrar)
            .await
    }

    async fn update_registrar(&self, registrar: &Registrar) -> Result<Registrar, SyncError> {
        self.put_json(&format!("registrars/{}", registrar.id), registrar)
            .await
    }

    async fn delete_registrar(&self, id: &str) -> Result<(), SyncError> {
        self.delete_ok(&format!("registrars/{id}")).await
    }

    async fn fetch_members(&self) -> Result<Vec<Member>, SyncError> {
        self.get_json(Collection::Members.remote_path()).await
    }

    async fn create_member(&self, member: &Member) -> Result<Member, SyncError> {
        self.post_json(Collection::Members.remote_path(), member).await
    }

    async fn update_member(&self, member: &Member) -> Result<Member, SyncError> {
        self.put_json(&format!("members/{}", member.member_code), member)
            .await
    }

    async fn delete_member(&self, code: &str) -> Result<(), SyncError> {
        self.delete_ok(&format!("members/{code}")).await
    }

    async fn bulk_sync_members(&self, members: &[Member]) -> Result<(), SyncError> {
        let _ack: serde_json::Value = self.post_json("members/bulk-sync", members).await?;
        Ok(())
    }

    async fn fetch_entries(&self, event_id: Option<&str>) -> Result<Vec<LedgerEntry>, SyncError> {
        let path = match event_id {
            Some(id) => format!("moi-entries?eventId={id}"),
            None => Collection::MoiEntries.remote_path().to_string(),
        };
        self.get_json(&path).await
    }

    async fn create_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntry, SyncError> {
        self.post_json(Collection::MoiEntries.remote_path(), entry)
            .await
    }

    async fn update_entry(&self, entry: &LedgerEntry) -> Result<LedgerEntry, SyncError> {
        self.put_json(&format!("moi-entries/{}", entry.id), entry)
            .await
    }

    async fn delete_entry(&self, id: &str) -> Result<(), SyncError> {
        self.delete_ok(&format!("moi-entries/{id}")).await
    }

    async fn fetch_settings(&self) -> Result<Settings, SyncError> {
        // Older service builds respond with `null` before first save.
        let document: Option<Settings> = self.get_json(Collection::Settings.remote_path()).await?;
        Ok(document.unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<Settings, SyncError> {
        let echoed: Option<Settings> = self.post_json("settings/save", settings).await?;
        Ok(echoed.unwrap_or_else(|| settings.clone()))
    }
}
