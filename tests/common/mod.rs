// Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use headit_sync::{
    HostHeaders, KvStore, MemoryStore, SessionBuilder, SyncClient, SyncError, SyncSession, UiMode,
    sync::{Delivery, Transport},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

/// Transport that records every request instead of sending it
#[derive(Clone, Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<(String, Vec<HostHeaders>)>>>,
    fail: bool,
}

impl RecordingTransport {
    /// Records requests but answers each one with a 503
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<HostHeaders>)> {
        self.calls.lock().expect("recording lock poisoned").clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_rules(&self, url: &str, body: &[HostHeaders]) -> Result<Delivery, SyncError> {
        self.calls
            .lock()
            .expect("recording lock poisoned")
            .push((url.to_owned(), body.to_vec()));

        if self.fail {
            return Err(SyncError::Status {
                url: url.to_owned(),
                status: 503,
                body: "unavailable".to_owned(),
            });
        }
        Ok(Delivery {
            status: 200,
            body: "ok".to_owned(),
        })
    }
}

pub fn session_with(
    mode: UiMode,
    host: &str,
    storage: Arc<dyn KvStore>,
    transport: &RecordingTransport,
) -> SyncSession<RecordingTransport> {
    SessionBuilder::new()
        .mode(mode)
        .host(host)
        .build(storage, SyncClient::with_transport(transport.clone()))
}

pub fn memory() -> Arc<dyn KvStore> {
    Arc::new(MemoryStore::new())
}

pub fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

pub fn host_headers(host: &str, pairs: &[(&str, &str)]) -> HostHeaders {
    HostHeaders {
        host: host.to_owned(),
        add_headers: headers(pairs),
    }
}
