use std::{fmt::Display, sync::Arc};

use super::storage::DurableStorage;
use crate::models::HistoryEntry;

/// Stored value equivalent to "no history yet"
const EMPTY_HISTORY: &str = "[]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    View,
    Purchase,
}

impl Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryKind::View => write!(f, "product view"),
            HistoryKind::Purchase => write!(f, "purchase"),
        }
    }
}

/// Storage key of one history log
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub scope: String,
    pub kind: HistoryKind,
}

impl HistoryKey {
    pub fn new(kind: HistoryKind, scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            kind,
        }
    }
}

impl Display for HistoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            HistoryKind::View => write!(f, "{}:productViewHistory", self.scope),
            HistoryKind::Purchase => write!(f, "{}:purchaseHistory", self.scope),
        }
    }
}

/// Read-and-repair access to the persisted browsing logs
///
/// Writes happen elsewhere on the page. This store only reads, and deletes a
/// log whose stored value no longer decodes as a JSON array.
#[derive(Clone)]
pub struct HistoryStore {
    storage: Arc<dyn DurableStorage>,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    /// Loads one history log, always yielding a valid sequence
    ///
    /// A missing or empty value reads as an empty log. A value that fails to
    /// decode is removed from storage and reads as an empty log. Backend
    /// failures are logged and read as an empty log without touching storage.
    pub async fn load(&self, kind: HistoryKind, scope: &str) -> Vec<HistoryEntry> {
        let key = HistoryKey::new(kind, scope).to_string();

        let raw = match self.storage.get_item(&key).await {
            Ok(raw) => raw
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| EMPTY_HISTORY.to_string()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "History storage read failed");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                if let Err(remove_err) = self.storage.remove_item(&key).await {
                    tracing::warn!(key = %key, error = %remove_err, "Failed to purge corrupt history");
                }
                tracing::error!(key = %key, error = %e, "Error parsing {} history", kind);
                Vec::new()
            }
        }
    }

    /// Loads the view and purchase logs for `scope`
    pub async fn load_all(&self, scope: &str) -> (Vec<HistoryEntry>, Vec<HistoryEntry>) {
        tokio::join!(
            self.load(HistoryKind::View, scope),
            self.load(HistoryKind::Purchase, scope)
        )
    }
}
