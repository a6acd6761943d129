/// Page signal bus
///
/// Page-wide context changes arrive as JSON payloads keyed by a fixed set of
/// topics. The aggregator only ever sees typed `PageSignal`s; the bus that
/// carries the raw payloads is pluggable behind `SignalBus`.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt::Display, str::FromStr, sync::Arc};

use crate::{
    error::{AppError, AppResult},
    models::{CategoryContext, PageTypeContext, ProductContext, ShoppingCartContext},
};

pub mod data_layer;

pub use data_layer::DataLayer;

/// Data layer paths the recommendations block listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalTopic {
    PageContext,
    ProductContext,
    CategoryContext,
    ShoppingCartContext,
}

impl SignalTopic {
    pub const ALL: [SignalTopic; 4] = [
        SignalTopic::PageContext,
        SignalTopic::ProductContext,
        SignalTopic::CategoryContext,
        SignalTopic::ShoppingCartContext,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            SignalTopic::PageContext => "pageContext",
            SignalTopic::ProductContext => "productContext",
            SignalTopic::CategoryContext => "categoryContext",
            SignalTopic::ShoppingCartContext => "shoppingCartContext",
        }
    }
}

impl Display for SignalTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl FromStr for SignalTopic {
    type Err = AppError;

    fn from_str(path: &str) -> AppResult<Self> {
        SignalTopic::ALL
            .into_iter()
            .find(|topic| topic.path() == path)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown data layer path: {}", path)))
    }
}

/// A typed context change. `None` means the context was cleared or never set.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSignal {
    Product(Option<ProductContext>),
    Category(Option<CategoryContext>),
    PageType(Option<PageTypeContext>),
    Cart(Option<ShoppingCartContext>),
}

impl PageSignal {
    pub fn topic(&self) -> SignalTopic {
        match self {
            PageSignal::Product(_) => SignalTopic::ProductContext,
            PageSignal::Category(_) => SignalTopic::CategoryContext,
            PageSignal::PageType(_) => SignalTopic::PageContext,
            PageSignal::Cart(_) => SignalTopic::ShoppingCartContext,
        }
    }

    /// Decodes a raw data layer payload published under `topic`
    pub fn from_payload(topic: SignalTopic, payload: &Value) -> AppResult<Self> {
        let signal = match topic {
            SignalTopic::ProductContext => PageSignal::Product(decode(topic, payload)?),
            SignalTopic::CategoryContext => PageSignal::Category(decode(topic, payload)?),
            SignalTopic::PageContext => PageSignal::PageType(decode(topic, payload)?),
            SignalTopic::ShoppingCartContext => PageSignal::Cart(decode(topic, payload)?),
        };
        Ok(signal)
    }
}

fn decode<T: serde::de::DeserializeOwned>(topic: SignalTopic, payload: &Value) -> AppResult<Option<T>> {
    if payload.is_null() {
        return Ok(None);
    }
    T::deserialize(payload)
        .map(Some)
        .map_err(|e| AppError::InvalidInput(format!("Malformed {} payload: {}", topic, e)))
}

/// Callback registered on a topic
pub type SignalListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Which changes a new listener receives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListenerScope {
    /// Only the value already published, if any
    Past,
    /// Only values published after registration
    Future,
    /// The current value, then every later one
    #[default]
    All,
}

/// Publish/subscribe over the fixed topic set
pub trait SignalBus: Send + Sync {
    fn subscribe(&self, topic: SignalTopic, scope: ListenerScope, listener: SignalListener);

    fn publish(&self, topic: SignalTopic, payload: Value);
}
