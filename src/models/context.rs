use serde::{Deserialize, Serialize};

use crate::signals::PageSignal;

/// A recorded product view or purchase. Entries are opaque here and pass
/// through exactly as storage holds them.
pub type HistoryEntry = serde_json::Value;

/// Aggregated page context for one page view
///
/// Every field starts unset and is written by exactly one signal kind.
/// Nothing is ever rolled back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub page_type: Option<String>,
    pub current_sku: Option<String>,
    pub category: Option<String>,
    pub cart_skus: Option<Vec<String>>,
    pub user_view_history: Vec<HistoryEntry>,
    pub user_purchase_history: Vec<HistoryEntry>,
}

impl PageContext {
    /// Applies one page signal, touching only the field(s) that signal owns
    pub fn reduce(mut self, signal: &PageSignal) -> Self {
        match signal {
            PageSignal::Product(ctx) => {
                self.current_sku = ctx.as_ref().and_then(|c| c.sku.clone());
            }
            PageSignal::Category(ctx) => {
                self.category = ctx.as_ref().and_then(|c| c.name.clone());
            }
            PageSignal::PageType(ctx) => {
                self.page_type = ctx.as_ref().and_then(|c| c.page_type.clone());
            }
            PageSignal::Cart(ctx) => {
                self.cart_skus = ctx.as_ref().and_then(ShoppingCartContext::cart_skus);
            }
        }
        self
    }

    /// Replaces both histories with freshly loaded values
    pub fn with_history(
        mut self,
        view_history: Vec<HistoryEntry>,
        purchase_history: Vec<HistoryEntry>,
    ) -> Self {
        self.user_view_history = view_history;
        self.user_purchase_history = purchase_history;
        self
    }
}

// ============================================================================
// Data layer payloads
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContext {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryContext {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTypeContext {
    #[serde(default)]
    pub page_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCartContext {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub total_quantity: Option<u64>,
    #[serde(default)]
    pub items: Option<Vec<CartItemContext>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemContext {
    #[serde(default)]
    pub product: CartItemProduct,
    #[serde(default)]
    pub quantity: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemProduct {
    #[serde(default)]
    pub sku: Option<String>,
}

impl ShoppingCartContext {
    /// SKUs currently in the cart
    ///
    /// An empty cart (total quantity 0) is always the empty list, whatever
    /// `items` still holds. Without items the value stays unset.
    pub fn cart_skus(&self) -> Option<Vec<String>> {
        if self.total_quantity == Some(0) {
            return Some(Vec::new());
        }

        self.items.as_ref().map(|items| {
            items
                .iter()
                .filter_map(|item| item.product.sku.clone())
                .collect()
        })
    }
}
