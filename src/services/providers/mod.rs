/// Collaborator seams
///
/// The block drives three external collaborators: the recommendations
/// renderer, the cart and the wishlist. Each is a trait so the host can plug
/// in a real backend and tests can script behavior.
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CartLine, Dictionary, Filters, HistoryEntry, PageContext, ProductView},
    services::footer::FooterGroup,
};

#[cfg(test)]
use mockall::automock;

pub mod commerce;
pub mod session;

pub use commerce::CommerceRenderer;
pub use session::{SessionCart, SessionWishlist};

/// Inputs of one product list render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListProps {
    pub page_type: Option<String>,
    pub current_sku: Option<String>,
    pub user_view_history: Vec<HistoryEntry>,
    pub user_purchase_history: Vec<HistoryEntry>,
    pub filters: Filters,
}

impl ProductListProps {
    pub fn new(context: &PageContext, filters: &Filters) -> Self {
        Self {
            page_type: context.page_type.clone(),
            current_sku: context.current_sku.clone(),
            user_view_history: context.user_view_history.clone(),
            user_purchase_history: context.user_purchase_history.clone(),
            filters: filters.clone(),
        }
    }
}

/// A rendered recommendation card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCard {
    pub product: ProductView,
    pub footer: Option<FooterGroup>,
}

/// Per-product footer placeholder handed to the footer slot
#[derive(Debug, Clone)]
pub struct SlotContext {
    pub product: ProductView,
    pub dictionary: Dictionary,
}

impl SlotContext {
    /// Swaps the placeholder for the composed footer. Consumes the slot, so
    /// a placeholder can only be replaced once.
    pub fn replace_with(self, footer: FooterGroup) -> RenderedCard {
        RenderedCard {
            product: self.product,
            footer: Some(footer),
        }
    }
}

/// Footer extension point, invoked once per rendered product
pub trait FooterSlot: Send + Sync {
    fn render(&self, ctx: SlotContext) -> RenderedCard;
}

/// Recommendation list renderer
#[async_trait::async_trait]
pub trait RecommendationRenderer: Send + Sync {
    /// Renders the product list for `props`, calling `footer` for every card
    async fn render(
        &self,
        props: ProductListProps,
        footer: Arc<dyn FooterSlot>,
    ) -> AppResult<Vec<RenderedCard>>;

    /// Renderer name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Cart mutation collaborator
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CartService: Send + Sync {
    async fn add_products_to_cart(&self, lines: Vec<CartLine>) -> AppResult<()>;
}

/// Wishlist collaborator
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait WishlistService: Send + Sync {
    /// Toggles `product`, returning whether it is now in the wishlist
    async fn toggle(&self, product: &ProductView) -> AppResult<bool>;
}
