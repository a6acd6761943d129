use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CartLine, ProductView},
    services::providers::{CartService, FooterSlot, RenderedCard, SlotContext, WishlistService},
};

/// Icon shown on the add-to-cart button
const CART_ICON: &str = "Cart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    Primary,
    Tertiary,
}

/// A single footer control, bound to the product it was composed for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FooterAction {
    AddToCart {
        label: String,
        icon: String,
        variant: ButtonVariant,
        sku: String,
    },
    SelectOptions {
        label: String,
        variant: ButtonVariant,
        href: String,
    },
    WishlistToggle {
        product: ProductView,
    },
}

/// Action group that replaces a card's footer placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FooterGroup {
    pub primary: FooterAction,
    pub wishlist: FooterAction,
}

/// Prefixes a storefront path with the configured root
pub fn root_link(root_path: &str, path: &str) -> String {
    format!("{}{}", root_path.trim_end_matches('/'), path)
}

/// Composes card footers
///
/// Simple products get an add-to-cart button, anything else a select-options
/// link to the product page. Every card also gets a wishlist toggle.
#[derive(Debug, Clone, Default)]
pub struct ActionFooter {
    root_path: String,
}

impl ActionFooter {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    fn primary_action(&self, ctx: &SlotContext) -> FooterAction {
        let product = &ctx.product;
        if product.is_simple() {
            FooterAction::AddToCart {
                label: ctx.dictionary.add_to_cart.clone(),
                icon: CART_ICON.to_string(),
                variant: ButtonVariant::Primary,
                sku: product.sku.clone(),
            }
        } else {
            FooterAction::SelectOptions {
                label: ctx.dictionary.select_options.clone(),
                variant: ButtonVariant::Tertiary,
                href: root_link(
                    &self.root_path,
                    &format!("/products/{}/{}", product.url_key, product.sku),
                ),
            }
        }
    }
}

impl FooterSlot for ActionFooter {
    fn render(&self, ctx: SlotContext) -> RenderedCard {
        let primary = self.primary_action(&ctx);
        let wishlist = FooterAction::WishlistToggle {
            product: ctx.product.clone(),
        };
        ctx.replace_with(FooterGroup { primary, wishlist })
    }
}

/// Result of invoking a footer action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionOutcome {
    AddedToCart { sku: String, quantity: u32 },
    Navigate { href: String },
    WishlistToggled { sku: String, in_wishlist: bool },
}

/// Runs footer actions against the cart and wishlist collaborators
#[derive(Clone)]
pub struct ActionDispatcher {
    cart: Arc<dyn CartService>,
    wishlist: Arc<dyn WishlistService>,
}

impl ActionDispatcher {
    pub fn new(cart: Arc<dyn CartService>, wishlist: Arc<dyn WishlistService>) -> Self {
        Self { cart, wishlist }
    }

    pub async fn invoke(&self, action: &FooterAction) -> AppResult<ActionOutcome> {
        match action {
            FooterAction::AddToCart { sku, .. } => {
                let line = CartLine {
                    sku: sku.clone(),
                    quantity: 1,
                };
                self.cart.add_products_to_cart(vec![line]).await?;
                tracing::info!(sku = %sku, "Added recommended product to cart");
                Ok(ActionOutcome::AddedToCart {
                    sku: sku.clone(),
                    quantity: 1,
                })
            }
            FooterAction::SelectOptions { href, .. } => Ok(ActionOutcome::Navigate {
                href: href.clone(),
            }),
            FooterAction::WishlistToggle { product } => {
                let in_wishlist = self.wishlist.toggle(product).await?;
                tracing::info!(sku = %product.sku, in_wishlist, "Toggled wishlist");
                Ok(ActionOutcome::WishlistToggled {
                    sku: product.sku.clone(),
                    in_wishlist,
                })
            }
        }
    }
}
