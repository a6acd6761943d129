use serde_json::json;
use std::{collections::BTreeSet, sync::Arc};
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{CartLine, ProductView},
    services::providers::{CartService, WishlistService},
    signals::{SignalBus, SignalTopic},
};

/// In-process cart for one page session
///
/// After every mutation the new cart is published as `shoppingCartContext`,
/// the same way the storefront cart reports itself to the data layer.
pub struct SessionCart {
    lines: RwLock<Vec<CartLine>>,
    bus: Option<Arc<dyn SignalBus>>,
}

impl SessionCart {
    pub fn new(bus: Option<Arc<dyn SignalBus>>) -> Self {
        Self {
            lines: RwLock::new(Vec::new()),
            bus,
        }
    }

    pub async fn lines(&self) -> Vec<CartLine> {
        self.lines.read().await.clone()
    }

    fn publish(&self, lines: &[CartLine]) {
        let Some(bus) = &self.bus else {
            return;
        };

        let total_quantity: u32 = lines.iter().map(|line| line.quantity).sum();
        let items: Vec<_> = lines
            .iter()
            .map(|line| json!({ "product": { "sku": line.sku }, "quantity": line.quantity }))
            .collect();

        bus.publish(
            SignalTopic::ShoppingCartContext,
            json!({ "totalQuantity": total_quantity, "items": items }),
        );
    }
}

#[async_trait::async_trait]
impl CartService for SessionCart {
    async fn add_products_to_cart(&self, new_lines: Vec<CartLine>) -> AppResult<()> {
        if let Some(line) = new_lines.iter().find(|line| line.quantity == 0) {
            return Err(AppError::InvalidInput(format!(
                "Quantity for {} must be positive",
                line.sku
            )));
        }

        let mut lines = self.lines.write().await;
        for new_line in new_lines {
            match lines.iter_mut().find(|line| line.sku == new_line.sku) {
                Some(line) => line.quantity += new_line.quantity,
                None => lines.push(new_line),
            }
        }

        // Reported while the write lock is held
        self.publish(&lines);
        Ok(())
    }
}

/// In-process wishlist for one page session
#[derive(Default)]
pub struct SessionWishlist {
    skus: RwLock<BTreeSet<String>>,
}

impl SessionWishlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, sku: &str) -> bool {
        self.skus.read().await.contains(sku)
    }
}

#[async_trait::async_trait]
impl WishlistService for SessionWishlist {
    async fn toggle(&self, product: &ProductView) -> AppResult<bool> {
        let mut skus = self.skus.write().await;
        if skus.remove(&product.sku) {
            Ok(false)
        } else {
            skus.insert(product.sku.clone());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::DataLayer;

    fn line(sku: &str, quantity: u32) -> CartLine {
        CartLine {
            sku: sku.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_add_merges_same_sku() {
        let cart = SessionCart::new(None);
        cart.add_products_to_cart(vec![line("A", 1)]).await.unwrap();
        cart.add_products_to_cart(vec![line("A", 1), line("B", 2)])
            .await
            .unwrap();

        assert_eq!(cart.lines().await, vec![line("A", 2), line("B", 2)]);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let cart = SessionCart::new(None);
        let result = cart.add_products_to_cart(vec![line("A", 0)]).await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(cart.lines().await.is_empty());
    }

    #[tokio::test]
    async fn test_cart_changes_are_published() {
        let layer = Arc::new(DataLayer::new());
        let bus: Arc<dyn SignalBus> = layer.clone();
        let cart = SessionCart::new(Some(bus));

        cart.add_products_to_cart(vec![line("A", 1), line("B", 1)])
            .await
            .unwrap();

        assert_eq!(
            layer.current(SignalTopic::ShoppingCartContext),
            Some(json!({
                "totalQuantity": 2,
                "items": [
                    { "product": { "sku": "A" }, "quantity": 1 },
                    { "product": { "sku": "B" }, "quantity": 1 }
                ]
            }))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_publish_final_cart_last() {
        let layer = Arc::new(DataLayer::new());
        let reported = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reported.clone();
        layer.subscribe(
            SignalTopic::ShoppingCartContext,
            crate::signals::ListenerScope::Future,
            Arc::new(move |value: &serde_json::Value| {
                std::thread::sleep(std::time::Duration::from_millis(2));
                sink.lock().unwrap().push(value["totalQuantity"].clone());
            }),
        );
        let bus: Arc<dyn SignalBus> = layer.clone();
        let cart = Arc::new(SessionCart::new(Some(bus)));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let cart = cart.clone();
                tokio::spawn(async move {
                    cart.add_products_to_cart(vec![line(&format!("S{i}"), 1)])
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let reported = reported.lock().unwrap();
        let expected: Vec<_> = (1..=8).map(|n| json!(n)).collect();
        assert_eq!(*reported, expected);
        assert_eq!(
            layer.current(SignalTopic::ShoppingCartContext).unwrap()["totalQuantity"],
            json!(8)
        );
    }

    #[tokio::test]
    async fn test_wishlist_toggle() {
        let wishlist = SessionWishlist::new();
        let product = ProductView {
            item_type: Default::default(),
            sku: "W".to_string(),
            url_key: "w".to_string(),
            name: None,
        };

        assert!(wishlist.toggle(&product).await.unwrap());
        assert!(wishlist.contains("W").await);
        assert!(!wishlist.toggle(&product).await.unwrap());
        assert!(!wishlist.contains("W").await);
    }
}
