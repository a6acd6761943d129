#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use recs_block::config::Config;
use recs_block::error::AppResult;
use recs_block::models::{Dictionary, ItemType, ProductView};
use recs_block::services::providers::{
    FooterSlot, ProductListProps, RecommendationRenderer, RenderedCard, SlotContext,
};

/// Renderer double that records every request and renders a fixed unit of
/// one simple and one configurable product
#[derive(Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<ProductListProps>>,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ProductListProps> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn product(item_type: ItemType, sku: &str) -> ProductView {
    ProductView {
        item_type,
        sku: sku.to_string(),
        url_key: sku.to_lowercase(),
        name: None,
    }
}

#[async_trait::async_trait]
impl RecommendationRenderer for RecordingRenderer {
    async fn render(
        &self,
        props: ProductListProps,
        footer: Arc<dyn FooterSlot>,
    ) -> AppResult<Vec<RenderedCard>> {
        self.calls.lock().unwrap().push(props);

        let products = [
            product(ItemType::SimpleProductView, "SIMPLE-1"),
            product(ItemType::ComplexProductView, "CFG-1"),
        ];
        Ok(products
            .into_iter()
            .map(|product| {
                footer.render(SlotContext {
                    product,
                    dictionary: Dictionary::default(),
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Config for a page of the given viewport width
pub fn config_with_width(viewport_width: u32) -> Config {
    serde_json::from_value(serde_json::json!({
        "commerce_endpoint": "http://localhost:8080/graphql",
        "viewport_width": viewport_width,
    }))
    .unwrap()
}

/// Polls `check` until it holds, yielding to the runtime in between
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..400 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

/// Gives queued events a chance to be processed
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
