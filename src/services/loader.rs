use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    config::{ConfigReader, STORE_VIEW_CODE_KEY},
    db::HistoryStore,
    error::{AppError, AppResult},
    models::{Filters, PageContext},
    services::providers::{FooterSlot, ProductListProps, RecommendationRenderer, RenderedCard},
};

/// Scope used when no store view code is configured
const DEFAULT_SCOPE: &str = "default";

/// What the panel currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PanelState {
    /// Generation of the render that produced `cards`, 0 before the first one
    pub generation: u64,
    pub cards: Vec<RenderedCard>,
}

/// Outcome of a completed render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Applied { generation: u64, cards: usize },
    /// A newer render was issued while this one was in flight
    Superseded { generation: u64, latest: u64 },
}

/// Panel that recommendation renders are committed into
///
/// Every render takes a generation number when it is issued. Results are
/// applied only if no newer render has been issued since, so the panel always
/// reflects the most recent request rather than the slowest response.
#[derive(Default)]
pub struct PanelContainer {
    issued: AtomicU64,
    state: RwLock<PanelState>,
}

impl PanelContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next render generation
    pub fn begin(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    /// Applies `cards` if `generation` is still the latest issued
    pub async fn commit(&self, generation: u64, cards: Vec<RenderedCard>) -> RenderOutcome {
        let mut state = self.state.write().await;
        let latest = self.latest_issued();

        if generation != latest {
            tracing::debug!(generation, latest, "Discarding stale recommendation render");
            return RenderOutcome::Superseded { generation, latest };
        }

        let count = cards.len();
        state.generation = generation;
        state.cards = cards;

        tracing::info!(generation, cards = count, "Recommendations rendered");

        RenderOutcome::Applied {
            generation,
            cards: count,
        }
    }

    pub async fn snapshot(&self) -> PanelState {
        self.state.read().await.clone()
    }

    /// Card currently shown for `sku`
    pub async fn find_card(&self, sku: &str) -> Option<RenderedCard> {
        let state = self.state.read().await;
        state.cards.iter().find(|card| card.product.sku == sku).cloned()
    }
}

/// Handle to a dispatched render
///
/// Dropping the ticket leaves the render running; it is never cancelled.
pub struct RenderTicket {
    pub generation: u64,
    handle: JoinHandle<AppResult<RenderOutcome>>,
}

impl RenderTicket {
    pub async fn wait(self) -> AppResult<RenderOutcome> {
        self.handle
            .await
            .map_err(|e| AppError::Internal(format!("Render task failed: {}", e)))?
    }
}

/// Turns the aggregated context into render requests
pub struct RecommendationLoader {
    history: HistoryStore,
    config: Arc<dyn ConfigReader>,
    renderer: Arc<dyn RecommendationRenderer>,
    footer: Arc<dyn FooterSlot>,
    filters: Filters,
    container: Arc<PanelContainer>,
}

impl RecommendationLoader {
    pub fn new(
        history: HistoryStore,
        config: Arc<dyn ConfigReader>,
        renderer: Arc<dyn RecommendationRenderer>,
        footer: Arc<dyn FooterSlot>,
        filters: Filters,
        container: Arc<PanelContainer>,
    ) -> Self {
        Self {
            history,
            config,
            renderer,
            footer,
            filters,
            container,
        }
    }

    pub fn container(&self) -> &Arc<PanelContainer> {
        &self.container
    }

    /// Requests a render of the recommendation list for `context`
    ///
    /// While the block is not visible this does nothing at all. Otherwise both
    /// histories are re-read into `context` and a render is dispatched in the
    /// background. Overlapping renders are allowed to race; only the latest
    /// issued one reaches the panel.
    pub async fn load_recommendation(
        &self,
        context: &mut PageContext,
        visible: bool,
    ) -> Option<RenderTicket> {
        if !visible {
            tracing::trace!("Recommendations not visible yet, skipping render");
            return None;
        }

        let scope = self.config.config_value(STORE_VIEW_CODE_KEY).unwrap_or_else(|| {
            tracing::warn!(fallback = DEFAULT_SCOPE, "No store view code configured");
            DEFAULT_SCOPE.to_string()
        });

        let (view_history, purchase_history) = self.history.load_all(&scope).await;
        *context = std::mem::take(context).with_history(view_history, purchase_history);

        let props = ProductListProps::new(context, &self.filters);
        let generation = self.container.begin();

        tracing::debug!(
            generation,
            renderer = self.renderer.name(),
            page_type = ?props.page_type,
            current_sku = ?props.current_sku,
            "Dispatching recommendation render"
        );

        let renderer = self.renderer.clone();
        let footer = self.footer.clone();
        let container = self.container.clone();

        let handle = tokio::spawn(async move {
            let result = match renderer.render(props, footer).await {
                Ok(cards) => Ok(container.commit(generation, cards).await),
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::error!(generation, error = %e, "Recommendation render failed");
            }
            result
        });

        Some(RenderTicket { generation, handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::db::{DurableStorage, MemoryStorage};
    use crate::models::{Dictionary, ProductView};
    use crate::services::footer::ActionFooter;
    use crate::services::providers::SlotContext;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Renders one card per request and records the props it saw. A render
    /// can be held back until its gate is released.
    #[derive(Default)]
    struct ScriptedRenderer {
        calls: Mutex<Vec<ProductListProps>>,
        gates: Mutex<Vec<oneshot::Receiver<()>>>,
    }

    impl ScriptedRenderer {
        fn hold_next(&self) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push(rx);
            tx
        }

        fn calls(&self) -> Vec<ProductListProps> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RecommendationRenderer for ScriptedRenderer {
        async fn render(
            &self,
            props: ProductListProps,
            footer: Arc<dyn FooterSlot>,
        ) -> AppResult<Vec<RenderedCard>> {
            let sku = props.current_sku.clone().unwrap_or_else(|| "none".to_string());
            let gate = {
                self.calls.lock().unwrap().push(props);
                let mut gates = self.gates.lock().unwrap();
                if gates.is_empty() {
                    None
                } else {
                    Some(gates.remove(0))
                }
            };
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            let product = ProductView {
                item_type: Default::default(),
                sku: format!("rec-for-{}", sku),
                url_key: "rec".to_string(),
                name: None,
            };
            Ok(vec![footer.render(SlotContext {
                product,
                dictionary: Dictionary::default(),
            })])
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn loader_with(
        storage: MemoryStorage,
        renderer: Arc<ScriptedRenderer>,
    ) -> RecommendationLoader {
        RecommendationLoader::new(
            HistoryStore::new(Arc::new(storage)),
            Arc::new(test_config()),
            renderer,
            Arc::new(ActionFooter::default()),
            Filters {
                type_id: Some("most-viewed".to_string()),
            },
            Arc::new(PanelContainer::new()),
        )
    }

    #[tokio::test]
    async fn test_invisible_load_has_no_side_effects() {
        let renderer = Arc::new(ScriptedRenderer::default());
        let loader = loader_with(
            MemoryStorage::with_items([("default:productViewHistory", r#"[{"sku":"V"}]"#)]),
            renderer.clone(),
        );
        let mut context = PageContext {
            current_sku: Some("X".to_string()),
            ..Default::default()
        };

        assert!(loader.load_recommendation(&mut context, false).await.is_none());

        assert!(renderer.calls().is_empty());
        assert!(context.user_view_history.is_empty());
        assert_eq!(loader.container().latest_issued(), 0);
    }

    #[tokio::test]
    async fn test_visible_load_reads_history_and_renders() {
        let renderer = Arc::new(ScriptedRenderer::default());
        let loader = loader_with(
            MemoryStorage::with_items([
                ("default:productViewHistory", r#"[{"sku":"V"}]"#),
                ("default:purchaseHistory", "not json"),
            ]),
            renderer.clone(),
        );
        let mut context = PageContext {
            current_sku: Some("X".to_string()),
            page_type: Some("Product".to_string()),
            ..Default::default()
        };

        let ticket = loader.load_recommendation(&mut context, true).await.unwrap();
        let outcome = ticket.wait().await.unwrap();

        assert_eq!(outcome, RenderOutcome::Applied { generation: 1, cards: 1 });
        assert_eq!(context.user_view_history, vec![json!({"sku": "V"})]);
        assert!(context.user_purchase_history.is_empty());

        let calls = renderer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].current_sku.as_deref(), Some("X"));
        assert_eq!(calls[0].page_type.as_deref(), Some("Product"));
        assert_eq!(calls[0].filters.type_id.as_deref(), Some("most-viewed"));

        let panel = loader.container().snapshot().await;
        assert_eq!(panel.generation, 1);
        assert_eq!(panel.cards[0].product.sku, "rec-for-X");
        assert!(panel.cards[0].footer.is_some());
    }

    #[tokio::test]
    async fn test_history_is_reread_on_every_load() {
        let storage = Arc::new(MemoryStorage::new());
        let renderer = Arc::new(ScriptedRenderer::default());
        let loader = RecommendationLoader::new(
            HistoryStore::new(storage.clone()),
            Arc::new(test_config()),
            renderer.clone(),
            Arc::new(ActionFooter::default()),
            Filters::default(),
            Arc::new(PanelContainer::new()),
        );
        let mut context = PageContext::default();

        loader.load_recommendation(&mut context, true).await.unwrap();
        assert!(context.user_view_history.is_empty());

        storage
            .set_item("default:productViewHistory", r#"[{"sku":"NEW"}]"#.to_string())
            .await
            .unwrap();
        loader.load_recommendation(&mut context, true).await.unwrap();

        assert_eq!(context.user_view_history, vec![json!({"sku": "NEW"})]);
    }

    #[tokio::test]
    async fn test_stale_render_is_discarded() {
        let renderer = Arc::new(ScriptedRenderer::default());
        let loader = loader_with(MemoryStorage::new(), renderer.clone());

        let release_slow = renderer.hold_next();
        let mut context = PageContext {
            current_sku: Some("EARLY".to_string()),
            ..Default::default()
        };
        let slow = loader.load_recommendation(&mut context, true).await.unwrap();

        context.current_sku = Some("LATE".to_string());
        let fast = loader.load_recommendation(&mut context, true).await.unwrap();

        assert_eq!(
            fast.wait().await.unwrap(),
            RenderOutcome::Applied { generation: 2, cards: 1 }
        );

        release_slow.send(()).unwrap();
        assert_eq!(
            slow.wait().await.unwrap(),
            RenderOutcome::Superseded { generation: 1, latest: 2 }
        );

        let panel = loader.container().snapshot().await;
        assert_eq!(panel.generation, 2);
        assert_eq!(panel.cards[0].product.sku, "rec-for-LATE");
    }

    #[tokio::test]
    async fn test_container_find_card() {
        let container = PanelContainer::new();
        let generation = container.begin();
        let card = ActionFooter::default().render(SlotContext {
            product: ProductView {
                item_type: Default::default(),
                sku: "A".to_string(),
                url_key: "a".to_string(),
                name: None,
            },
            dictionary: Dictionary::default(),
        });
        container.commit(generation, vec![card]).await;

        assert!(container.find_card("A").await.is_some());
        assert!(container.find_card("B").await.is_none());
    }
}
