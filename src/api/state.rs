use std::sync::Arc;

use crate::{
    config::Config,
    db::{DurableStorage, HistoryStore},
    models::Filters,
    services::{
        providers::{RecommendationRenderer, SessionCart, SessionWishlist},
        ActionDispatcher, ActionFooter, ContextAggregator, ManualViewport, PageSection,
        PanelContainer, RecommendationController, RecommendationLoader, VisibilityGate,
    },
    signals::{DataLayer, SignalBus},
};

/// Section the recommendations block is mounted in
pub const BLOCK_SECTION: &str = "recommendations";

/// Shared state of the page host
#[derive(Clone)]
pub struct AppState {
    pub data_layer: Arc<DataLayer>,
    pub viewport: Arc<ManualViewport>,
    pub section: PageSection,
    pub panel: Arc<PanelContainer>,
    pub actions: ActionDispatcher,
    pub controller: Arc<RecommendationController>,
}

impl AppState {
    /// Mounts one recommendations block on a fresh page
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        config: &Config,
        storage: Arc<dyn DurableStorage>,
        renderer: Arc<dyn RecommendationRenderer>,
    ) -> Self {
        let data_layer = Arc::new(DataLayer::new());
        let viewport = Arc::new(ManualViewport::new());
        let section = PageSection(BLOCK_SECTION.to_string());

        let gate = VisibilityGate::observe(config.device_class(), viewport.as_ref(), &section);
        let filters = Filters::from(&config.block_config());
        let panel = Arc::new(PanelContainer::new());

        tracing::info!(
            device = ?gate.device(),
            visible = gate.is_visible(),
            type_id = ?filters.type_id,
            store_view = %config.store_view_code,
            "Mounting recommendations block"
        );

        let loader = RecommendationLoader::new(
            HistoryStore::new(storage),
            Arc::new(config.clone()),
            renderer,
            Arc::new(ActionFooter::new(config.root_path.clone())),
            filters,
            panel.clone(),
        );
        let aggregator = ContextAggregator::new(loader, gate.is_visible());

        let bus: Arc<dyn SignalBus> = data_layer.clone();
        let actions = ActionDispatcher::new(
            Arc::new(SessionCart::new(Some(bus))),
            Arc::new(SessionWishlist::new()),
        );

        let controller = RecommendationController::spawn(aggregator, gate, data_layer.as_ref());

        Self {
            data_layer,
            viewport,
            section,
            panel,
            actions,
            controller: Arc::new(controller),
        }
    }
}
