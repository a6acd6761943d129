use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::{
    error::{AppError, AppResult},
    models::PageContext,
    services::{
        loader::{RecommendationLoader, RenderTicket},
        visibility::VisibilityGate,
    },
    signals::{ListenerScope, PageSignal, SignalBus, SignalTopic},
};

/// Input of the aggregator
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Signal(PageSignal),
    /// The block's section entered the viewport
    BecameVisible,
}

/// Folds page signals into the shared context and asks for a render after
/// every change
///
/// Events are applied one at a time, so each render request observes every
/// earlier field write and no torn state.
pub struct ContextAggregator {
    context: PageContext,
    visible: bool,
    loader: RecommendationLoader,
    snapshot_tx: watch::Sender<PageContext>,
}

impl ContextAggregator {
    pub fn new(loader: RecommendationLoader, visible: bool) -> Self {
        let (snapshot_tx, _) = watch::channel(PageContext::default());
        Self {
            context: PageContext::default(),
            visible,
            loader,
            snapshot_tx,
        }
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Live view of the aggregated context
    pub fn watch_context(&self) -> watch::Receiver<PageContext> {
        self.snapshot_tx.subscribe()
    }

    /// Applies one event, then requests a render
    pub async fn dispatch(&mut self, event: ControllerEvent) -> Option<RenderTicket> {
        match event {
            ControllerEvent::Signal(signal) => {
                tracing::debug!(topic = %signal.topic(), "Page context changed");
                self.context = std::mem::take(&mut self.context).reduce(&signal);
            }
            ControllerEvent::BecameVisible => {
                tracing::info!("Recommendations block became visible");
                self.visible = true;
            }
        }

        let ticket = self
            .loader
            .load_recommendation(&mut self.context, self.visible)
            .await;
        self.snapshot_tx.send_replace(self.context.clone());
        ticket
    }
}

/// Running recommendations block
///
/// Owns the event loop that feeds the aggregator. Data layer listeners and
/// the visibility gate post into the same queue, so their effects are
/// serialized in arrival order.
pub struct RecommendationController {
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    shutdown_tx: mpsc::Sender<()>,
    context_rx: watch::Receiver<PageContext>,
}

impl RecommendationController {
    /// Wires the aggregator to the page and starts its event loop
    pub fn spawn(aggregator: ContextAggregator, gate: VisibilityGate, bus: &dyn SignalBus) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let context_rx = aggregator.watch_context();

        for topic in SignalTopic::ALL {
            let tx = events_tx.clone();
            bus.subscribe(
                topic,
                ListenerScope::All,
                Arc::new(move |payload: &serde_json::Value| match PageSignal::from_payload(topic, payload) {
                    Ok(signal) => {
                        let _ = tx.send(ControllerEvent::Signal(signal));
                    }
                    Err(e) => {
                        tracing::warn!(topic = %topic, error = %e, "Ignoring malformed data layer payload");
                    }
                }),
            );
        }

        if !aggregator.is_visible() {
            let tx = events_tx.clone();
            let mut gate = gate;
            tokio::spawn(async move {
                if gate.wait_visible().await {
                    let _ = tx.send(ControllerEvent::BecameVisible);
                }
            });
        }

        tokio::spawn(async move {
            Self::event_loop(aggregator, events_rx, shutdown_rx).await;
        });

        Self {
            events_tx,
            shutdown_tx,
            context_rx,
        }
    }

    async fn event_loop(
        mut aggregator: ContextAggregator,
        mut events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Recommendation controller started");

        loop {
            tokio::select! {
                Some(event) = events_rx.recv() => {
                    // Renders run detached; overlapping ones are sequenced by
                    // the panel's generation check.
                    let _ = aggregator.dispatch(event).await;
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Recommendation controller stopped");
                    break;
                }
            }
        }
    }

    /// Queues an event directly, bypassing the data layer
    pub fn send(&self, event: ControllerEvent) -> AppResult<()> {
        self.events_tx
            .send(event)
            .map_err(|_| AppError::Internal("Recommendation controller is not running".to_string()))
    }

    pub fn context(&self) -> PageContext {
        self.context_rx.borrow().clone()
    }

    /// Stops the event loop. Renders already in flight still complete.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
