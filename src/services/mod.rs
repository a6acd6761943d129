pub mod controller;
pub mod footer;
pub mod loader;
pub mod providers;
pub mod visibility;

pub use controller::{ContextAggregator, ControllerEvent, RecommendationController};
pub use footer::{ActionDispatcher, ActionFooter, ActionOutcome, FooterAction, FooterGroup};
pub use loader::{PanelContainer, PanelState, RecommendationLoader, RenderOutcome, RenderTicket};
pub use visibility::{DeviceClass, IntersectionEntry, ManualViewport, PageSection, VisibilityGate};
