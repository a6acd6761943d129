use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use tokio::sync::watch;

/// Device class, fixed once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    NonMobile,
}

impl DeviceClass {
    /// `only screen and (max-width: {breakpoint}px)`
    pub fn classify(viewport_width: u32, breakpoint: u32) -> Self {
        if viewport_width <= breakpoint {
            DeviceClass::Mobile
        } else {
            DeviceClass::NonMobile
        }
    }
}

/// Page section enclosing the recommendations block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageSection(pub String);

/// One intersection observation for a watched section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
    #[serde(default)]
    pub intersection_ratio: f64,
}

/// Fired at most once, the first time the section enters the viewport
pub type OnFirstVisible = Box<dyn FnOnce() + Send>;

/// Viewport intersection capability
///
/// Implementations must invoke `on_first_visible` at most once and stop
/// observing the section right after.
pub trait ViewportWatcher: Send + Sync {
    fn subscribe(&self, section: &PageSection, on_first_visible: OnFirstVisible);
}

/// Viewport watcher fed by explicit intersection reports
///
/// The page host forwards the browser's intersection entries here. Tests use
/// it to synthesize intersections deterministically.
#[derive(Default)]
pub struct ManualViewport {
    observers: Mutex<HashMap<PageSection, Vec<OnFirstVisible>>>,
}

impl ManualViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers intersection entries for `section`
    ///
    /// Returns how many observers fired. Observers are disconnected as they
    /// fire, so a repeated intersection returns 0.
    pub fn emit(&self, section: &PageSection, entries: &[IntersectionEntry]) -> usize {
        if !entries.iter().any(|entry| entry.is_intersecting) {
            return 0;
        }

        let fired = {
            let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
            observers.remove(section).unwrap_or_default()
        };

        let count = fired.len();
        for on_first_visible in fired {
            on_first_visible();
        }

        if count > 0 {
            tracing::debug!(section = %section.0, observers = count, "Section entered viewport");
        }
        count
    }

    /// Number of observers still watching `section`
    pub fn observer_count(&self, section: &PageSection) -> usize {
        let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        observers.get(section).map_or(0, Vec::len)
    }
}

impl ViewportWatcher for ManualViewport {
    fn subscribe(&self, section: &PageSection, on_first_visible: OnFirstVisible) {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        observers
            .entry(section.clone())
            .or_default()
            .push(on_first_visible);
    }
}

/// Whether the recommendations block may start loading
///
/// Non-mobile devices are visible from the start. Mobile devices wait for the
/// enclosing section to enter the viewport. Once visible, always visible.
#[derive(Clone)]
pub struct VisibilityGate {
    device: DeviceClass,
    visible: watch::Receiver<bool>,
}

impl VisibilityGate {
    pub fn observe(device: DeviceClass, watcher: &dyn ViewportWatcher, section: &PageSection) -> Self {
        let initially_visible = device == DeviceClass::NonMobile;
        let (visible_tx, visible) = watch::channel(initially_visible);

        if !initially_visible {
            watcher.subscribe(
                section,
                Box::new(move || {
                    visible_tx.send_replace(true);
                }),
            );
            tracing::debug!(section = %section.0, "Deferring recommendations until section is visible");
        }

        Self { device, visible }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Resolves once the gate is open
    ///
    /// Returns `false` if the watcher went away without ever firing.
    pub async fn wait_visible(&mut self) -> bool {
        self.visible.wait_for(|visible| *visible).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> PageSection {
        PageSection("section-3".to_string())
    }

    fn entry(is_intersecting: bool) -> IntersectionEntry {
        IntersectionEntry {
            is_intersecting,
            intersection_ratio: if is_intersecting { 0.25 } else { 0.0 },
        }
    }

    #[test]
    fn test_classify_breakpoint() {
        assert_eq!(DeviceClass::classify(375, 900), DeviceClass::Mobile);
        assert_eq!(DeviceClass::classify(900, 900), DeviceClass::Mobile);
        assert_eq!(DeviceClass::classify(1440, 900), DeviceClass::NonMobile);
    }

    #[test]
    fn test_non_mobile_visible_without_intersection() {
        let viewport = ManualViewport::new();
        let gate = VisibilityGate::observe(DeviceClass::NonMobile, &viewport, &section());

        assert!(gate.is_visible());
        assert_eq!(viewport.observer_count(&section()), 0);
    }

    #[test]
    fn test_mobile_waits_for_intersecting_entry() {
        let viewport = ManualViewport::new();
        let gate = VisibilityGate::observe(DeviceClass::Mobile, &viewport, &section());
        assert_eq!(gate.device(), DeviceClass::Mobile);
        assert!(!gate.is_visible());

        assert_eq!(viewport.emit(&section(), &[entry(false)]), 0);
        assert!(!gate.is_visible());

        assert_eq!(viewport.emit(&section(), &[entry(false), entry(true)]), 1);
        assert!(gate.is_visible());
    }

    #[test]
    fn test_mobile_disconnects_after_first_visible() {
        let viewport = ManualViewport::new();
        let gate = VisibilityGate::observe(DeviceClass::Mobile, &viewport, &section());

        assert_eq!(viewport.emit(&section(), &[entry(true)]), 1);
        assert_eq!(viewport.observer_count(&section()), 0);
        assert_eq!(viewport.emit(&section(), &[entry(true)]), 0);
        assert!(gate.is_visible());
    }

    #[test]
    fn test_other_sections_do_not_open_gate() {
        let viewport = ManualViewport::new();
        let gate = VisibilityGate::observe(DeviceClass::Mobile, &viewport, &section());

        viewport.emit(&PageSection("hero".to_string()), &[entry(true)]);
        assert!(!gate.is_visible());
    }

    #[tokio::test]
    async fn test_wait_visible_resolves_on_flip() {
        let viewport = ManualViewport::new();
        let mut gate = VisibilityGate::observe(DeviceClass::Mobile, &viewport, &section());

        let waiter = tokio::spawn({
            let mut gate = gate.clone();
            async move { gate.wait_visible().await }
        });
        viewport.emit(&section(), &[entry(true)]);

        assert!(waiter.await.unwrap());
        assert!(gate.wait_visible().await);
    }

    #[tokio::test]
    async fn test_wait_visible_false_when_watcher_dropped() {
        let viewport = ManualViewport::new();
        let mut gate = VisibilityGate::observe(DeviceClass::Mobile, &viewport, &section());
        drop(viewport);

        assert!(!gate.wait_visible().await);
    }
}
