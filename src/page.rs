//! Page host: owns a document and the timer queue that drives the rotator
//! and dismisser against it, and records every observable mutation.

use crate::dismisser::{Dismissal, Dismisser};
use crate::dom::{Document, DocumentTree, NodeId};
use crate::rotator::Rotator;
use crate::timers::{TimerHandle, TimerQueue};
use crate::{Result, SlideshowConfig};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

type OnEventHandler = Arc<dyn Fn(&PageEvent) + Send + Sync>;

/// Observable mutation made by a timer action, stamped with virtual time (ms)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PageEvent {
    /// The display target's `src` was set
    ImageShown { at: u64, src: String },
    /// A tick found no display target; nothing was written
    DisplayMissing { at: u64 },
    /// A marked element had its opacity set to zero
    Faded { at: u64, node: NodeId },
    /// A marked element was detached
    Removed { at: u64, node: NodeId },
    /// A removal came due for an element that was already detached
    RemovalSkipped { at: u64, node: NodeId },
}

impl PageEvent {
    pub fn at(&self) -> u64 {
        match self {
            PageEvent::ImageShown { at, .. }
            | PageEvent::DisplayMissing { at }
            | PageEvent::Faded { at, .. }
            | PageEvent::Removed { at, .. }
            | PageEvent::RemovalSkipped { at, .. } => *at,
        }
    }
}

/// Ordered record of page events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<PageEvent>,
}

impl EventLog {
    pub fn push(&mut self, ev: PageEvent) {
        self.events.push(ev);
    }

    pub fn as_slice(&self) -> &[PageEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// One JSON object per line, newline-terminated
    pub fn to_json_lines(&self) -> String {
        let mut out = String::new();
        for ev in &self.events {
            let line = serde_json::to_string(ev).expect("PageEvent holds only strings and integers");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// SHA-256 hex digest of [`EventLog::to_json_lines`]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json_lines().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// State the timer tasks run against
pub struct PageState<D> {
    pub document: D,
    log: EventLog,
    on_event: Option<OnEventHandler>,
}

impl<D> PageState<D> {
    fn emit(&mut self, ev: PageEvent) {
        if let Some(cb) = &self.on_event {
            cb(&ev);
        }
        self.log.push(ev);
    }
}

fn document_of<D>(state: &mut PageState<D>) -> &mut D {
    &mut state.document
}

/// A loaded page with its rotator (and optionally dismisser) installed.
///
/// Time is virtual: nothing happens until [`Page::advance`] or
/// [`Page::run_until`] is called (or the realtime driver does it).
pub struct Page<D: DocumentTree + 'static = Document> {
    config: SlideshowConfig,
    state: PageState<D>,
    timers: TimerQueue<PageState<D>>,
    rotator: Option<TimerHandle>,
    dismisser: Option<TimerHandle>,
}

impl<D: DocumentTree + 'static> std::fmt::Debug for Page<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("config", &self.config)
            .field("timers", &self.timers)
            .field("events", &self.state.log.len())
            .finish()
    }
}

impl<D: DocumentTree + 'static> Page<D> {
    /// Validate `config` and install the page's timers against `document`
    pub fn new(config: SlideshowConfig, document: D) -> Result<Self> {
        config.validate()?;

        let mut timers = TimerQueue::new();
        let rotator = Rotator::new(config.images.iter().cloned(), config.display_id.clone())?;
        let rotator_handle = rotator.install(&mut timers, config.interval_ms, document_of::<D>, |state: &mut PageState<D>, at, shown| {
            state.emit(match shown {
                Some(src) => PageEvent::ImageShown { at, src },
                None => PageEvent::DisplayMissing { at },
            })
        });

        let dismisser_handle = if config.dismiss.enabled {
            let dismisser = Dismisser::new(config.dismiss.marker_class.clone())?
                .fade_delay_ms(config.dismiss.fade_delay_ms)
                .removal_delay_ms(config.dismiss.removal_delay_ms);
            Some(dismisser.install(&mut timers, document_of::<D>, |state: &mut PageState<D>, at, d| {
                state.emit(match d {
                    Dismissal::Faded(node) => PageEvent::Faded { at, node },
                    Dismissal::Removed(node) => PageEvent::Removed { at, node },
                    Dismissal::AlreadyGone(node) => PageEvent::RemovalSkipped { at, node },
                })
            }))
        } else {
            None
        };

        info!(
            "page ready: {} images into #{} every {}ms (dismiss .{}: {})",
            config.images.len(),
            config.display_id,
            config.interval_ms,
            config.dismiss.marker_class,
            config.dismiss.enabled
        );

        Ok(Self {
            config,
            state: PageState { document, log: EventLog::default(), on_event: None },
            timers,
            rotator: Some(rotator_handle),
            dismisser: dismisser_handle,
        })
    }

    pub fn config(&self) -> &SlideshowConfig {
        &self.config
    }

    /// Current virtual time (ms since the page was created)
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    pub fn document(&self) -> &D {
        &self.state.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.state.document
    }

    /// Advance virtual time by `ms`; returns how many timer actions ran
    pub fn advance(&mut self, ms: u64) -> usize {
        self.timers.advance(&mut self.state, ms)
    }

    /// Run every action due at or before `t` (absolute virtual ms)
    pub fn run_until(&mut self, t: u64) -> usize {
        self.timers.run_until(&mut self.state, t)
    }

    pub fn next_deadline(&mut self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Whether any timer is still live
    pub fn is_running(&self) -> bool {
        self.timers.pending() > 0
    }

    pub fn events(&self) -> &[PageEvent] {
        self.state.log.as_slice()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.state.log
    }

    pub fn take_events(&mut self) -> Vec<PageEvent> {
        self.state.log.take()
    }

    /// Register a callback invoked for every page event as it happens
    pub fn on_event<F>(&mut self, cb: F)
    where
        F: Fn(&PageEvent) + Send + Sync + 'static,
    {
        self.state.on_event = Some(Arc::new(cb));
    }

    /// Remove previously registered on_event callback if any
    pub fn clear_on_event(&mut self) {
        self.state.on_event = None;
    }

    /// Cancel the rotation and any pending dismissal. Removals already
    /// scheduled by a fired dismissal still run.
    pub fn shutdown(&mut self) {
        for handle in [self.rotator.take(), self.dismisser.take()].into_iter().flatten() {
            if self.timers.clear(handle) {
                debug!("cancelled timer {}", handle.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DismissConfig;

    fn config(images: &[&str]) -> SlideshowConfig {
        SlideshowConfig {
            images: images.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn document() -> Document {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let img = doc.create_element("img");
        doc.set_attribute(img, "id", "slideshow");
        doc.append_child(body, img);
        doc
    }

    #[test]
    fn rotates_every_interval() {
        let mut page = Page::new(config(&["a.jpg", "b.jpg", "c.jpg"]), document()).unwrap();
        page.advance(40_000);
        let shown: Vec<_> = page
            .events()
            .iter()
            .filter_map(|e| match e {
                PageEvent::ImageShown { at, src } => Some((*at, src.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec![(10_000, "a.jpg"), (20_000, "b.jpg"), (30_000, "c.jpg"), (40_000, "a.jpg")]);
    }

    #[test]
    fn missing_display_is_recorded_not_raised() {
        let mut page = Page::new(config(&["a.jpg"]), Document::new()).unwrap();
        page.advance(10_000);
        assert_eq!(page.events(), &[PageEvent::DisplayMissing { at: 10_000 }]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = Page::new(config(&[]), document()).unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn shutdown_stops_rotation() {
        let mut page = Page::new(config(&["a.jpg"]), document()).unwrap();
        assert!(page.is_running());
        page.shutdown();
        assert!(!page.is_running());
        assert_eq!(page.advance(100_000), 0);
        assert!(page.events().is_empty());
    }

    #[test]
    fn dismisser_can_be_disabled() {
        let mut cfg = config(&["a.jpg"]);
        cfg.dismiss = DismissConfig { enabled: false, ..Default::default() };
        let mut doc = document();
        let flash = doc.create_element("div");
        doc.add_class(flash, "flash");
        let body = doc.body().unwrap();
        doc.append_child(body, flash);

        let mut page = Page::new(cfg, doc).unwrap();
        page.advance(7_000);
        assert!(page.document().contains(flash));
        assert!(page.events().is_empty());
    }

    #[test]
    fn handler_sees_events_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut page = Page::new(config(&["a.jpg", "b.jpg"]), document()).unwrap();
        page.on_event(move |e| sink.lock().unwrap().push(e.at()));
        page.advance(20_000);
        page.clear_on_event();
        page.advance(10_000);
        assert_eq!(*seen.lock().unwrap(), vec![10_000, 20_000]);
        assert_eq!(page.take_events().len(), 3);
        assert!(page.events().is_empty());
    }

    #[test]
    fn every_event_kind_becomes_one_json_line() {
        let mut log = EventLog::default();
        log.push(PageEvent::ImageShown { at: 1, src: "a \"quoted\" path.jpg".into() });
        log.push(PageEvent::DisplayMissing { at: 2 });
        log.push(PageEvent::Faded { at: 3, node: 4 });
        log.push(PageEvent::Removed { at: 4, node: 4 });
        log.push(PageEvent::RemovalSkipped { at: 5, node: 4 });
        let text = log.to_json_lines();
        assert_eq!(text.lines().count(), 5);
        let parsed: Vec<PageEvent> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(parsed, log.as_slice());
    }

    #[test]
    fn digest_is_stable_for_identical_traces() {
        let mut a = Page::new(config(&["a.jpg", "b.jpg"]), document()).unwrap();
        let mut b = Page::new(config(&["a.jpg", "b.jpg"]), document()).unwrap();
        a.advance(50_000);
        b.advance(50_000);
        assert_eq!(a.event_log().digest(), b.event_log().digest());
        assert_eq!(a.event_log().digest().len(), 64);
        assert!(a.event_log().to_json_lines().starts_with("{\"event\":\"image_shown\",\"at\":10000,\"src\":\"a.jpg\"}\n"));
    }
}
