//! Timed dismissal of marked elements (flash messages): fade once, then
//! remove each element after a further delay.

use crate::dom::{DocumentTree, NodeId};
use crate::timers::{TimerHandle, TimerQueue};
use crate::{Error, Result};
use log::debug;

pub const DEFAULT_FADE_DELAY_MS: u64 = 5000;
pub const DEFAULT_REMOVAL_DELAY_MS: u64 = 1000;

/// What happened to a marked element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Opacity set to zero; removal scheduled
    Faded(NodeId),
    /// Element detached from the tree
    Removed(NodeId),
    /// Element was already gone when its removal came due
    AlreadyGone(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dismisser {
    marker_class: String,
    fade_delay_ms: u64,
    removal_delay_ms: u64,
}

impl Dismisser {
    pub fn new(marker_class: impl Into<String>) -> Result<Self> {
        let marker_class = marker_class.into();
        if marker_class.trim().is_empty() || marker_class.contains(char::is_whitespace) {
            return Err(Error::ConfigError(format!("invalid marker class {:?}", marker_class)));
        }
        Ok(Self {
            marker_class,
            fade_delay_ms: DEFAULT_FADE_DELAY_MS,
            removal_delay_ms: DEFAULT_REMOVAL_DELAY_MS,
        })
    }

    pub fn fade_delay_ms(mut self, ms: u64) -> Self {
        self.fade_delay_ms = ms;
        self
    }

    pub fn removal_delay_ms(mut self, ms: u64) -> Self {
        self.removal_delay_ms = ms;
        self
    }

    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Schedule the one-shot dismissal `fade_delay_ms` from now
    pub fn install<S, D, P, F>(self, timers: &mut TimerQueue<S>, doc: P, on_event: F) -> TimerHandle
    where
        S: 'static,
        D: DocumentTree + 'static,
        P: Fn(&mut S) -> &mut D + Clone + 'static,
        F: Fn(&mut S, u64, Dismissal) + Clone + 'static,
    {
        let delay = self.fade_delay_ms;
        timers.set_timeout(delay, move |state, q| {
            self.fire(state, q, doc.clone(), on_event.clone());
        })
    }

    /// Query the marker set once, fade every match and schedule its removal.
    /// Returns the number of matched elements.
    pub fn fire<S, D, P, F>(&self, state: &mut S, timers: &mut TimerQueue<S>, doc: P, on_event: F) -> usize
    where
        S: 'static,
        D: DocumentTree + 'static,
        P: Fn(&mut S) -> &mut D + Clone + 'static,
        F: Fn(&mut S, u64, Dismissal) + Clone + 'static,
    {
        let matched = doc(state).elements_by_class_name(&self.marker_class);
        if matched.is_empty() {
            debug!("no .{} elements to dismiss", self.marker_class);
            return 0;
        }

        for node in matched.iter().copied() {
            doc(state).set_style_property(node, "opacity", "0");
            on_event(state, timers.now(), Dismissal::Faded(node));

            let doc = doc.clone();
            let on_event = on_event.clone();
            timers.set_timeout(self.removal_delay_ms, move |state, q| {
                let outcome = if doc(state).remove_element(node) {
                    Dismissal::Removed(node)
                } else {
                    debug!("element {} already detached", node);
                    Dismissal::AlreadyGone(node)
                };
                on_event(state, q.now(), outcome);
            });
        }
        matched.len()
    }
}
