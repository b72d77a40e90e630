//! Image rotation: a fixed list of references and a circular cursor.

use crate::dom::DocumentTree;
use crate::timers::{TimerHandle, TimerQueue};
use crate::{Error, Result};
use log::debug;

/// Ordered image list plus the index of the next image to show
#[derive(Debug, Clone, PartialEq)]
pub struct Rotator {
    images: Vec<String>,
    cursor: usize,
    display_id: String,
}

impl Rotator {
    /// Build a rotator. The list must be non-empty and the id non-blank.
    pub fn new<I, T>(images: I, display_id: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let images: Vec<String> = images.into_iter().map(Into::into).collect();
        if images.is_empty() {
            return Err(Error::ConfigError("image list must not be empty".into()));
        }
        let display_id = display_id.into();
        if display_id.trim().is_empty() {
            return Err(Error::ConfigError("display id must not be empty".into()));
        }
        Ok(Self { images, cursor: 0, display_id })
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    /// Reference the next tick will write
    pub fn peek(&self) -> &str {
        &self.images[self.cursor]
    }

    /// Restart the sequence from the first image
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// One rotation step: write the current image into the display target
    /// (looked up fresh), then advance the cursor whether or not the target
    /// was found. Returns the reference written.
    pub fn tick<D: DocumentTree>(&mut self, doc: &mut D) -> Option<String> {
        let shown = match doc.element_by_id(&self.display_id) {
            Some(node) => {
                let src = self.images[self.cursor].clone();
                doc.set_attribute(node, "src", &src);
                Some(src)
            }
            None => {
                debug!("display target #{} not found; skipping write", self.display_id);
                None
            }
        };
        self.cursor = (self.cursor + 1) % self.images.len();
        shown
    }

    /// Schedule `tick` every `interval_ms` on `timers`. `on_tick` sees the
    /// host state and the tick result; `doc` projects the document out of
    /// the host state.
    pub fn install<S, D, P, F>(mut self, timers: &mut TimerQueue<S>, interval_ms: u64, doc: P, mut on_tick: F) -> TimerHandle
    where
        S: 'static,
        D: DocumentTree + 'static,
        P: Fn(&mut S) -> &mut D + 'static,
        F: FnMut(&mut S, u64, Option<String>) + 'static,
    {
        timers.set_interval(interval_ms, move |state, q| {
            let shown = self.tick(doc(state));
            on_tick(state, q.now(), shown);
        })
    }
}
