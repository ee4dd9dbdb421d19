//! Ordered queue of synthesized output awaiting playback

use crate::phonemes::VisemeEntry;
use log::debug;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// One playable chunk
#[derive(Debug, Clone, PartialEq)]
pub struct OutputItem {
    /// Audio container, e.g. `wav`
    pub audio_ext: String,
    pub path: PathBuf,
    /// Lip-sync data, when phonemes were available
    pub visemes: Option<Vec<VisemeEntry>>,
    /// Caller's reference to the interaction this came from
    pub ident: Option<String>,
    /// Start listening once this item has played
    pub listen: bool,
}

/// FIFO shared between the synthesizing side and a playback consumer
#[derive(Debug, Default)]
pub struct OutputQueue {
    items: Mutex<VecDeque<OutputItem>>,
    ready: Condvar,
}

impl OutputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, item: OutputItem) {
        debug!("Queued {}", item.path.display());
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.push_back(item);
        self.ready.notify_one();
    }

    /// Next item, if any, without waiting
    pub fn pop(&self) -> Option<OutputItem> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }

    /// Next item, waiting up to `timeout` for one to arrive
    pub fn pop_timeout(&self, timeout: Duration) -> Option<OutputItem> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        let (mut items, _) = self
            .ready
            .wait_timeout_while(items, timeout, |items| items.is_empty())
            .unwrap_or_else(|e| e.into_inner());
        items.pop_front()
    }

    /// Take everything queued so far, in order
    pub fn drain(&self) -> Vec<OutputItem> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        debug!("Draining {} queued item(s)", items.len());
        items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
