//! In-process channel for tests and headless use.

use super::{Channel, SyncError, SyncResult, WireMessage};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    closed_by_owner: bool,
    sent: Vec<String>,
    inbound: VecDeque<String>,
}

/// A channel whose frames stay in memory.
///
/// Clones share state, so a test can keep a handle after moving one into a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryChannel {
    /// A channel that has not opened yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that is already open.
    pub fn open() -> Self {
        let channel = Self::new();
        channel.set_open(true);
        channel
    }

    pub fn set_open(&self, open: bool) {
        self.state.borrow_mut().open = open;
    }

    /// Whether the owner called [`Channel::close`].
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed_by_owner
    }

    /// Queue a frame as if a peer had sent it.
    pub fn push_inbound(&self, frame: impl Into<String>) {
        self.state.borrow_mut().inbound.push_back(frame.into());
    }

    /// Every frame sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    /// Drain the sent frames.
    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().sent)
    }

    /// Sent frames parsed back into messages; unparseable frames are skipped.
    pub fn sent_messages(&self) -> Vec<WireMessage> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter_map(|f| serde_json::from_str(f).ok())
            .collect()
    }
}

impl Channel for MemoryChannel {
    fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    fn send(&mut self, frame: &str) -> SyncResult<()> {
        let mut state = self.state.borrow_mut();
        if !state.open {
            return Err(SyncError::Closed);
        }
        state.sent.push(frame.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Vec<String> {
        self.state.borrow_mut().inbound.drain(..).collect()
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open = false;
        state.closed_by_owner = true;
    }
}
