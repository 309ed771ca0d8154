//! Session store - the single owner of [`SessionState`]
//!
//! Mutations run through [`handler::update`] under the write lock; the events
//! they produce are broadcast once the lock is released. Readers take cheap
//! clones of the state or borrow it through [`Store::read`].

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::trace;

use crate::handler::{self, UpdateResult};
use crate::message::Mutation;
use crate::session_event::SessionEvent;
use crate::state::SessionState;

/// Shared handle to the session state and its event stream
#[derive(Debug, Clone)]
pub struct Store {
    state: Arc<RwLock<SessionState>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Store {
    pub fn new(state: SessionState, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(state)),
            event_tx,
        }
    }

    /// Apply a mutation and publish its events
    pub fn dispatch(&self, mutation: Mutation) -> UpdateResult {
        let result = {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            handler::update(&mut guard, mutation)
        };
        for event in &result.events {
            self.emit(event.clone());
        }
        result
    }

    /// Clone of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Read part of the state without cloning all of it
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&SessionState) -> T,
    {
        let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Publish an event that is not tied to a mutation
    pub fn emit(&self, event: SessionEvent) {
        trace!("session event: {}", event.event_type());
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
