//! In-memory event store.
//!
//! Each event lives in its own cell, an `Arc<Mutex<Option<Event>>>`. The map
//! of cells is only locked long enough to find or insert a cell; all reducer
//! work happens under the cell's own lock, so RSVPs to different events never
//! wait on each other while RSVPs to the same event are strictly serialized.

use super::{EventStore, StoreError};
use evently_core::aggregate::{EventAction, EventEnvironment, EventReducer, EventState};
use evently_core::effect::{Effect, StoreOperation};
use evently_core::event::Event;
use evently_core::query::EventFilter;
use evently_core::reducer::Reducer;
use evently_core::types::{EventId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Cell = Arc<Mutex<Option<Event>>>;

/// In-memory event store.
///
/// Cloning shares the underlying records.
#[derive(Clone)]
pub struct InMemoryEventStore {
    cells: Arc<RwLock<HashMap<EventId, Cell>>>,
    reducer: EventReducer,
    env: EventEnvironment,
}

impl InMemoryEventStore {
    /// Create an empty store whose reducer uses `env`.
    #[must_use]
    pub fn new(env: EventEnvironment) -> Self {
        Self {
            cells: Arc::new(RwLock::new(HashMap::new())),
            reducer: EventReducer::new(),
            env,
        }
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    /// Whether no events are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn cell(&self, id: EventId) -> Option<Cell> {
        self.cells.read().await.get(&id).cloned()
    }

    async fn cell_or_insert(&self, id: EventId) -> Cell {
        Arc::clone(self.cells.write().await.entry(id).or_default())
    }

    /// Drop `cell` from the map if it is still the one registered for `id`.
    async fn evict(&self, id: EventId, cell: &Cell) {
        let mut cells = self.cells.write().await;
        if cells.get(&id).is_some_and(|current| Arc::ptr_eq(current, cell)) {
            cells.remove(&id);
        }
    }

    /// Every stored event, cloned out of its cell.
    async fn snapshot(&self) -> Vec<Event> {
        let cells: Vec<Cell> = self.cells.read().await.values().cloned().collect();

        let mut events = Vec::with_capacity(cells.len());
        for cell in cells {
            if let Some(event) = cell.lock().await.as_ref() {
                events.push(event.clone());
            }
        }
        events
    }
}

impl std::fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventStore").finish_non_exhaustive()
    }
}

impl EventStore for InMemoryEventStore {
    async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        match self.cell(id).await {
            Some(cell) => Ok(cell.lock().await.clone()),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let mut events = self.snapshot().await;
        events.retain(|event| filter.matches(event));
        Ok(events)
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Event>, StoreError> {
        let mut events = self.snapshot().await;
        events.retain(|event| event.is_owned_by(owner));
        Ok(events)
    }

    async fn send(&self, id: EventId, action: EventAction) -> Result<EventState, StoreError> {
        let cell = if matches!(action, EventAction::Create { .. }) {
            self.cell_or_insert(id).await
        } else if let Some(cell) = self.cell(id).await {
            cell
        } else {
            // Nothing to lock: the reducer reports NotFound without touching storage.
            let mut state = EventState::new();
            let effects = self.reducer.reduce(&mut state, action, &self.env);
            debug_assert!(
                Effect::chain(effects.into_vec()).into_operations().is_empty(),
                "reducer produced store operations for an event that does not exist"
            );
            return Ok(state);
        };

        let mut record = cell.lock().await;
        let mut state = EventState::loaded(record.clone());
        let effects = self.reducer.reduce(&mut state, action, &self.env);

        let mut removed = false;
        for operation in Effect::chain(effects.into_vec()).into_operations() {
            match operation {
                StoreOperation::Save(event) => *record = Some(*event),
                StoreOperation::Remove(_) => {
                    *record = None;
                    removed = true;
                }
            }
        }

        // A rejected create or a delete leaves an empty cell behind.
        let empty = record.is_none();
        drop(record);
        if empty {
            self.evict(id, &cell).await;
        }
        if removed {
            tracing::debug!(event_id = %id, "Event removed from memory store");
        }

        Ok(state)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
