//! Catalog storage for the ticketing platform
//!
//! Provides:
//! - Events created by organizers
//! - Event categories and universities (reference data)
//! - Validation of event input against that reference data

pub mod model;
pub mod service;

pub use model::{AdditionalService, BasicService, Event, EventCategory, NewEvent, University};
pub use service::EventService;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use ticketing_core::ObjectId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Persistence for events and catalog reference data
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: &Event) -> Result<()>;

    async fn get_event(&self, id: ObjectId) -> Result<Option<Event>>;

    /// All events, soonest first
    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn insert_category(&self, category: &EventCategory) -> Result<()>;

    async fn list_categories(&self) -> Result<Vec<EventCategory>>;

    async fn insert_university(&self, university: &University) -> Result<()>;

    async fn list_universities(&self) -> Result<Vec<University>>;
}

/// In-memory catalog. Data is lost on restart.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<ObjectId, Event>>,
    categories: RwLock<Vec<EventCategory>>,
    universities: RwLock<Vec<University>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut events = self.events.write();
        if events.contains_key(&event.id) {
            return Err(StorageError::StorageError(format!(
                "event {} already exists",
                event.id
            )));
        }
        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: ObjectId) -> Result<Option<Event>> {
        Ok(self.events.read().get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.events.read().values().cloned().collect();
        events.sort_by(|a, b| {
            a.event_date
                .cmp(&b.event_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(events)
    }

    async fn insert_category(&self, category: &EventCategory) -> Result<()> {
        self.categories.write().push(category.clone());
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<EventCategory>> {
        Ok(self.categories.read().clone())
    }

    async fn insert_university(&self, university: &University) -> Result<()> {
        self.universities.write().push(university.clone());
        Ok(())
    }

    async fn list_universities(&self) -> Result<Vec<University>> {
        Ok(self.universities.read().clone())
    }
}
