use std::sync::Arc;
use ticketing_core::ObjectId;
use tracing::{debug, info};

use crate::{Event, EventCategory, EventStore, NewEvent, Result, StorageError, University};

/// Event catalog operations on top of an [`EventStore`]
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Create an event owned by `organizer`
    ///
    /// # Arguments
    /// * `organizer` - Id of the creating user
    /// * `input` - Event data; categories and university must already exist
    pub async fn create_event(&self, organizer: ObjectId, input: NewEvent) -> Result<Event> {
        input.validate()?;

        let categories = self.store.list_categories().await?;
        if let Some(missing) = input
            .categories
            .iter()
            .find(|id| !categories.iter().any(|c| c.id == **id))
        {
            return Err(StorageError::Validation(format!("unknown category {}", missing)));
        }

        if let Some(university) = input.university {
            let universities = self.store.list_universities().await?;
            if !universities.iter().any(|u| u.id == university) {
                return Err(StorageError::Validation(format!(
                    "unknown university {}",
                    university
                )));
            }
        }

        let event = Event::new(organizer, input);
        self.store.insert_event(&event).await?;

        info!(event_id = %event.id, organizer = %organizer, "event created");
        Ok(event)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.store.list_events().await
    }

    pub async fn get_event(&self, id: ObjectId) -> Result<Event> {
        self.store
            .get_event(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("event {}", id)))
    }

    pub async fn list_categories(&self) -> Result<Vec<EventCategory>> {
        self.store.list_categories().await
    }

    pub async fn list_universities(&self) -> Result<Vec<University>> {
        self.store.list_universities().await
    }

    /// Find a category by title (case-insensitive), creating it if absent
    pub async fn ensure_category(&self, title: &str) -> Result<EventCategory> {
        let title = required_title(title)?;
        if let Some(existing) = self
            .store
            .list_categories()
            .await?
            .into_iter()
            .find(|c| c.title.eq_ignore_ascii_case(title))
        {
            return Ok(existing);
        }

        let category = EventCategory {
            id: ObjectId::new(),
            title: title.to_string(),
        };
        self.store.insert_category(&category).await?;
        debug!(category = %category.title, "category added");
        Ok(category)
    }

    /// Find a university by title (case-insensitive), creating it if absent
    pub async fn ensure_university(&self, title: &str) -> Result<University> {
        let title = required_title(title)?;
        if let Some(existing) = self
            .store
            .list_universities()
            .await?
            .into_iter()
            .find(|u| u.title.eq_ignore_ascii_case(title))
        {
            return Ok(existing);
        }

        let university = University {
            id: ObjectId::new(),
            title: title.to_string(),
        };
        self.store.insert_university(&university).await?;
        debug!(university = %university.title, "university added");
        Ok(university)
    }
}

fn required_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StorageError::Validation("title is required".to_string()));
    }
    Ok(title)
}
