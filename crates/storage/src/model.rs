use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketing_core::ObjectId;

use crate::{Result, StorageError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCategory {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
}

/// Service included in the ticket price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicService {
    pub title: String,
}

/// Optional paid extra
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalService {
    pub title: String,
    pub price: i64,
    #[serde(default)]
    pub description: String,
}

/// Event creation input, as sent by an organizer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub price: i64,
    pub description: String,
    pub image: String,
    pub categories: Vec<ObjectId>,
    pub basic_services: Vec<BasicService>,
    pub additional_services: Vec<AdditionalService>,
    pub is_university_event: bool,
    #[serde(default)]
    pub university: Option<ObjectId>,
    pub event_date: DateTime<Utc>,
    pub registration_start_date: DateTime<Utc>,
    pub registration_end_date: DateTime<Utc>,
}

impl NewEvent {
    /// Field-level checks that need no store access
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("image", &self.image),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::Validation(format!("{} is required", name)));
            }
        }
        if self.price < 0 {
            return Err(StorageError::Validation("price must not be negative".to_string()));
        }
        if self.basic_services.iter().any(|s| s.title.trim().is_empty()) {
            return Err(StorageError::Validation("basic service title is required".to_string()));
        }
        if self
            .additional_services
            .iter()
            .any(|s| s.title.trim().is_empty() || s.price < 0)
        {
            return Err(StorageError::Validation(
                "additional services need a title and a non-negative price".to_string(),
            ));
        }
        if self.is_university_event && self.university.is_none() {
            return Err(StorageError::Validation(
                "university is required for university events".to_string(),
            ));
        }
        if self.registration_start_date > self.registration_end_date {
            return Err(StorageError::Validation(
                "registration must start before it ends".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub price: i64,
    pub description: String,
    pub image: String,
    pub categories: Vec<ObjectId>,
    pub basic_services: Vec<BasicService>,
    pub additional_services: Vec<AdditionalService>,
    pub is_university_event: bool,
    pub university: Option<ObjectId>,
    pub organizer: ObjectId,
    pub event_date: DateTime<Utc>,
    pub registration_start_date: DateTime<Utc>,
    pub registration_end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(organizer: ObjectId, input: NewEvent) -> Self {
        Self {
            id: ObjectId::new(),
            title: input.title.trim().to_string(),
            price: input.price,
            description: input.description,
            image: input.image,
            categories: input.categories,
            basic_services: input.basic_services,
            additional_services: input.additional_services,
            is_university_event: input.is_university_event,
            university: input.university,
            organizer,
            event_date: input.event_date,
            registration_start_date: input.registration_start_date,
            registration_end_date: input.registration_end_date,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "title": "Any title",
            "price": 3000,
            "description": "Lorem ipsum",
            "image": "https://example.com/placeholder.png",
            "categories": [],
            "basicServices": [{ "title": "service1" }, { "title": "service2" }],
            "additionalServices": [
                { "title": "aService1", "price": 1000, "description": "desc1" }
            ],
            "isUniversityEvent": false,
            "eventDate": "2020-05-20T10:00:00.000Z",
            "registrationStartDate": "2020-05-01T10:00:00.000Z",
            "registrationEndDate": "2020-05-10T10:00:00.000Z",
            "organizer": { "ignored": true }
        })
    }

    #[test]
    fn test_parses_client_payload() {
        let input: NewEvent = serde_json::from_value(payload()).unwrap();
        assert_eq!(input.price, 3000);
        assert_eq!(input.basic_services.len(), 2);
        assert!(input.university.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_do_not_parse() {
        let result: std::result::Result<NewEvent, _> =
            serde_json::from_value(json!({ "title": "Any title" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rules() {
        let base: NewEvent = serde_json::from_value(payload()).unwrap();

        let blank_title = NewEvent {
            title: "  ".to_string(),
            ..base.clone()
        };
        assert!(matches!(blank_title.validate(), Err(StorageError::Validation(_))));

        let negative = NewEvent {
            price: -1,
            ..base.clone()
        };
        assert!(negative.validate().is_err());

        let university_without_id = NewEvent {
            is_university_event: true,
            ..base.clone()
        };
        assert!(university_without_id.validate().is_err());

        let inverted = NewEvent {
            registration_start_date: base.registration_end_date,
            registration_end_date: base.registration_start_date,
            ..base.clone()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_event_serializes_with_client_field_names() {
        let input: NewEvent = serde_json::from_value(payload()).unwrap();
        let organizer = ObjectId::new();
        let event = Event::new(organizer, input);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["_id"], json!(event.id));
        assert_eq!(json["organizer"], json!(organizer));
        assert!(json.get("basicServices").is_some());
        assert!(json.get("isUniversityEvent").is_some());
    }
}
