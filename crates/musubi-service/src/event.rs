//! Event management.

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::event::{CreateEvent, Event, UpdateEvent};
use musubi_core::repository::{EventRepository, MemberRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::require_non_empty;
use crate::guard::require_organizer;

/// Event details supplied by an organizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    /// Per-attendee fee, copied onto each payment record.
    pub fee: u64,
}

pub struct EventService<M: MemberRepository, E: EventRepository> {
    members: M,
    events: E,
}

impl<M: MemberRepository, E: EventRepository> EventService<M, E> {
    pub fn new(members: M, events: E) -> Self {
        Self { members, events }
    }

    pub async fn create_event(
        &self,
        circle_id: Uuid,
        input: EventInput,
        actor: &str,
    ) -> MusubiResult<Event> {
        require_organizer(&self.members, circle_id, actor).await?;
        require_non_empty("event name", &input.name)?;

        let event = self
            .events
            .create(CreateEvent {
                circle_id,
                name: input.name,
                description: input.description,
                date: input.date,
                location: input.location,
                fee: input.fee,
                created_by: actor.to_string(),
            })
            .await?;

        info!(%circle_id, event_id = %event.id, fee = event.fee, "Created event");
        Ok(event)
    }

    pub async fn get_event(&self, circle_id: Uuid, event_id: Uuid) -> MusubiResult<Event> {
        self.events.get(circle_id, event_id).await
    }

    /// Events newest first, optionally capped at `limit`.
    pub async fn list_events(&self, circle_id: Uuid, limit: Option<u64>) -> MusubiResult<Vec<Event>> {
        self.events.list(circle_id, limit).await
    }

    /// Changing the fee does not touch payments already derived.
    pub async fn update_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        input: UpdateEvent,
        actor: &str,
    ) -> MusubiResult<Event> {
        require_organizer(&self.members, circle_id, actor).await?;
        if let Some(name) = &input.name {
            require_non_empty("event name", name)?;
        }
        self.events.update(circle_id, event_id, input).await
    }
}
