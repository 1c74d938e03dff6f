use super::InteractionLog;
use crate::{Result, StoreError};
use chrono::{DateTime, Utc};
use toolhub_types::{NewInteraction, ObjectId};
use tracing::{debug, error, warn};

impl InteractionLog {
    /// Record one interaction.
    ///
    /// Returns `true` once the store has acknowledged the insert. Invalid input
    /// and store failures are logged and reported as `false`; there is no retry.
    pub fn log_interaction(&self, new: NewInteraction) -> bool {
        match self.try_log_interaction(new) {
            Ok(_) => true,
            Err(StoreError::InvalidInput(reason)) => {
                warn!(target: "toolhub::interactions", "Rejected interaction: {}", reason);
                false
            }
            Err(e) => {
                error!(target: "toolhub::interactions", "Failed to log interaction: {}", e);
                false
            }
        }
    }

    /// Record one interaction, returning the store-assigned identifier.
    pub fn try_log_interaction(&self, new: NewInteraction) -> Result<ObjectId> {
        self.try_log_interaction_at(new, Utc::now())
    }

    /// Record one interaction with `now` as its write time.
    pub fn try_log_interaction_at(&self, new: NewInteraction, now: DateTime<Utc>) -> Result<ObjectId> {
        if let Some(field) = new.missing_required() {
            return Err(StoreError::InvalidInput(format!("{field} must not be empty")));
        }

        let record = new.into_record(now);
        let id = self.collection.insert_one(record.to_document())?;
        debug!(
            target: "toolhub::interactions",
            "Logged {} interaction {} for {}/{}",
            record.interaction_type,
            id,
            record.project_name,
            record.agent_name
        );
        Ok(id)
    }
}
