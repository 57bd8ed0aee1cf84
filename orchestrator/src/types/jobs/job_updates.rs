use mongodb::bson::{self, Bson, Document};
use serde::Serialize;

use crate::core::client::database::DatabaseError;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::metadata::CommonMetadata;
use crate::types::jobs::types::JobStatus;

/// Defining a structure that contains the changes to be made in the job object,
/// id, job_type, payload and created_at are not allowed to be changed.
// version and updated_at are always bumped by the store when these updates are applied.
//
// Optional fields use `Option<Option<_>>`: `None` leaves the field untouched, `Some(None)` clears it.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct JobItemUpdates {
    pub status: Option<JobStatus>,
    pub attempt: Option<u32>,
    pub remote_handle: Option<Option<String>>,
    pub result_location: Option<Option<String>>,
    pub error: Option<Option<String>>,
    pub metadata: Option<CommonMetadata>,
}

impl JobItemUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_status(mut self, status: JobStatus) -> JobItemUpdates {
        self.status = Some(status);
        self
    }

    pub fn update_attempt(mut self, attempt: u32) -> JobItemUpdates {
        self.attempt = Some(attempt);
        self
    }

    pub fn update_remote_handle(mut self, remote_handle: String) -> JobItemUpdates {
        self.remote_handle = Some(Some(remote_handle));
        self
    }

    pub fn clear_remote_handle(mut self) -> JobItemUpdates {
        self.remote_handle = Some(None);
        self
    }

    pub fn update_result_location(mut self, result_location: String) -> JobItemUpdates {
        self.result_location = Some(Some(result_location));
        self
    }

    pub fn update_error(mut self, error: String) -> JobItemUpdates {
        self.error = Some(Some(error));
        self
    }

    pub fn clear_error(mut self) -> JobItemUpdates {
        self.error = Some(None);
        self
    }

    pub fn update_metadata(mut self, metadata: CommonMetadata) -> JobItemUpdates {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> JobItemUpdates {
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns the job as it looks after these updates, without touching version or timestamps.
    pub fn apply_to(&self, job: &JobItem) -> JobItem {
        let mut next = job.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(attempt) = self.attempt {
            next.attempt = attempt;
        }
        if let Some(remote_handle) = &self.remote_handle {
            next.remote_handle = remote_handle.clone();
        }
        if let Some(result_location) = &self.result_location {
            next.result_location = result_location.clone();
        }
        if let Some(error) = &self.error {
            next.error = error.clone();
        }
        if let Some(metadata) = &self.metadata {
            next.metadata = metadata.clone();
        }
        next
    }

    /// `$set` body for the touched fields. Cleared fields are written as null.
    pub fn to_set_document(&self) -> Result<Document, DatabaseError> {
        let mut set = Document::new();
        if let Some(status) = &self.status {
            set.insert("status", bson::to_bson(status)?);
        }
        if let Some(attempt) = self.attempt {
            set.insert("attempt", Bson::Int64(i64::from(attempt)));
        }
        if let Some(remote_handle) = &self.remote_handle {
            set.insert("remote_handle", bson::to_bson(remote_handle)?);
        }
        if let Some(result_location) = &self.result_location {
            set.insert("result_location", bson::to_bson(result_location)?);
        }
        if let Some(error) = &self.error {
            set.insert("error", bson::to_bson(error)?);
        }
        if let Some(metadata) = &self.metadata {
            set.insert("metadata", bson::to_bson(metadata)?);
        }
        Ok(set)
    }
}
