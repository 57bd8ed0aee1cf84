use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{bson, Client, Collection, Database, IndexModel};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::DatabaseError;
use crate::core::client::database::constant::{JOBS_COLLECTION, MODEL_VERSIONS_COLLECTION};
use crate::core::client::database::DatabaseClient;
use crate::types::jobs::job_item::JobItem;
use crate::types::jobs::job_updates::JobItemUpdates;
use crate::types::jobs::types::{JobStatus, JobType};
use crate::types::params::database::MongoConfig;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB client implementation
pub struct MongoDbClient {
    client: Client,
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &MongoConfig) -> Result<Self, DatabaseError> {
        let mut client_options = ClientOptions::parse(&config.connection_url).await?;
        client_options.app_name = Some("orchestrator".to_string());
        let client = Client::with_options(client_options)?;
        let database = Arc::new(client.database(&config.database_name));
        let mongo = Self { client, database };
        mongo.create_indexes().await?;
        Ok(mongo)
    }

    /// Mongodb client uses Arc internally, reducing the cost of clone.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn get_job_collection(&self) -> Collection<JobItem> {
        self.database.collection(JOBS_COLLECTION)
    }

    fn get_model_versions_collection(&self) -> Collection<Document> {
        self.database.collection(MODEL_VERSIONS_COLLECTION)
    }

    async fn create_indexes(&self) -> Result<(), DatabaseError> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "id": 1 }).options(IndexOptions::builder().unique(true).build()).build(),
            IndexModel::builder().keys(doc! { "job_type": 1, "status": 1, "created_at": 1 }).build(),
        ];
        self.get_job_collection().create_indexes(indexes, None).await?;
        let model_index =
            IndexModel::builder().keys(doc! { "model_id": 1 }).options(IndexOptions::builder().unique(true).build()).build();
        self.get_model_versions_collection().create_index(model_index, None).await?;
        Ok(())
    }

    fn bson_list<T: serde::Serialize>(values: &[T]) -> Result<Vec<Bson>, DatabaseError> {
        values.iter().map(|value| bson::to_bson(value).map_err(DatabaseError::from)).collect()
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl DatabaseClient for MongoDbClient {
    async fn disconnect(&self) -> Result<(), DatabaseError> {
        self.client.clone().shutdown().await;
        Ok(())
    }

    async fn create_job(&self, job: JobItem) -> Result<JobItem, DatabaseError> {
        let start = Instant::now();
        job.check_consistency().map_err(DatabaseError::InvalidUpdate)?;
        self.get_job_collection().insert_one(&job, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                DatabaseError::ItemAlreadyExists(format!("Job already exists with id {}", job.id))
            } else {
                DatabaseError::MongoError(e)
            }
        })?;
        debug!(duration = %start.elapsed().as_millis(), "Job created in MongoDB successfully");
        Ok(job)
    }

    async fn get_job_by_id(&self, id: Uuid) -> Result<Option<JobItem>, DatabaseError> {
        let filter = doc! {
            "id": id
        };
        debug!("Fetched job by ID");
        Ok(self.get_job_collection().find_one(filter, None).await?)
    }

    async fn update_job(&self, current_job: &JobItem, update: JobItemUpdates) -> Result<JobItem, DatabaseError> {
        let start = Instant::now();
        if update.is_empty() {
            return Err(DatabaseError::NoUpdateFound("No field to be updated, likely a false call".to_string()));
        }
        // The pairing invariants are checked on the job as it will look, before anything is written.
        update.apply_to(current_job).check_consistency().map_err(DatabaseError::InvalidUpdate)?;

        // Filters to search for the job
        let filter = doc! {
            "id": current_job.id,
            "status": bson::to_bson(&current_job.status)?,
            "version": Bson::Int64(current_job.version as i64),
        };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();

        let mut updates = update.to_set_document()?;
        updates.insert("version", Bson::Int64(current_job.version as i64 + 1));
        let now = Utc::now().trunc_subsecs(3).max(current_job.updated_at);
        updates.insert("updated_at", Bson::DateTime(now.into()));

        let update = doc! {
            "$set": updates
        };

        let result = self.get_job_collection().find_one_and_update(filter, update, options).await?;
        match result {
            Some(job) => {
                debug!(duration = %start.elapsed().as_millis(), "Job updated successfully");
                Ok(job)
            }
            None => {
                warn!(version = %current_job.version, "Failed to update job. Job version is likely outdated");
                Err(DatabaseError::UpdateFailed(format!("Failed to update job. Identifier - {}, ", current_job.id)))
            }
        }
    }

    async fn get_jobs_by_types_and_statuses(
        &self,
        job_type: Vec<JobType>,
        status: Vec<JobStatus>,
        limit: Option<i64>,
    ) -> Result<Vec<JobItem>, DatabaseError> {
        let mut filter = Document::new();
        if !job_type.is_empty() {
            filter.insert("job_type", doc! { "$in": Self::bson_list(&job_type)? });
        }
        if !status.is_empty() {
            filter.insert("status", doc! { "$in": Self::bson_list(&status)? });
        }
        let find_options = FindOptions::builder().sort(doc! { "created_at": 1 }).limit(limit).build();

        let jobs: Vec<JobItem> = self.get_job_collection().find(filter, find_options).await?.try_collect().await?;
        debug!(job_count = jobs.len(), "Retrieved jobs by type and statuses");
        Ok(jobs)
    }

    async fn count_jobs_by_status(&self, status: JobStatus) -> Result<u64, DatabaseError> {
        let filter = doc! {
            "status": bson::to_bson(&status)?,
        };
        Ok(self.get_job_collection().count_documents(filter, None).await?)
    }

    async fn next_model_version(&self, model_id: &str) -> Result<u32, DatabaseError> {
        let filter = doc! {
            "model_id": model_id,
        };
        let update = doc! {
            "$inc": { "version": Bson::Int64(1) }
        };
        let options = FindOneAndUpdateOptions::builder().upsert(true).return_document(ReturnDocument::After).build();

        let counter = self
            .get_model_versions_collection()
            .find_one_and_update(filter, update, options)
            .await?
            .ok_or_else(|| DatabaseError::InvalidVersionCounter(format!("No counter returned for {}", model_id)))?;
        let version = match counter.get("version") {
            Some(Bson::Int64(version)) => u32::try_from(*version).ok(),
            Some(Bson::Int32(version)) => u32::try_from(*version).ok(),
            _ => None,
        }
        .filter(|version| *version > 0)
        .ok_or_else(|| DatabaseError::InvalidVersionCounter(format!("Unexpected counter for {}: {}", model_id, counter)))?;
        debug!(model_id, version, "Allocated model version");
        Ok(version)
    }
}
