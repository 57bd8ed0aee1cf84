use crate::cli::database::mongodb::MongoDBCliArgs;
use crate::OrchestratorError;

/// Validated MongoDB parameters
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub connection_url: String,
    pub database_name: String,
}

#[derive(Debug, Clone)]
pub enum DatabaseParams {
    InMemory,
    MongoDB(MongoConfig),
}

impl TryFrom<MongoDBCliArgs> for DatabaseParams {
    type Error = OrchestratorError;
    fn try_from(args: MongoDBCliArgs) -> Result<Self, Self::Error> {
        if !args.mongodb {
            return Ok(Self::InMemory);
        }
        Ok(Self::MongoDB(MongoConfig {
            connection_url: args.mongodb_connection_url.ok_or_else(|| {
                OrchestratorError::RunCommandError("MongoDB connection url is required".to_string())
            })?,
            database_name: args
                .mongodb_database_name
                .ok_or_else(|| OrchestratorError::RunCommandError("MongoDB database name is required".to_string()))?,
        }))
    }
}
