use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, CountOptions, FindOptions},
};

use docmodel_core::{
    driver::{StoreDriver, StoreDriverBuilder},
    error::{AdapterError, AdapterResult},
    scope::{Conditions, Scope},
};

#[derive(Debug)]
pub struct MongoDriver {
    client: Client,
    database: String,
}

impl MongoDriver {
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    pub fn builder(uri: impl Into<String>) -> MongoDriverBuilder {
        MongoDriverBuilder::new(uri)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

fn find_options(conditions: &Conditions) -> FindOptions {
    let mut options = FindOptions::default();

    options.sort = conditions.sort.clone();
    options.skip = conditions.skip;
    options.limit = conditions
        .limit
        .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

    options
}

fn count_options(conditions: &Conditions) -> CountOptions {
    let mut options = CountOptions::default();

    // The server refuses a zero limit on counts; for finds it means "no limit".
    options.limit = conditions.limit.filter(|limit| *limit > 0);
    options.skip = conditions.skip;

    options
}

#[async_trait]
impl StoreDriver for MongoDriver {
    async fn insert_one(&self, collection: &str, record: Document) -> AdapterResult<()> {
        self.get_collection(collection)
            .insert_one(record)
            .await
            .map_err(AdapterError::store)?;

        Ok(())
    }

    async fn update_one(&self, collection: &str, scope: &Scope, update: Document) -> AdapterResult<()> {
        let result = self
            .get_collection(collection)
            .update_one(scope.filter.clone(), update)
            .await
            .map_err(AdapterError::store)?;

        tracing::debug!(
            collection,
            matched = result.matched_count,
            modified = result.modified_count,
            "updated record"
        );

        Ok(())
    }

    async fn find(&self, collection: &str, scope: &Scope) -> AdapterResult<Vec<Document>> {
        tracing::trace!(collection, filter = %scope.filter, "finding records");

        self.get_collection(collection)
            .find(scope.filter.clone())
            .with_options(find_options(&scope.conditions))
            .await
            .map_err(AdapterError::store)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(AdapterError::store)
    }

    async fn count(&self, collection: &str, scope: &Scope) -> AdapterResult<u64> {
        self.get_collection(collection)
            .count_documents(scope.filter.clone())
            .with_options(count_options(&scope.conditions))
            .await
            .map_err(AdapterError::store)
    }

    async fn delete_many(&self, collection: &str, scope: &Scope) -> AdapterResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_many(scope.filter.clone())
                .await
                .map_err(AdapterError::store)?
                .deleted_count
        )
    }

    async fn delete_all(&self, collection: &str) -> AdapterResult<()> {
        self.get_collection(collection)
            .delete_many(doc! {})
            .await
            .map_err(AdapterError::store)?;

        Ok(())
    }

    async fn shutdown(self) -> AdapterResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder for [`MongoDriver`].
///
/// The database is taken from [`database`](MongoDriverBuilder::database) when set,
/// otherwise from the path of the connection string (`mongodb://host/<database>`).
#[derive(Debug, Clone)]
pub struct MongoDriverBuilder {
    uri: String,
    database: Option<String>,
}

impl MongoDriverBuilder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
        }
    }

    /// Overrides the database named in the connection string.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

#[async_trait]
impl StoreDriverBuilder for MongoDriverBuilder {
    type Driver = MongoDriver;

    fn uri(&self) -> &str {
        &self.uri
    }

    async fn build(self) -> AdapterResult<Self::Driver> {
        let options = ClientOptions::parse(&self.uri)
            .await
            .map_err(AdapterError::store)?;

        let database = self
            .database
            .or_else(|| options.default_database.clone())
            .ok_or_else(|| {
                AdapterError::DatabaseAdapterNotFound(format!("no database named in {}", self.uri))
            })?;

        tracing::debug!(database = %database, "connecting to mongodb");

        Ok(MongoDriver::new(
            Client::with_options(options).map_err(AdapterError::store)?,
            database,
        ))
    }
}
