use datastore_model::{
    async_trait, Datastore, DeleteResponse, Fields, Key, MutationResult, Record, SaveRequest,
};
use thiserror::Error;

/// Kind whose writes and deletes the stub rejects.
pub const FAILING_KIND: &str = "Error";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("stub datastore rejected {0}")]
pub struct StubError(pub String);

/// Datastore that finds an empty record at every key and fails any write
/// or delete against [`FAILING_KIND`].
#[derive(Debug, Default, Clone)]
pub struct StubDatastore;

impl StubDatastore {
    fn check(key: &Key) -> Result<(), StubError> {
        if key.path()[0].kind == FAILING_KIND {
            return Err(StubError(key.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Datastore for StubDatastore {
    type Query = ();
    type Error = StubError;

    async fn save(&self, request: SaveRequest) -> Result<(), StubError> {
        Self::check(&request.key)
    }

    async fn get(&self, key: &Key) -> Result<Option<Record>, StubError> {
        Ok(Some(Record {
            key: key.clone(),
            data: Fields::new(),
        }))
    }

    async fn get_many(&self, keys: &[Key]) -> Result<Vec<Record>, StubError> {
        Ok(keys
            .iter()
            .map(|key| Record {
                key: key.clone(),
                data: Fields::new(),
            })
            .collect())
    }

    async fn run_query(&self, _query: &()) -> Result<Vec<Record>, StubError> {
        Ok(Vec::new())
    }

    async fn delete(&self, key: &Key) -> Result<DeleteResponse, StubError> {
        Self::check(key)?;
        Ok(DeleteResponse {
            mutation_result: MutationResult { index_updates: 1 },
        })
    }
}
