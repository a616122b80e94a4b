use std::sync::{Arc, Mutex};

use datastore_model::{async_trait, Datastore, DeleteResponse, Key, Record, SaveRequest};

/// A call made against the wrapped datastore.
#[derive(Debug, Clone)]
pub enum Call<Q> {
    Save(SaveRequest),
    Get(Key),
    GetMany(Vec<Key>),
    RunQuery(Q),
    Delete(Key),
}

/// Datastore wrapper that records every call before delegating.
pub struct RecordingDatastore<S: Datastore> {
    inner: S,
    calls: Arc<Mutex<Vec<Call<S::Query>>>>,
}

impl<S: Datastore> RecordingDatastore<S>
where
    S::Query: Clone,
{
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call<S::Query>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Save(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn last_save(&self) -> SaveRequest {
        self.saves().pop().expect("no save recorded")
    }

    fn record(&self, call: Call<S::Query>) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl<S> Datastore for RecordingDatastore<S>
where
    S: Datastore,
    S::Query: Clone,
{
    type Query = S::Query;
    type Error = S::Error;

    async fn save(&self, request: SaveRequest) -> Result<(), S::Error> {
        self.record(Call::Save(request.clone()));
        self.inner.save(request).await
    }

    async fn get(&self, key: &Key) -> Result<Option<Record>, S::Error> {
        self.record(Call::Get(key.clone()));
        self.inner.get(key).await
    }

    async fn get_many(&self, keys: &[Key]) -> Result<Vec<Record>, S::Error> {
        self.record(Call::GetMany(keys.to_vec()));
        self.inner.get_many(keys).await
    }

    async fn run_query(&self, query: &S::Query) -> Result<Vec<Record>, S::Error> {
        self.record(Call::RunQuery(query.clone()));
        self.inner.run_query(query).await
    }

    async fn delete(&self, key: &Key) -> Result<DeleteResponse, S::Error> {
        self.record(Call::Delete(key.clone()));
        self.inner.delete(key).await
    }
}
