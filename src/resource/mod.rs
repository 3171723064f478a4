//! Generic list/get/create/update/delete operations driven by a resource descriptor.
//!
//! Errors from the transport propagate unchanged; every method is at most one round trip.

use serde_json::Value;

use crate::errors::ClientError;
use crate::models::{json_kind, Record, ResourceDescriptor};
use crate::transport::{Expect, Method, TransportClient};

/// CRUD operations for one descriptor, optionally scoped to an owning user.
#[derive(Clone)]
pub struct ResourceController<'a> {
    descriptor: &'a ResourceDescriptor,
    user_id: Option<i64>,
    client: &'a TransportClient,
}

impl<'a> ResourceController<'a> {
    pub fn new(descriptor: &'a ResourceDescriptor, client: &'a TransportClient) -> Self {
        Self {
            descriptor,
            user_id: None,
            client,
        }
    }

    /// Scope a user-scoped resource to its owning user.
    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    fn collection_path(&self) -> Result<String, ClientError> {
        self.descriptor
            .collection_path(self.user_id)
            .ok_or_else(|| ClientError::MissingScope(self.descriptor.entity_key.clone()))
    }

    fn item_path(&self, id: i64) -> Result<String, ClientError> {
        self.descriptor
            .item_path(self.user_id, id)
            .ok_or_else(|| ClientError::MissingScope(self.descriptor.entity_key.clone()))
    }

    /// `GET <endpoint>/?limit=<n>`. Records come back in backend order.
    pub async fn list(&self, limit: Option<u32>) -> Result<Vec<Record>, ClientError> {
        let mut path = self.collection_path()?;
        if let Some(limit) = limit {
            path.push_str(&format!("?limit={}", limit));
        }

        let body = self
            .client
            .request(Method::Get, &path, None, Expect::Json)
            .await?;

        match body {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| Record::try_from(item).map_err(ClientError::Decode))
                .collect(),
            Some(other) => Err(ClientError::Decode(format!(
                "expected a JSON array from {}, got {}",
                path,
                json_kind(&other)
            ))),
        }
    }

    /// `GET <endpoint>/{id}`. A missing record surfaces as an API error with status 404.
    pub async fn get(&self, id: i64) -> Result<Record, ClientError> {
        let path = self.item_path(id)?;
        let body = self
            .client
            .request(Method::Get, &path, None, Expect::Json)
            .await?;
        expect_record(&path, body)
    }

    /// `POST <endpoint>/` with undeclared keys dropped.
    pub async fn create(&self, mut payload: Record) -> Result<Record, ClientError> {
        let path = self.collection_path()?;
        payload.retain_declared(self.descriptor);

        let body = payload.into_value();
        let reply = self
            .client
            .request(Method::Post, &path, Some(&body), Expect::Json)
            .await?;
        expect_record(&path, reply)
    }

    /// `PUT <endpoint>/{id}` with only the supplied keys, minus create-only fields.
    pub async fn update(&self, id: i64, mut payload: Record) -> Result<Record, ClientError> {
        let path = self.item_path(id)?;
        payload.retain_declared(self.descriptor);
        payload.strip_create_only(self.descriptor);

        let body = payload.into_value();
        let reply = self
            .client
            .request(Method::Put, &path, Some(&body), Expect::Json)
            .await?;
        expect_record(&path, reply)
    }

    /// `DELETE <endpoint>/{id}`. The reply body is never decoded.
    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let path = self.item_path(id)?;
        let reply = self
            .client
            .exchange(Method::Delete, &path, None, Expect::Empty)
            .await?;

        match reply.status {
            200 | 204 => Ok(()),
            status => Err(ClientError::Api {
                status,
                message: format!("HTTP {}", status),
            }),
        }
    }

    /// Number of records the backend lists for this resource.
    pub async fn count(&self) -> Result<usize, ClientError> {
        Ok(self.list(None).await?.len())
    }
}

fn expect_record(path: &str, body: Option<Value>) -> Result<Record, ClientError> {
    match body {
        Some(value) => Record::try_from(value)
            .map_err(|e| ClientError::Decode(format!("{} from {}", e, path))),
        None => Err(ClientError::Decode(format!(
            "expected a record from {}, got an empty reply",
            path
        ))),
    }
}
