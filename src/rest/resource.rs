//! Generic resource handle.
//!
//! A [`Resource`] pairs a [`ResourceDescriptor`] with a connected
//! [`Client`]. Every operation goes through the same dispatch path: version
//! gate, before-hooks, transport, normalizer, after-hooks.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use storage_api::rest::{Params, ResourceDescriptor};
//!
//! let volumes = client.resource(ResourceDescriptor::new("volumes", "volume"));
//!
//! let all = volumes.list(&ctx, &Params::new()).await?;
//! let db = volumes.ensure_by_name(&ctx, "db01", json!({"size": 100})).await?;
//! volumes.delete(&ctx, &Params::new().with("name", "db01"), &Params::new()).await?;
//! ```

use serde_json::Value;

use crate::clients::HttpMethod;
use crate::context::Context;
use crate::rest::path::build_path;
use crate::rest::{
    FatalError, FromPayload, Params, Record, RecordSet, ResourceDescriptor, ResourceError,
    ResourceId,
};
use crate::session::{Call, Client};

/// Operations on one resource type over one connection.
#[derive(Clone, Debug)]
pub struct Resource {
    descriptor: ResourceDescriptor,
    client: Client,
}

impl Resource {
    pub(crate) const fn new(descriptor: ResourceDescriptor, client: Client) -> Self {
        Self { descriptor, client }
    }

    /// Returns the descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Returns the connection this handle dispatches through.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns `{path}/{id}` followed by `segments`.
    #[must_use]
    pub fn path_for(&self, id: &ResourceId, segments: &[&str]) -> String {
        build_path(self.descriptor.path(), id, segments)
    }

    /// Sends an arbitrary call and converts the result to `T`.
    ///
    /// `path` is relative to the API root, not to the resource path. Use
    /// [`path_for`](Self::path_for) to address sub-collections.
    ///
    /// # Errors
    ///
    /// Returns any [`ResourceError`] raised by dispatch, or
    /// [`ResourceError::ShapeMismatch`] when the result cannot become `T`.
    pub async fn request<T: FromPayload>(
        &self,
        ctx: &Context,
        method: HttpMethod,
        path: &str,
        query: &Params,
        body: Option<Value>,
    ) -> Result<T, ResourceError> {
        let call = Call {
            method,
            path: path.to_string(),
            query: query.to_query(),
            body,
        };
        let payload = self.client.dispatch(ctx, &self.descriptor, call).await?;
        T::convert(payload, self.descriptor.name())
    }

    /// Lists records matching `params`.
    ///
    /// Zero matches is an empty set, never [`ResourceError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn list(&self, ctx: &Context, params: &Params) -> Result<RecordSet, ResourceError> {
        self.request(ctx, HttpMethod::Get, self.descriptor.path(), params, None)
            .await
    }

    /// Returns the single record matching `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] when nothing matches, or when the
    /// only match is an empty record, and [`ResourceError::TooManyRecords`]
    /// when more than one record matches.
    pub async fn get(&self, ctx: &Context, params: &Params) -> Result<Record, ResourceError> {
        let mut records = self.list(ctx, params).await?;
        match records.len() {
            0 => Err(self.not_found(params)),
            1 => {
                let record = records.remove(0);
                if record.is_empty() {
                    Err(self.not_found(params))
                } else {
                    Ok(record)
                }
            }
            count => Err(ResourceError::TooManyRecords {
                resource: self.descriptor.name().to_string(),
                count,
                params: params.to_string(),
            }),
        }
    }

    /// Fetches a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn get_by_id(
        &self,
        ctx: &Context,
        id: impl Into<ResourceId> + Send,
    ) -> Result<Record, ResourceError> {
        let path = self.path_for(&id.into(), &[]);
        self.request(ctx, HttpMethod::Get, &path, &Params::new(), None)
            .await
    }

    /// Creates a record with `POST {path}`.
    ///
    /// For asynchronous mutations the result is a task reference record,
    /// see [`TaskRef::from_record`](crate::rest::TaskRef::from_record).
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn create(
        &self,
        ctx: &Context,
        body: impl Into<Value> + Send,
    ) -> Result<Record, ResourceError> {
        self.request(
            ctx,
            HttpMethod::Post,
            self.descriptor.path(),
            &Params::new(),
            Some(body.into()),
        )
        .await
    }

    /// Updates a record with `PATCH {path}/{id}`.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn update(
        &self,
        ctx: &Context,
        id: impl Into<ResourceId> + Send,
        body: impl Into<Value> + Send,
    ) -> Result<Record, ResourceError> {
        let path = self.path_for(&id.into(), &[]);
        self.request(ctx, HttpMethod::Patch, &path, &Params::new(), Some(body.into()))
            .await
    }

    /// Updates a resource identified by unique fields with `PATCH {path}`.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn update_non_id(
        &self,
        ctx: &Context,
        body: impl Into<Value> + Send,
    ) -> Result<Record, ResourceError> {
        self.request(
            ctx,
            HttpMethod::Patch,
            self.descriptor.path(),
            &Params::new(),
            Some(body.into()),
        )
        .await
    }

    /// Deletes the record matching `search`, sending `delete_params` as the
    /// body.
    ///
    /// Deleting something that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns lookup errors other than [`ResourceError::NotFound`],
    /// [`ResourceError::MissingId`] if the match has no `id`, and any error
    /// of the delete call itself.
    pub async fn delete(
        &self,
        ctx: &Context,
        search: &Params,
        delete_params: &Params,
    ) -> Result<(), ResourceError> {
        let record = match self.get(ctx, search).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} matching {} already absent", self.descriptor.name(), search);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let id = record.id().ok_or_else(|| ResourceError::MissingId {
            resource: self.descriptor.name().to_string(),
        })?;
        self.delete_by_id(ctx, id, &Params::new(), delete_params)
            .await
    }

    /// Deletes with `DELETE {path}/{id}`.
    ///
    /// `query` is attached to the URL and `delete_params` sent as the body.
    ///
    /// # Errors
    ///
    /// Returns any dispatch error.
    pub async fn delete_by_id(
        &self,
        ctx: &Context,
        id: impl Into<ResourceId> + Send,
        query: &Params,
        delete_params: &Params,
    ) -> Result<(), ResourceError> {
        let path = self.path_for(&id.into(), &[]);
        self.request(ctx, HttpMethod::Delete, &path, query, delete_params.to_body())
            .await
    }

    /// Returns the record matching `search`, creating it from `body` when
    /// there is none.
    ///
    /// An existing record is returned unchanged; it is not updated.
    ///
    /// # Errors
    ///
    /// Returns lookup errors other than [`ResourceError::NotFound`] and any
    /// error of the create call.
    pub async fn ensure(
        &self,
        ctx: &Context,
        search: &Params,
        body: impl Into<Value> + Send,
    ) -> Result<Record, ResourceError> {
        match self.get(ctx, search).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_not_found() => self.create(ctx, body).await,
            Err(e) => Err(e),
        }
    }

    /// [`ensure`](Self::ensure) keyed on `name`.
    ///
    /// On creation `name` is injected into an object `body`.
    ///
    /// # Errors
    ///
    /// Same as [`ensure`](Self::ensure).
    pub async fn ensure_by_name(
        &self,
        ctx: &Context,
        name: &str,
        body: impl Into<Value> + Send,
    ) -> Result<Record, ResourceError> {
        let mut body = body.into();
        match &mut body {
            Value::Object(fields) => {
                fields.insert("name".to_string(), Value::from(name));
            }
            Value::Null => body = serde_json::json!({ "name": name }),
            _ => {}
        }
        self.ensure(ctx, &Params::new().with("name", name), body)
            .await
    }

    /// Returns `false` only when the lookup fails with
    /// [`ResourceError::NotFound`].
    ///
    /// Ambiguous matches count as existing. Other failures are logged and
    /// also count as existing; use [`must_exists`](Self::must_exists) to see
    /// them.
    pub async fn exists(&self, ctx: &Context, params: &Params) -> bool {
        match self.get(ctx, params).await {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                tracing::warn!(
                    "Treating {} matching {} as existing after lookup error: {}",
                    self.descriptor.name(),
                    params,
                    e
                );
                true
            }
        }
    }

    /// Like [`exists`](Self::exists), but any failure other than
    /// [`ResourceError::NotFound`] and [`ResourceError::TooManyRecords`] is
    /// returned as a [`FatalError`].
    ///
    /// Meant for setup and test code.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError`] wrapping the lookup failure.
    pub async fn must_exists(&self, ctx: &Context, params: &Params) -> Result<bool, FatalError> {
        match self.get(ctx, params).await {
            Ok(_) | Err(ResourceError::TooManyRecords { .. }) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(FatalError { source }),
        }
    }

    fn not_found(&self, params: &Params) -> ResourceError {
        ResourceError::NotFound {
            resource: self.descriptor.name().to_string(),
            params: params.to_string(),
        }
    }
}
