//! Request/response interceptors.
//!
//! Three hook levels run around every call, always in this order:
//!
//! 1. the per-resource hook of the [`ResourceDescriptor`](crate::rest::ResourceDescriptor)
//! 2. the global hook from [`ClientConfig`](crate::ClientConfig)
//! 3. the per-call hook carried by the [`Context`]
//!
//! Before the response hooks run, the payload is tagged with the resource
//! type. After them, async-task and pagination envelopes are unwrapped and
//! any record left untagged is tagged again.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use storage_api::clients::HttpRequest;
//! use storage_api::rest::{HookContext, HookError, Interceptor};
//!
//! #[derive(Debug)]
//! struct Tenant(&'static str);
//!
//! #[async_trait]
//! impl Interceptor for Tenant {
//!     async fn before_request(
//!         &self,
//!         _ctx: &HookContext<'_>,
//!         request: &mut HttpRequest,
//!     ) -> Result<(), HookError> {
//!         request
//!             .extra_headers
//!             .get_or_insert_with(Default::default)
//!             .insert("X-Tenant".to_string(), self.0.to_string());
//!         Ok(())
//!     }
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::HttpRequest;
use crate::context::Context;
use crate::rest::errors::HookStage;
use crate::rest::normalize::unwrap_envelopes;
use crate::rest::{Payload, ResourceError};

/// Error type returned by interceptors.
pub type HookError = Box<dyn StdError + Send + Sync>;

/// What a hook knows about the call it runs in.
#[derive(Clone, Copy, Debug)]
pub struct HookContext<'a> {
    /// The call's cancellation context.
    pub call: &'a Context,
    /// Resource type name, empty for raw calls.
    pub resource: &'a str,
}

/// Inspects or rewrites requests and responses.
///
/// Both methods default to no-ops.
#[async_trait]
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// Runs before the request is sent. An error aborts the call.
    async fn before_request(
        &self,
        _ctx: &HookContext<'_>,
        _request: &mut HttpRequest,
    ) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs after the response has been parsed. The returned payload replaces
    /// the original; an error replaces the whole result.
    async fn after_response(
        &self,
        _ctx: &HookContext<'_>,
        payload: Payload,
    ) -> Result<Payload, HookError> {
        Ok(payload)
    }
}

/// The ordered hooks for one call.
pub(crate) struct Pipeline<'a> {
    resource: &'a str,
    hooks: Vec<&'a Arc<dyn Interceptor>>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(
        resource: &'a str,
        per_resource: Option<&'a Arc<dyn Interceptor>>,
        global: Option<&'a Arc<dyn Interceptor>>,
        per_call: Option<&'a Arc<dyn Interceptor>>,
    ) -> Self {
        Self {
            resource,
            hooks: [per_resource, global, per_call].into_iter().flatten().collect(),
        }
    }

    pub(crate) async fn before(
        &self,
        call: &Context,
        request: &mut HttpRequest,
    ) -> Result<(), ResourceError> {
        let ctx = HookContext {
            call,
            resource: self.resource,
        };
        for hook in &self.hooks {
            hook.before_request(&ctx, request)
                .await
                .map_err(|source| self.failure(HookStage::Before, source))?;
        }
        Ok(())
    }

    pub(crate) async fn after(
        &self,
        call: &Context,
        mut payload: Payload,
    ) -> Result<Payload, ResourceError> {
        let tagged = !self.resource.is_empty();
        if tagged {
            payload.tag(self.resource);
        }

        let ctx = HookContext {
            call,
            resource: self.resource,
        };
        for hook in &self.hooks {
            payload = hook
                .after_response(&ctx, payload)
                .await
                .map_err(|source| self.failure(HookStage::After, source))?;
        }

        let mut payload = unwrap_envelopes(payload);
        if tagged {
            payload.tag_if_missing(self.resource);
        }
        Ok(payload)
    }

    fn failure(&self, stage: HookStage, source: HookError) -> ResourceError {
        tracing::debug!("{} interceptor failed for {:?}: {}", stage, self.resource, source);
        ResourceError::Interceptor {
            stage,
            resource: self.resource.to_string(),
            source,
        }
    }
}
