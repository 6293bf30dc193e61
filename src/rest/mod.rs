//! Resource dispatch for the control plane REST API.
//!
//! This module holds the untyped core every resource shares:
//!
//! - **[`Record`] / [`RecordSet`] / [`Payload`]**: The three response shapes
//! - **Normalizer**: Shape detection plus async-task and pagination unwrapping
//! - **[`Interceptor`]**: Before/after hooks at resource, client and call level
//! - **[`ResourceDescriptor`]**: Immutable path, name and version metadata
//! - **[`Resource`]**: List/Get/Create/Update/Delete/Ensure/Exists for any descriptor
//! - **[`TaskRef`]**: Polling of asynchronous operations
//! - **[`ResourceError`]**: Semantic error types for resource operations
//!
//! # Example
//!
//! ```rust,ignore
//! use storage_api::rest::{Params, ResourceDescriptor};
//!
//! let hosts = client.resource(ResourceDescriptor::new("hosts", "host"));
//! let web = hosts.get(&ctx, &Params::new().with("name", "web01")).await?;
//! println!("{:?}", web.get_str("iqn"));
//! ```

mod descriptor;
mod errors;
mod fill;
mod interceptor;
pub mod normalize;
mod params;
mod path;
mod record;
mod resource;
mod response;
mod task;

pub use descriptor::ResourceDescriptor;
pub use errors::{FatalError, HookStage, ResourceError};
pub use fill::{fill_record, RecordFiller};
pub use interceptor::{HookContext, HookError, Interceptor};
pub(crate) use interceptor::Pipeline;
pub use params::Params;
pub use path::{build_path, ResourceId};
pub use record::{Record, RecordSet};
pub use resource::Resource;
pub use response::{FromPayload, Payload};
pub use task::{TaskRef, WaitPolicy, STATE_COMPLETED, STATE_RUNNING, TASKS_PATH};
