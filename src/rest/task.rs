//! Waiting for asynchronous server-side operations.
//!
//! Mutations the control plane runs in the background answer with a task
//! envelope, which the normalizer turns into a record tagged
//! [`TASK_RESOURCE`]. A [`TaskRef`] built from that record polls
//! `tasks/{id}` until the task completes, fails, or the poll budget runs out.
//!
//! # Example
//!
//! ```rust,ignore
//! use storage_api::rest::{TaskRef, WaitPolicy};
//!
//! let accepted = volumes.create(&ctx, json!({"name": "db01"})).await?;
//! if let Some(task) = TaskRef::from_record(&client, &accepted) {
//!     let finished = task.wait(&ctx, &WaitPolicy::default()).await?;
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::context::Context;
use crate::rest::normalize::TASK_RESOURCE;
use crate::rest::{Record, ResourceDescriptor, ResourceError};
use crate::session::Client;

/// Path of the task collection below the API root.
pub const TASKS_PATH: &str = "tasks";

/// Task state that ends polling successfully.
pub const STATE_COMPLETED: &str = "completed";

/// Task state that keeps polling.
pub const STATE_RUNNING: &str = "running";

/// How often and how long a task is polled.
///
/// The default is 30 attempts, 500ms apart, with no growth between polls.
#[derive(Clone, Debug, PartialEq)]
pub struct WaitPolicy {
    attempts: u32,
    interval: Duration,
    multiplier: f64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_millis(500),
            multiplier: 1.0,
        }
    }
}

impl WaitPolicy {
    /// Sets the number of polls. Zero is treated as one.
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the second poll.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the factor applied to the delay after every poll. Values below
    /// one are treated as one.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        self
    }

    /// Returns the delay following `delay`, saturating at [`Duration::MAX`].
    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.multiplier)
            .unwrap_or(Duration::MAX)
    }

    /// Returns the number of polls.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the initial delay between polls.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the delay growth factor.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

/// A server-side operation still in flight.
///
/// Consumed by [`wait`](Self::wait).
pub struct TaskRef {
    id: i64,
    client: Client,
    deadline: Option<Instant>,
}

impl TaskRef {
    /// Creates a reference to task `id` on `client`.
    #[must_use]
    pub const fn new(client: Client, id: i64) -> Self {
        Self {
            id,
            client,
            deadline: None,
        }
    }

    /// Builds a reference from a record tagged as a task.
    ///
    /// Returns `None` for any other record.
    #[must_use]
    pub fn from_record(client: &Client, record: &Record) -> Option<Self> {
        if record.resource_type() != Some(TASK_RESOURCE) {
            return None;
        }
        record
            .id()
            .and_then(|id| id.as_int())
            .map(|id| Self::new(client.clone(), id))
    }

    /// Bounds the whole wait by `deadline`, in addition to the context's own.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Polls the task until it reaches a terminal state.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::TaskFailed`] as soon as the task reports a state
    ///   other than running or completed, carrying its last message
    /// - [`ResourceError::TaskNoMessages`] for such a failure without messages
    /// - [`ResourceError::TaskTimeout`] when it is still running after the
    ///   last attempt
    /// - [`ResourceError::Context`] when the context or deadline ends first
    /// - the last fetch error, when the final poll itself failed
    pub async fn wait(self, ctx: &Context, policy: &WaitPolicy) -> Result<Record, ResourceError> {
        let ctx = match self.deadline {
            Some(deadline) => ctx.with_deadline(deadline),
            None => ctx.clone(),
        };
        let tasks = self
            .client
            .resource(ResourceDescriptor::new(TASKS_PATH, TASK_RESOURCE));

        let mut delay = policy.interval;
        let mut last_error = None;
        for attempt in 1..=policy.attempts {
            tracing::debug!(
                "Polling task {} (attempt {} of {})",
                self.id,
                attempt,
                policy.attempts
            );
            match tasks.get_by_id(&ctx, self.id).await {
                Ok(record) => {
                    last_error = None;
                    match record.get_str("state") {
                        Some(STATE_COMPLETED) => return Ok(record),
                        Some(STATE_RUNNING) => {}
                        _ => return Err(self.failure(&record)),
                    }
                }
                Err(e @ ResourceError::Context(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!("Fetching task {} failed: {}", self.id, e);
                    last_error = Some(e);
                }
            }

            if attempt < policy.attempts {
                ctx.sleep(delay).await?;
                delay = policy.next_delay(delay);
            }
        }

        Err(last_error.unwrap_or(ResourceError::TaskTimeout {
            id: self.id,
            attempts: policy.attempts,
        }))
    }

    fn failure(&self, record: &Record) -> ResourceError {
        let name = record.get_str("name").unwrap_or_default().to_string();
        let last_message = record
            .get("messages")
            .and_then(Value::as_array)
            .and_then(|messages| messages.last());

        match last_message {
            Some(message) => ResourceError::TaskFailed {
                id: self.id,
                name,
                message: message_text(message),
            },
            None => ResourceError::TaskNoMessages { id: self.id, name },
        }
    }
}

fn message_text(message: &Value) -> String {
    match message {
        Value::String(text) => text.clone(),
        Value::Object(fields) => match fields.get("message") {
            Some(Value::String(text)) => text.clone(),
            _ => message.to_string(),
        },
        other => other.to_string(),
    }
}

impl fmt::Debug for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRef")
            .field("id", &self.id)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
