//! Message-queue listener routing messages to a handler.

use std::fmt;
use std::sync::Arc;

use muster_config::{PropertyProvider, parse_property, prefixed_key};
use muster_core::{
    Addon, AddonError, AddonRepo, AddonResult, HealthStatus, InjectionRegistry,
    InjectionRegistryExt, ServerHandle,
};
use tracing::debug;

use crate::configured;
use crate::endpoint::{Endpoint, endpoint_for};

const KEY_URL: &str = "queue.url";
const KEY_USER: &str = "queue.user";
const KEY_PASSWORD: &str = "queue.password";
const KEY_QUEUE_INPUT: &str = "queue.name.input";
const KEY_QUEUE_ERROR: &str = "queue.name.error";
const KEY_ENTRIES_MAX: &str = "queue.entries.max";
const KEY_ENTRIES_GRACE: &str = "queue.entries.grace";
const DEFAULT_ENTRIES_MAX: u32 = 1;
const DEFAULT_ENTRIES_GRACE: u32 = 60;

/// Consumer of queued messages.
pub trait MessageHandler: fmt::Debug + Send + Sync {
    /// Handles one message.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure; the listener moves the message
    /// to the error queue.
    fn handle(&self, message: &str) -> Result<(), String>;
}

/// Connection settings of a queue listener.
#[derive(Clone, PartialEq, Eq)]
pub struct QueueListener {
    endpoint: Endpoint,
    user: String,
    password: String,
    input_queue: String,
    error_queue: String,
    entries_max: u32,
    entries_grace: u32,
}

impl fmt::Debug for QueueListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueListener")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("input_queue", &self.input_queue)
            .field("error_queue", &self.error_queue)
            .field("entries_max", &self.entries_max)
            .field("entries_grace", &self.entries_grace)
            .finish_non_exhaustive()
    }
}

impl QueueListener {
    /// Broker URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Broker user.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Broker password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Queue messages are read from.
    #[must_use]
    pub fn input_queue(&self) -> &str {
        &self.input_queue
    }

    /// Queue failed messages are moved to.
    #[must_use]
    pub fn error_queue(&self) -> &str {
        &self.error_queue
    }

    /// Queue depth tolerated by the input health check.
    #[must_use]
    pub const fn entries_max(&self) -> u32 {
        self.entries_max
    }

    /// Seconds a deep queue is tolerated before reporting unhealthy.
    #[must_use]
    pub const fn entries_grace(&self) -> u32 {
        self.entries_grace
    }

    /// Routes `message` to `handler`, naming the queue it ends up in.
    #[must_use]
    pub fn deliver(&self, handler: &dyn MessageHandler, message: &str) -> &str {
        match handler.handle(message) {
            Ok(()) => &self.input_queue,
            Err(reason) => {
                debug!(
                    target: "muster::addons",
                    queue = %self.error_queue,
                    reason = %reason,
                    "message moved to error queue"
                );
                &self.error_queue
            }
        }
    }

    fn check(&self, queue: &str) -> HealthStatus {
        if queue.trim().is_empty() {
            HealthStatus::Unhealthy(format!("no queue name on {}", self.endpoint))
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Listener configured from `queue.*` properties.
///
/// Several listeners need distinct names; each reads `<name>.queue.*`.
#[derive(Clone)]
pub struct MessageQueueListenerAddon {
    name: Option<String>,
    handler: Arc<dyn MessageHandler>,
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    input_queue: Option<String>,
    error_queue: Option<String>,
    entries_max: u32,
    entries_grace: u32,
    listener: Option<Arc<QueueListener>>,
}

impl fmt::Debug for MessageQueueListenerAddon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueueListenerAddon")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("url", &self.url)
            .field("input_queue", &self.input_queue)
            .field("error_queue", &self.error_queue)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

impl MessageQueueListenerAddon {
    /// Creates an unnamed listener delivering to `handler`.
    #[must_use]
    pub fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            name: None,
            handler,
            url: None,
            user: None,
            password: None,
            input_queue: None,
            error_queue: None,
            entries_max: DEFAULT_ENTRIES_MAX,
            entries_grace: DEFAULT_ENTRIES_GRACE,
            listener: None,
        }
    }

    /// Names the listener.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the queue depth used when the properties do not provide one.
    #[must_use]
    pub fn entries_max(self, entries_max: u32) -> Self {
        Self {
            entries_max,
            ..self
        }
    }

    /// Sets the grace period used when the properties do not provide one.
    #[must_use]
    pub fn entries_grace(self, entries_grace: u32) -> Self {
        Self {
            entries_grace,
            ..self
        }
    }

    /// The listener, once initialized.
    #[must_use]
    pub const fn listener(&self) -> Option<&Arc<QueueListener>> {
        self.listener.as_ref()
    }

    fn key(&self, key: &str) -> String {
        prefixed_key(self.name.as_deref(), key)
    }
}

impl Addon for MessageQueueListenerAddon {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        let read = |key: &str, fallback: Option<&str>| {
            properties.require_with_fallback(&self.key(key), fallback)
        };
        let url = read(KEY_URL, self.url.as_deref())?;
        let user = read(KEY_USER, self.user.as_deref())?;
        let password = read(KEY_PASSWORD, self.password.as_deref())?;
        let input_queue = read(KEY_QUEUE_INPUT, self.input_queue.as_deref())?;
        let error_queue = read(KEY_QUEUE_ERROR, self.error_queue.as_deref())?;
        let entries_max = parse_property(
            properties,
            &self.key(KEY_ENTRIES_MAX),
            Some(self.entries_max),
        )?;
        let entries_grace = parse_property(
            properties,
            &self.key(KEY_ENTRIES_GRACE),
            Some(self.entries_grace),
        )?;
        Ok(Arc::new(Self {
            url: Some(url),
            user: Some(user),
            password: Some(password),
            input_queue: Some(input_queue),
            error_queue: Some(error_queue),
            entries_max,
            entries_grace,
            ..Self::clone(&self)
        }))
    }

    fn initialize(self: Arc<Self>, _addons: &AddonRepo) -> AddonResult {
        let name = self.name.as_deref();
        let url = configured(self.url.as_deref(), name, KEY_URL)?;
        let listener = QueueListener {
            endpoint: endpoint_for(&*self, url)?,
            user: configured(self.user.as_deref(), name, KEY_USER)?.to_owned(),
            password: configured(self.password.as_deref(), name, KEY_PASSWORD)?.to_owned(),
            input_queue: configured(self.input_queue.as_deref(), name, KEY_QUEUE_INPUT)?
                .to_owned(),
            error_queue: configured(self.error_queue.as_deref(), name, KEY_QUEUE_ERROR)?
                .to_owned(),
            entries_max: self.entries_max,
            entries_grace: self.entries_grace,
        };
        debug!(
            target: "muster::addons",
            listener = name.unwrap_or("default"),
            input = %listener.input_queue,
            "queue listener ready"
        );
        Ok(Arc::new(Self {
            listener: Some(Arc::new(listener)),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let listener = self.listener.clone().ok_or_else(|| {
            AddonError::hook("MessageQueueListenerAddon", "listener was not initialized")
        })?;
        let name = self.name.as_deref();
        bindings.bind_as(listener, name);
        bindings.bind_as(Arc::new(Arc::clone(&self.handler)), name);
        bindings.bind_as(Arc::new(self.clone()), name);
        Ok(())
    }

    fn mount(&self, server: &mut dyn ServerHandle) -> Result<(), AddonError> {
        let Some(listener) = self.listener.clone() else {
            return Ok(());
        };
        let input = format!(
            "Input queue: {} on {}",
            listener.input_queue, listener.endpoint
        );
        let error = format!(
            "Error queue: {} on {}",
            listener.error_queue, listener.endpoint
        );
        let input_listener = Arc::clone(&listener);
        server.add_health_check(
            &input,
            Arc::new(move || input_listener.check(&input_listener.input_queue)),
        );
        server.add_health_check(
            &error,
            Arc::new(move || listener.check(&listener.error_queue)),
        );
        Ok(())
    }
}
