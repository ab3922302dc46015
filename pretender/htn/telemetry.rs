use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use pretender_journal::{EventPublisher, EventRecord, JsonLinesJournal, LogLevel, LogRecord};
use serde_json::Value;
use tokio::runtime::{Handle, Runtime};
use uuid::Uuid;

/// Builder for planning telemetry sinks.
pub struct PlanningTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl PlanningTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            event_publisher: None,
        }
    }

    /// Sets the log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds the telemetry handle.
    pub fn build(self) -> Result<PlanningTelemetry> {
        PlanningTelemetry::new(self.module, self.log_path, self.event_publisher)
    }
}

/// Telemetry handle shared by the planner and its runs.
#[derive(Clone)]
pub struct PlanningTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for PlanningTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanningTelemetry")
            .field("module", &self.inner.module)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLinesJournal<LogRecord>>,
    event: Option<EventHandle>,
}

struct EventHandle {
    runtime: Runtime,
    publisher: Arc<dyn EventPublisher>,
}

impl EventHandle {
    fn new(publisher: Arc<dyn EventPublisher>) -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new()?,
            publisher,
        })
    }

    fn publish(&self, record: EventRecord) -> Result<()> {
        if let Ok(handle) = Handle::try_current() {
            let publisher = Arc::clone(&self.publisher);
            handle.spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("planning event publish failed: {err:?}");
                }
            });
            Ok(())
        } else {
            self.runtime.block_on(self.publisher.publish(record))
        }
    }
}

impl PlanningTelemetry {
    fn new(
        module: impl Into<String>,
        log_path: Option<PathBuf>,
        event_publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Result<Self> {
        let logger = log_path.map(JsonLinesJournal::open).transpose()?;
        let event = event_publisher.map(EventHandle::new).transpose()?;
        Ok(Self {
            inner: Arc::new(TelemetryInner {
                module: module.into(),
                logger,
                event,
            }),
        })
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> PlanningTelemetryBuilder {
        PlanningTelemetryBuilder::new(module)
    }

    /// Logs structured metadata for a planning run.
    pub fn log(&self, run_id: &str, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let mut record = LogRecord::new(&self.inner.module, level, message).for_run(run_id);
            if let Value::Object(map) = metadata {
                record.metadata = map;
            }
            logger.append(&record)?;
        }
        Ok(())
    }

    /// Emits an event on the bus.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        if let Some(handle) = &self.inner.event {
            handle.publish(EventRecord::new(
                format!("evt-{}", Uuid::new_v4()),
                self.inner.module.clone(),
                event_type,
                payload,
            ))?;
        }
        Ok(())
    }
}
