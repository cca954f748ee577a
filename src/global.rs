//! Process-wide failure sources.
//!
//! Failures nobody awaited still reach the handler: panics through a panic
//! hook, errored or panicked tasks through [`spawn_supervised`], and failed
//! resource loads through [`report_resource_failure`]. All of them are tagged
//! with the [`GLOBAL_COMPONENT`] component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};

use crate::core_types::{Failure, FailureKind};
use crate::handler::{panic_failure, ErrorHandler, HandleOptions};
use crate::logging::{log_debug, log_error, log_warn};

/// Component name attached to every globally captured failure
pub const GLOBAL_COMPONENT: &str = "GlobalErrorHandler";

/// Kind of resource whose load failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Script,
    Stylesheet,
    Image,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}

fn global_options(source: &str) -> HandleOptions {
    HandleOptions::new()
        .component(GLOBAL_COMPONENT)
        .context_value("source", source)
}

async fn forward(handler: &ErrorHandler, failure: Failure, options: HandleOptions) {
    // Global options never rethrow, so this only fails on a handler bug
    if let Err(error) = handler.handle_error(failure, options).await {
        log_warn!(error = %error, "Global failure could not be handled");
    }
}

/// Report a failed script, stylesheet or image load
pub async fn report_resource_failure(handler: &ErrorHandler, kind: ResourceKind, url: &str) {
    let failure = Failure::named("ResourceLoadError", format!("Failed to load {kind}: {url}"))
        .with_kind(FailureKind::Resource);
    let options = global_options("resource")
        .context_value("resource_kind", kind.to_string())
        .context_value("url", url);
    forward(handler, failure, options).await;
}

/// Report a task that panicked or was cancelled
pub async fn report_task_failure(handler: &ErrorHandler, error: JoinError) {
    let failure = if error.is_panic() {
        panic_failure(error.into_panic().as_ref())
    } else {
        Failure::named("TaskCancelled", error.to_string())
    };
    forward(handler, failure, global_options("task")).await;
}

/// Spawn `future`, reporting an `Err` result, a panic or a cancellation to
/// `handler`. The returned handle resolves to the value, or `None` on failure.
///
/// With a panic hook installed a panicking task is reported twice: once by the
/// hook and once here.
pub fn spawn_supervised<T, E, Fut>(handler: Arc<ErrorHandler>, future: Fut) -> JoinHandle<Option<T>>
where
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<Failure> + Send + 'static,
{
    tokio::spawn(async move {
        match tokio::spawn(future).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                forward(&handler, error.into(), global_options("unhandled_result")).await;
                None
            }
            Err(join_error) => {
                report_task_failure(&handler, join_error).await;
                None
            }
        }
    })
}

/// Restores the previous panic hook when dropped.
///
/// Restoring replaces whatever hook is current at drop time. Guards must be
/// dropped in reverse order of installation, and no other code may install a
/// hook while a guard is alive, or that later hook is discarded.
#[must_use = "the panic hook is removed when the guard is dropped"]
pub struct PanicHookGuard {
    restore: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl fmt::Debug for PanicHookGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicHookGuard")
            .field("installed", &self.restore.is_some())
            .finish()
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
            log_debug!("Panic hook removed");
        }
    }
}

/// Route panics to `handler` while the returned guard lives.
///
/// The previous hook still runs first. Reports are spawned on the current
/// tokio runtime; panics on threads without one are only logged. The hook
/// holds a weak reference, so it never keeps the handler alive.
pub fn install_panic_hook(handler: &Arc<ErrorHandler>) -> PanicHookGuard {
    let weak: Weak<ErrorHandler> = Arc::downgrade(handler);
    let previous = Arc::new(std::panic::take_hook());
    let chained = Arc::clone(&previous);

    std::panic::set_hook(Box::new(move |info| {
        chained(info);

        let mut failure = panic_failure(info.payload());
        if let Some(location) = info.location() {
            failure = failure.with_stack(format!(
                "at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ));
        }

        let Some(handler) = weak.upgrade() else {
            return;
        };
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    forward(&handler, failure, global_options("panic")).await;
                });
            }
            Err(_) => log_error!(failure = %failure, "Panic outside a runtime, not reported"),
        }
    }));

    PanicHookGuard {
        restore: Some(Box::new(move || {
            let _ours = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| previous(info)));
        })),
    }
}

/// Report a failure caught at a process boundary (a request loop, a worker's
/// top level) with a short description of where it was caught
pub async fn report_failure(handler: &ErrorHandler, failure: impl Into<Failure>, detail: &str) {
    let options = global_options("boundary").context_value("detail", detail);
    forward(handler, failure.into(), options).await;
}
