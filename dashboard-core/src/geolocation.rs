//! Adapter from a callback-style position capability to a single awaitable
//! lookup.

use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    error::{DashboardError, Result},
    model::Coordinates,
};

pub const NOT_SUPPORTED: &str = "Geolocation is not supported on this platform";

const FAILURE_PREFIX: &str = "Failed to get current location: ";

/// Options passed to the position capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// How long the capability may take to acquire a fix.
    pub timeout: Duration,
    /// Oldest cached fix the capability may answer with.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

/// Failure reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub type SuccessCallback = Box<dyn FnOnce(Coordinates) + Send + 'static>;
pub type ErrorCallback = Box<dyn FnOnce(PositionError) + Send + 'static>;

/// A platform position capability.
///
/// Implementations answer by calling one of the callbacks, from any thread,
/// at any later time.
pub trait PositionSource: Send + Sync + Debug {
    fn get_current_position(
        &self,
        options: PositionOptions,
        on_success: SuccessCallback,
        on_error: ErrorCallback,
    );
}

/// Answers every request with the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

impl PositionSource for FixedPosition {
    fn get_current_position(
        &self,
        _options: PositionOptions,
        on_success: SuccessCallback,
        _on_error: ErrorCallback,
    ) {
        on_success(self.0);
    }
}

type Slot = Arc<Mutex<Option<oneshot::Sender<std::result::Result<Coordinates, PositionError>>>>>;

fn deliver(slot: &Slot, outcome: std::result::Result<Coordinates, PositionError>) {
    let sender = match slot.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    };

    match sender {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => debug!("Position already delivered, ignoring late callback"),
    }
}

/// Resolve the current position once, using the default [`PositionOptions`].
pub async fn current_location(source: Option<&dyn PositionSource>) -> Result<Coordinates> {
    current_location_with(source, PositionOptions::default()).await
}

/// Resolve the current position once.
///
/// Fails immediately when `source` is `None`. The first callback to fire
/// settles the result; anything after that is dropped.
pub async fn current_location_with(
    source: Option<&dyn PositionSource>,
    options: PositionOptions,
) -> Result<Coordinates> {
    let Some(source) = source else {
        return Err(DashboardError::Geolocation(NOT_SUPPORTED.to_string()));
    };

    let (tx, rx) = oneshot::channel();
    let slot: Slot = Arc::new(Mutex::new(Some(tx)));

    let on_success: SuccessCallback = {
        let slot = slot.clone();
        Box::new(move |coords| deliver(&slot, Ok(coords)))
    };
    let on_error: ErrorCallback = {
        let slot = slot.clone();
        Box::new(move |err| deliver(&slot, Err(err)))
    };
    // Only the callbacks may hold the sender, so a source that drops both
    // without answering closes the channel.
    drop(slot);

    debug!(?options, "Requesting current position");
    source.get_current_position(options, on_success, on_error);

    let outcome = match tokio::time::timeout(options.timeout, rx).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_closed)) => Err(PositionError::new(
            PositionErrorCode::PositionUnavailable,
            "position source gave no answer",
        )),
        Err(_elapsed) => Err(PositionError::new(
            PositionErrorCode::Timeout,
            "Timeout expired",
        )),
    };

    outcome.map_err(|err| {
        warn!(code = ?err.code, message = %err.message, "Geolocation failed");
        DashboardError::Geolocation(format!("{FAILURE_PREFIX}{}", err.message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Denied;

    impl PositionSource for Denied {
        fn get_current_position(
            &self,
            _options: PositionOptions,
            _on_success: SuccessCallback,
            on_error: ErrorCallback,
        ) {
            on_error(PositionError::new(
                PositionErrorCode::PermissionDenied,
                "User denied Geolocation",
            ));
        }
    }

    /// Answers from another thread, then tries to answer again.
    #[derive(Debug)]
    struct Chatty;

    impl PositionSource for Chatty {
        fn get_current_position(
            &self,
            _options: PositionOptions,
            on_success: SuccessCallback,
            on_error: ErrorCallback,
        ) {
            std::thread::spawn(move || {
                on_success(Coordinates::new(48.85, 2.35));
                on_error(PositionError::new(PositionErrorCode::Timeout, "late"));
            });
        }
    }

    #[derive(Debug)]
    struct Silent;

    impl PositionSource for Silent {
        fn get_current_position(
            &self,
            _options: PositionOptions,
            _on_success: SuccessCallback,
            _on_error: ErrorCallback,
        ) {
        }
    }

    #[derive(Debug, Default)]
    struct Recording {
        calls: AtomicUsize,
        seen: Mutex<Option<PositionOptions>>,
    }

    impl PositionSource for Recording {
        fn get_current_position(
            &self,
            options: PositionOptions,
            on_success: SuccessCallback,
            _on_error: ErrorCallback,
        ) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some(options);
            on_success(Coordinates::new(1.0, 2.0));
        }
    }

    #[tokio::test]
    async fn missing_capability_is_not_supported() {
        let err = current_location(None).await.unwrap_err();
        assert_eq!(err, DashboardError::Geolocation(NOT_SUPPORTED.into()));
        assert!(err.to_string().contains("not supported"));
    }

    #[tokio::test]
    async fn fixed_position_resolves() {
        let source = FixedPosition(Coordinates::new(52.52, 13.405));
        let coords = current_location(Some(&source)).await.unwrap();
        assert_eq!(coords, Coordinates::new(52.52, 13.405));
    }

    #[tokio::test]
    async fn platform_error_text_is_embedded() {
        let err = current_location(Some(&Denied)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to get current location: User denied Geolocation"
        );
    }

    #[tokio::test]
    async fn first_answer_wins() {
        let coords = current_location(Some(&Chatty)).await.unwrap();
        assert_eq!(coords, Coordinates::new(48.85, 2.35));
    }

    #[tokio::test]
    async fn dropped_callbacks_fail_instead_of_hanging() {
        let err = current_location(Some(&Silent)).await.unwrap_err();
        assert!(err.to_string().starts_with(FAILURE_PREFIX));
    }

    #[tokio::test]
    async fn requests_high_accuracy_defaults_once() {
        let source = Recording::default();
        current_location(Some(&source)).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        let seen = source.seen.lock().unwrap().unwrap();
        assert!(seen.enable_high_accuracy);
        assert_eq!(seen.timeout, Duration::from_secs(10));
        assert_eq!(seen.maximum_age, Duration::from_secs(300));
    }

    struct Hoarding(Mutex<Vec<SuccessCallback>>);

    impl std::fmt::Debug for Hoarding {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("Hoarding")
        }
    }

    impl PositionSource for Hoarding {
        fn get_current_position(
            &self,
            _options: PositionOptions,
            on_success: SuccessCallback,
            _on_error: ErrorCallback,
        ) {
            // Keeps the callback alive but never calls it.
            self.0.lock().unwrap().push(on_success);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() {
        let source = Hoarding(Mutex::new(Vec::new()));
        let err = current_location(Some(&source)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to get current location: Timeout expired"
        );
    }
}
