//! Search-as-you-type with a debounce delay.

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{model::LocationSuggestion, provider::WeatherApi};

/// Suggestions delivered for the query that survived the quiet period.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchUpdate {
    pub query: String,
    pub suggestions: Vec<LocationSuggestion>,
}

/// Delays location searches until input pauses.
///
/// Every [`input`](Self::input) aborts the pending search, if any, and
/// schedules a new one after `delay`. Only a task that survives its delay
/// calls the provider, so at most one search goes out per quiet period.
#[derive(Debug)]
pub struct SearchDebouncer {
    api: Arc<dyn WeatherApi>,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<SearchUpdate>,
}

impl SearchDebouncer {
    /// Must be called within a Tokio runtime.
    pub fn new(
        api: Arc<dyn WeatherApi>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            api,
            delay,
            pending: None,
            tx,
        };
        (debouncer, rx)
    }

    /// Record the latest query text and restart the delay.
    pub fn input(&mut self, query: impl Into<String>) {
        self.cancel();

        let query = query.into();
        let api = self.api.clone();
        let tx = self.tx.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            debug!(%query, "Debounce elapsed, searching");
            let suggestions = match api.search_locations(&query).await {
                Ok(found) => found,
                Err(err) => {
                    warn!(%query, error = %err, "Location search failed");
                    Vec::new()
                }
            };

            let _ = tx.send(SearchUpdate { query, suggestions });
        }));
    }

    /// Drop the pending search, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
