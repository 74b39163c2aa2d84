use crate::{
    backend::{client::LOGS_ENDPOINT, BackendError, SessionApi},
    watchdog::{EventLogger, LogEvent},
};
use reqwest::Client;
use tokio::runtime::Handle;
use tracing::debug;
use url::Url;

/// Ships events to `{api}/logs` on a detached task. Delivery is best effort.
#[derive(Clone, Debug)]
pub struct HttpEventLogger {
    client: Client,
    url: Url,
}

impl HttpEventLogger {
    /// # Errors
    /// Returns an error if the logs endpoint cannot be derived from the API URL.
    pub fn new(api: &SessionApi) -> Result<Self, BackendError> {
        Ok(Self {
            client: api.client().clone(),
            url: api.endpoint_url(LOGS_ENDPOINT)?,
        })
    }
}

impl EventLogger for HttpEventLogger {
    fn log(&self, event: &LogEvent) {
        let Ok(runtime) = Handle::try_current() else {
            debug!(event = %event.event_name, "no runtime; remote log skipped");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let event = event.clone();

        runtime.spawn(async move {
            match client.post(url).json(&event).send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = %response.status(), "remote log rejected");
                }
                Ok(_) => {}
                Err(e) => debug!("remote log failed: {e}"),
            }
        });
    }
}
