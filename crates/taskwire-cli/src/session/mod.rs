//! Builds a client bound to the on-disk session.

pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use taskwire_core::{ApiUrl, ClientConfig, TaskView};
use taskwire_http::TaskClient;

use crate::cli::ServiceArgs;
use crate::output::ConsoleNotifier;

/// Client configuration from the command line.
pub fn config(service: &ServiceArgs) -> Result<ClientConfig> {
    let api = ApiUrl::new(&service.api_url).context("Invalid API URL")?;
    let mut config = ClientConfig::new(api)
        .context("Invalid API URL")?
        .with_request_timeout(Duration::from_secs(service.timeout_secs.max(1)));

    if let Some(ws) = &service.ws_url {
        config = config.with_ws_base(ApiUrl::new(ws).context("Invalid push channel URL")?);
    }

    debug!(api = %config.api_base, ws = %config.ws_base, "client config");
    Ok(config)
}

/// A client using the stored session.
pub fn client(service: &ServiceArgs) -> Result<TaskClient> {
    Ok(builder(service)?.build())
}

/// A client using the stored session that hands task changes to `view`.
pub fn client_with_view(service: &ServiceArgs, view: Arc<dyn TaskView>) -> Result<TaskClient> {
    Ok(builder(service)?.view(view).build())
}

fn builder(service: &ServiceArgs) -> Result<taskwire_http::TaskClientBuilder> {
    let storage = storage::open(service.data_dir.as_deref())?;
    Ok(TaskClient::builder(config(service)?)
        .storage(Arc::new(storage))
        .notifier(Arc::new(ConsoleNotifier)))
}

/// A client that must already hold a session.
pub fn logged_in(service: &ServiceArgs) -> Result<TaskClient> {
    let client = client(service)?;
    if !client.has_session() {
        anyhow::bail!("No active session. Run 'taskwire login' first.");
    }
    Ok(client)
}
