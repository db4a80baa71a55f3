//! Command implementations

pub mod declarative;
pub mod object;

use anyhow::{Context as AnyhowContext, Result};
use permissions::Client;
use permissions::backend::http::HttpConfig;
use std::time::Duration;

use crate::Context;

/// Build a workspace client from the global options
pub fn connect(ctx: &Context) -> Result<Client> {
    let host = ctx
        .host
        .as_deref()
        .context("No workspace host. Pass --host or set DATABRICKS_HOST")?;
    let token = ctx
        .token
        .as_deref()
        .context("No access token. Pass --token or set DATABRICKS_TOKEN")?;

    let mut config = HttpConfig::new(host, token);
    config.timeout = Duration::from_secs(ctx.timeout);
    Ok(Client::new(&config)?)
}
