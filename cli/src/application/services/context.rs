//! Binds a [`ResourceHost`] to one resource id so it can serve as an
//! [`ExecContext`].

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::application::ports::{ExecContext, ResourceHost};
use crate::domain::ResourceId;

/// Commands and copies routed into one resource through the host.
pub struct ResourceContext<'a, H> {
    host: &'a H,
    id: ResourceId,
}

impl<'a, H: ResourceHost> ResourceContext<'a, H> {
    pub fn new(host: &'a H, id: ResourceId) -> Self {
        Self { host, id }
    }
}

impl<H: ResourceHost> ExecContext for ResourceContext<'_, H> {
    fn describe(&self) -> String {
        format!("resource {}", self.id)
    }

    async fn exec(&self, args: &[&str]) -> Result<Output> {
        self.host.exec(self.id, args).await
    }

    async fn push(&self, local: &Path, remote: &str, mode: u32) -> Result<Output> {
        self.host.push(self.id, local, remote, mode).await
    }
}
