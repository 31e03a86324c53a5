//! Traits related to remote git forges
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        request::{CommentRequest, PullRequestDetails},
    },
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    fn remote_config(&self) -> RemoteConfig;
    async fn get_pull_request(
        &self,
        number: u64,
    ) -> Result<PullRequestDetails>;
    async fn post_comment(&self, req: CommentRequest) -> Result<()>;
}
