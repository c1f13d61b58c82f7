use crate::application_port::ContactError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait PostRepo: Send + Sync {
    async fn get_summary(&self, post_id: PostId) -> Result<Option<PostSummary>, ContactError>;

    async fn get_summaries(&self, post_ids: &[PostId]) -> Result<Vec<PostSummary>, ContactError>;
}
