use super::MemoryStore;
use crate::application_port::ContactError;
use crate::domain_model::*;
use crate::domain_port::PostRepo;

#[async_trait::async_trait]
impl PostRepo for MemoryStore {
    async fn get_summary(&self, post_id: PostId) -> Result<Option<PostSummary>, ContactError> {
        Ok(self.lock().posts.get(&post_id).cloned())
    }

    async fn get_summaries(&self, post_ids: &[PostId]) -> Result<Vec<PostSummary>, ContactError> {
        let state = self.lock();
        Ok(post_ids
            .iter()
            .filter_map(|id| state.posts.get(id).cloned())
            .collect())
    }
}
