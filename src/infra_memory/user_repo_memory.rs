use super::MemoryStore;
use crate::application_port::UserError;
use crate::domain_model::*;
use crate::domain_port::UserRepo;

#[async_trait::async_trait]
impl UserRepo for MemoryStore {
    async fn get_summary(&self, user_id: UserId) -> Result<Option<UserSummary>, UserError> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn get_summaries(&self, user_ids: &[UserId]) -> Result<Vec<UserSummary>, UserError> {
        let state = self.lock();
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn is_blocked_either(&self, a: UserId, b: UserId) -> Result<bool, UserError> {
        let state = self.lock();
        Ok(state.blocks.contains(&(a, b)) || state.blocks.contains(&(b, a)))
    }

    async fn block(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError> {
        self.lock().blocks.insert((blocker, blocked));
        Ok(())
    }

    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError> {
        self.lock().blocks.remove(&(blocker, blocked));
        Ok(())
    }

    async fn list_blocked(&self, blocker: UserId) -> Result<Vec<UserId>, UserError> {
        let mut ids: Vec<UserId> = self
            .lock()
            .blocks
            .iter()
            .filter(|(by, _)| *by == blocker)
            .map(|(_, blocked)| *blocked)
            .collect();
        ids.sort();
        Ok(ids)
    }
}
