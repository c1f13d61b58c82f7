use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>) -> RealUserService {
        RealUserService { user_repo }
    }

    async fn ensure_target(&self, blocker: UserId, target: UserId) -> Result<(), UserError> {
        if blocker == target {
            return Err(UserError::Validation("cannot block yourself".to_owned()));
        }
        if self.user_repo.get_summary(target).await?.is_none() {
            return Err(UserError::UserNotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn get_summary(&self, user_id: UserId) -> Result<UserSummary, UserError> {
        self.user_repo
            .get_summary(user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    async fn block(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError> {
        self.ensure_target(blocker, blocked).await?;
        self.user_repo.block(blocker, blocked).await?;
        tracing::info!(%blocker, %blocked, "user blocked");
        Ok(())
    }

    async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<(), UserError> {
        self.ensure_target(blocker, blocked).await?;
        self.user_repo.unblock(blocker, blocked).await
    }

    async fn list_blocked(&self, blocker: UserId) -> Result<Vec<UserSummary>, UserError> {
        let ids = self.user_repo.list_blocked(blocker).await?;
        self.user_repo.get_summaries(&ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryStore;

    #[tokio::test]
    async fn block_is_symmetric_and_reversible() {
        let store = Arc::new(MemoryStore::new());
        let a = store.insert_user("A", None);
        let b = store.insert_user("B", None);
        let svc = RealUserService::new(store.clone());

        svc.block(a, b).await.unwrap();
        svc.block(a, b).await.unwrap();
        assert!(store.is_blocked_either(b, a).await.unwrap());
        assert_eq!(
            svc.list_blocked(a).await.unwrap().into_iter().map(|u| u.user_id).collect::<Vec<_>>(),
            vec![b]
        );

        svc.unblock(a, b).await.unwrap();
        assert!(!store.is_blocked_either(a, b).await.unwrap());
    }

    #[tokio::test]
    async fn cannot_block_self_or_unknown_user() {
        let store = Arc::new(MemoryStore::new());
        let a = store.insert_user("A", None);
        let svc = RealUserService::new(store);

        assert!(matches!(svc.block(a, a).await, Err(UserError::Validation(_))));
        assert!(matches!(
            svc.block(a, UserId::new_v4()).await,
            Err(UserError::UserNotFound)
        ));
    }
}
