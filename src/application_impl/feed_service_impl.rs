use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealFeedService {
    post_repo: Arc<dyn PostRepo>,
    room_broker: Arc<dyn RoomBroker>,
}

impl RealFeedService {
    pub fn new(post_repo: Arc<dyn PostRepo>, room_broker: Arc<dyn RoomBroker>) -> RealFeedService {
        RealFeedService {
            post_repo,
            room_broker,
        }
    }
}

#[async_trait::async_trait]
impl FeedService for RealFeedService {
    async fn announce(&self, owner: UserId, post_id: PostId) -> Result<PostSummary, FeedError> {
        let post = self
            .post_repo
            .get_summary(post_id)
            .await?
            .ok_or(FeedError::PostNotFound)?;
        if post.owner != owner {
            return Err(FeedError::NotOwner);
        }

        let public = post.without_contact_details();
        self.room_broker
            .emit_to_room(RoomKey::Everyone, &S2CEvent::NewPost(public.clone()), None)
            .await
            .map_err(|e| FeedError::Broadcast(e.to_string()))?;
        tracing::info!(%owner, %post_id, "post announced");

        Ok(public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::{MemoryStore, RecordingBroker};

    #[tokio::test]
    async fn announce_strips_contact_details() {
        let store = Arc::new(MemoryStore::new());
        let broker = Arc::new(RecordingBroker::default());
        let feed = RealFeedService::new(store.clone(), broker.clone());

        let owner = store.insert_user("Olive", None);
        let post = store.insert_post(owner, "Road bike", Some("+15550100"), Some("+15550100"));

        let announced = feed.announce(owner, post).await.unwrap();
        assert_eq!(announced.contact_phone, None);
        assert_eq!(announced.whatsapp, None);

        let broadcast = broker.events_for(RoomKey::Everyone);
        assert!(matches!(
            broadcast.as_slice(),
            [S2CEvent::NewPost(p)] if p.post_id == post && p.contact_phone.is_none()
        ));
    }

    #[tokio::test]
    async fn only_owner_may_announce() {
        let store = Arc::new(MemoryStore::new());
        let broker = Arc::new(RecordingBroker::default());
        let feed = RealFeedService::new(store.clone(), broker.clone());

        let owner = store.insert_user("Olive", None);
        let other = store.insert_user("Bruno", None);
        let post = store.insert_post(owner, "Oak desk", None, None);

        assert!(matches!(feed.announce(other, post).await, Err(FeedError::NotOwner)));
        assert!(matches!(
            feed.announce(owner, PostId::new_v4()).await,
            Err(FeedError::PostNotFound)
        ));
        assert!(broker.events_for(RoomKey::Everyone).is_empty());
    }
}
