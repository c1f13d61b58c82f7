use super::MemoryStore;
use crate::domain_model::{PostSummary, UserSummary};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Profiles and listings owned by other services, loaded into the memory
/// backend at startup.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default)]
    pub posts: Vec<PostSummary>,
}

impl Seed {
    pub fn from_json(raw: &str) -> anyhow::Result<Seed> {
        serde_json::from_str(raw).context("malformed seed document")
    }

    pub async fn load(path: &Path) -> anyhow::Result<Seed> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read seed file {}", path.display()))?;
        Self::from_json(&raw)
    }
}

impl MemoryStore {
    pub fn apply_seed(&self, seed: Seed) {
        let (users, posts) = (seed.users.len(), seed.posts.len());
        for user in seed.users {
            self.put_user(user);
        }
        for post in seed.posts {
            self.put_post(post);
        }
        tracing::info!(users, posts, "memory store seeded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{PostId, UserId};
    use crate::domain_port::{PostRepo, UserRepo};

    #[tokio::test]
    async fn seed_populates_users_and_posts() {
        let raw = r#"{
            "users": [
                {"_id": "7f1b3c8e-3b7a-4d1e-9a59-1d1f5b2e8c01", "displayName": "Olive", "avatarUri": null}
            ],
            "posts": [
                {
                    "_id": "0b7c2f44-52a3-4f9e-8f0e-7a1c9e0d2b11",
                    "owner": "7f1b3c8e-3b7a-4d1e-9a59-1d1f5b2e8c01",
                    "title": "Road bike",
                    "contactPhone": "+100",
                    "whatsapp": null
                }
            ]
        }"#;
        let store = MemoryStore::new();
        store.apply_seed(Seed::from_json(raw).unwrap());

        let user: UserId = "7f1b3c8e-3b7a-4d1e-9a59-1d1f5b2e8c01".parse().unwrap();
        let post: PostId = "0b7c2f44-52a3-4f9e-8f0e-7a1c9e0d2b11".parse().unwrap();
        assert_eq!(
            UserRepo::get_summary(&store, user).await.unwrap().unwrap().display_name,
            "Olive"
        );
        assert_eq!(
            PostRepo::get_summary(&store, post).await.unwrap().unwrap().owner,
            user
        );
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(Seed::from_json("{\"users\": 3}").is_err());
    }
}
