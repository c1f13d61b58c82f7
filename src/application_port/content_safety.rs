#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub safe: bool,
    pub reason: Option<String>,
}

impl SafetyVerdict {
    pub fn safe() -> Self {
        Self {
            safe: true,
            reason: None,
        }
    }

    pub fn unsafe_because(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: Some(reason.into()),
        }
    }
}

/// Moderation check applied to user-authored text before it is stored.
#[async_trait::async_trait]
pub trait ContentSafety: Send + Sync {
    async fn check_safety(&self, text: &str) -> anyhow::Result<SafetyVerdict>;
}
