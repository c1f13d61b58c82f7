use crate::application_port::*;

/// Local profanity filter: rejects text containing any listed word as a
/// whole token, case-insensitively.
pub struct WordListContentSafety {
    blocked_words: Vec<String>,
}

impl WordListContentSafety {
    pub fn new<I, S>(blocked_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blocked_words = blocked_words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { blocked_words }
    }
}

#[async_trait::async_trait]
impl ContentSafety for WordListContentSafety {
    async fn check_safety(&self, text: &str) -> anyhow::Result<SafetyVerdict> {
        let lowered = text.to_lowercase();
        let hit = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .find(|token| self.blocked_words.iter().any(|w| w == token));

        Ok(match hit {
            Some(_) => SafetyVerdict::unsafe_because("message contains inappropriate language"),
            None => SafetyVerdict::safe(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flags_listed_words_as_whole_tokens() {
        let checker = WordListContentSafety::new(["darn", " Heck "]);
        assert!(!checker.check_safety("well DARN it").await.unwrap().safe);
        assert!(!checker.check_safety("what the heck!").await.unwrap().safe);
        assert!(checker.check_safety("darnell is selling a bike").await.unwrap().safe);
        assert!(checker.check_safety("").await.unwrap().safe);
    }
}
