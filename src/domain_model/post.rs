use crate::domain_model::{PostId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    #[serde(rename = "_id")]
    pub post_id: PostId,
    pub owner: UserId,
    pub title: String,
    pub contact_phone: Option<String>,
    pub whatsapp: Option<String>,
}

impl PostSummary {
    /// Drops the owner's direct contact details.
    pub fn without_contact_details(mut self) -> Self {
        self.contact_phone = None;
        self.whatsapp = None;
        self
    }
}
