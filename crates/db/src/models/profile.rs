use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// The account's accumulating consultation DNA. Strengths and weaknesses
/// grow by set union with each analyzed session; personality is the latest
/// assessment and is overwritten wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Profile {
    pub const COLLECTION: &'static str = "profiles";
}
