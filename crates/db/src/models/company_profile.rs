use std::collections::BTreeMap;

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Objection pattern -> suggested handling. Add-only: analysis may
    /// register new patterns but never removes or rewrites existing ones.
    #[serde(default)]
    pub known_objection_patterns: BTreeMap<String, String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl CompanyProfile {
    pub const COLLECTION: &'static str = "company_profiles";
}
