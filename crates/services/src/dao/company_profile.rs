use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use coach_db::models::CompanyProfile;
use mongodb::Database;
use tracing::warn;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::ai::pipeline::CompanyStore;

/// Placeholder handling guidance until someone curates the pattern.
const NEW_PATTERN_NOTE: &str = "Newly observed pattern";

pub struct CompanyProfileDao {
    base: BaseDao<CompanyProfile>,
}

impl CompanyProfileDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, CompanyProfile::COLLECTION),
        }
    }

    pub async fn find_by_user(&self, user_id: ObjectId) -> DaoResult<Option<CompanyProfile>> {
        self.base.find_one(doc! { "user_id": user_id }).await
    }
}

#[async_trait]
impl CompanyStore for CompanyProfileDao {
    async fn find(&self, user_id: ObjectId) -> Result<Option<CompanyProfile>, DaoError> {
        self.find_by_user(user_id).await
    }

    /// Add-only: a pattern already in the map keeps its curated handling
    /// note. Sessions for accounts without a company profile register
    /// nothing.
    async fn register_patterns(
        &self,
        user_id: ObjectId,
        patterns: &[String],
    ) -> Result<(), DaoError> {
        let Some(existing) = self.find_by_user(user_id).await? else {
            return Ok(());
        };

        let mut set = doc! {};
        for pattern in patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() || existing.known_objection_patterns.contains_key(pattern) {
                continue;
            }
            // Dots and dollar signs are not valid in field paths.
            if pattern.contains('.') || pattern.starts_with('$') {
                warn!(pattern, "Skipping objection pattern with unsafe key");
                continue;
            }
            set.insert(
                format!("known_objection_patterns.{pattern}"),
                NEW_PATTERN_NOTE,
            );
        }
        if set.is_empty() {
            return Ok(());
        }

        self.base
            .update_one(doc! { "user_id": user_id }, doc! { "$set": set })
            .await?;
        Ok(())
    }
}
