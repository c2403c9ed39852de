use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use coach_db::models::{Profile, ProfileDelta};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::ai::pipeline::ProfileStore;

pub struct ProfileDao {
    base: BaseDao<Profile>,
}

impl ProfileDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Profile::COLLECTION),
        }
    }

    pub async fn find_by_user(&self, user_id: ObjectId) -> DaoResult<Option<Profile>> {
        self.base.find_one(doc! { "user_id": user_id }).await
    }
}

#[async_trait]
impl ProfileStore for ProfileDao {
    async fn find(&self, user_id: ObjectId) -> Result<Option<Profile>, DaoError> {
        self.find_by_user(user_id).await
    }

    /// Upserting union merge: `$addToSet $each` keeps strengths and
    /// weaknesses duplicate-free without ever removing an entry; the
    /// personality assessment is overwritten only when the delta carries a
    /// non-empty one.
    async fn merge_delta(&self, user_id: ObjectId, delta: &ProfileDelta) -> Result<(), DaoError> {
        let now = bson::DateTime::now();
        let mut set = doc! { "updated_at": now };
        if !delta.personality.is_empty() {
            set.insert("personality", delta.personality.clone());
        }

        let update = doc! {
            "$set": set,
            "$setOnInsert": { "user_id": user_id, "created_at": now },
            "$addToSet": {
                "strengths": { "$each": delta.new_strengths.clone() },
                "weaknesses": { "$each": delta.new_weaknesses.clone() },
            },
        };

        self.base
            .collection()
            .update_one(doc! { "user_id": user_id }, update)
            .upsert(true)
            .await?;
        Ok(())
    }
}
