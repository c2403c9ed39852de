use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use coach_db::models::{Session, SessionStatus};
use mongodb::Database;

use super::base::{BaseDao, DaoError, DaoResult};
use crate::ai::pipeline::{SessionAnalysisUpdate, SessionStore};

pub struct SessionDao {
    base: BaseDao<Session>,
}

impl SessionDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Session::COLLECTION),
        }
    }

    pub async fn create(&self, session: &Session) -> DaoResult<ObjectId> {
        self.base.insert_one(session).await
    }

    pub async fn get(&self, id: ObjectId) -> DaoResult<Session> {
        self.base.find_by_id(id).await
    }

    pub async fn list_for_user(&self, user_id: ObjectId) -> DaoResult<Vec<Session>> {
        self.base
            .find_many(doc! { "user_id": user_id }, Some(doc! { "created_at": -1 }))
            .await
    }
}

#[async_trait]
impl SessionStore for SessionDao {
    async fn load(&self, id: ObjectId) -> Result<Session, DaoError> {
        self.base.find_by_id(id).await
    }

    async fn set_status(&self, id: ObjectId, status: SessionStatus) -> Result<(), DaoError> {
        self.base
            .update_by_id(id, doc! { "$set": { "status": bson::to_bson(&status)? } })
            .await?;
        Ok(())
    }

    async fn save_analysis(
        &self,
        id: ObjectId,
        update: SessionAnalysisUpdate,
    ) -> Result<(), DaoError> {
        let mut set = doc! {
            "status": bson::to_bson(&SessionStatus::Analyzed)?,
            "is_valid": update.is_valid,
            "scores": bson::to_bson(&update.scores)?,
            "timeline": bson::to_bson(&update.timeline)?,
            "speaker_ratio": bson::to_bson(&update.speaker_ratio)?,
            "feedback": bson::to_bson(&update.feedback)?,
            "action_items": bson::to_bson(&update.action_items)?,
            "transcript_with_timestamps": bson::to_bson(&update.transcript_with_timestamps)?,
            "follow_up": bson::to_bson(&update.follow_up)?,
        };
        // Fast-path re-analysis leaves the stored raw transcript and
        // duration untouched.
        if let Some(transcript) = update.transcript {
            set.insert("transcript", transcript);
        }
        if let Some(duration) = update.duration_sec {
            set.insert("duration_sec", duration as i64);
        }
        if let Some(summary) = update.summary {
            set.insert("summary", summary);
        }

        let modified = self.base.update_by_id(id, doc! { "$set": set }).await?;
        if !modified {
            return Err(DaoError::NotFound);
        }
        Ok(())
    }
}
