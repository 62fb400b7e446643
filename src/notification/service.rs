use crate::notification::model::{Notification, NotificationKind};
use crate::utils::error::CustomError;
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};

#[derive(Clone)]
pub struct NotificationService {
    collection: Collection<Notification>,
}

impl NotificationService {
    pub fn new(client: &Client) -> Self {
        let collection = client
            .database("rust_blogdb")
            .collection::<Notification>("notifications");
        NotificationService { collection }
    }

    /// Notify the blog author that a root comment was left on their blog
    pub async fn notify_comment(
        &self,
        blog_id: ObjectId,
        blog_author: ObjectId,
        user: ObjectId,
        comment_id: ObjectId,
    ) -> Result<(), CustomError> {
        self.insert(Notification {
            id: None,
            kind: NotificationKind::Comment,
            blog: blog_id,
            notification_for: blog_author,
            user,
            comment: comment_id,
            replied_on_comment: None,
            seen: false,
            created_at: Utc::now(),
        })
        .await
    }

    /// Notify the parent comment's author that someone replied to them
    pub async fn notify_reply(
        &self,
        blog_id: ObjectId,
        parent_author: ObjectId,
        user: ObjectId,
        comment_id: ObjectId,
        replied_on: ObjectId,
    ) -> Result<(), CustomError> {
        self.insert(Notification {
            id: None,
            kind: NotificationKind::Reply,
            blog: blog_id,
            notification_for: parent_author,
            user,
            comment: comment_id,
            replied_on_comment: Some(replied_on),
            seen: false,
            created_at: Utc::now(),
        })
        .await
    }

    /// Remove every notification referencing any of the given comment ids.
    /// Called while a subtree cascade is being deleted.
    pub async fn delete_for_comments(&self, ids: &[ObjectId]) -> Result<u64, CustomError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = self
            .collection
            .delete_many(doc! {
                "$or": [
                    { "comment": { "$in": ids.to_vec() } },
                    { "replied_on_comment": { "$in": ids.to_vec() } },
                ]
            })
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to delete notifications: {}", e))
            })?;

        Ok(result.deleted_count)
    }

    async fn insert(&self, notification: Notification) -> Result<(), CustomError> {
        self.collection
            .insert_one(notification)
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to create notification: {}", e))
            })?;

        Ok(())
    }
}
