use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Comment,
    Reply,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub blog: ObjectId,
    /// Recipient: the blog author for comments, the parent comment's author for replies.
    pub notification_for: ObjectId,
    /// The actor who commented or replied.
    pub user: ObjectId,
    pub comment: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_on_comment: Option<ObjectId>,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}
