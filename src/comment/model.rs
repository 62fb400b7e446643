use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A single node of the per-blog comment tree, persisted as an adjacency
/// list: `parent` points up, `children` holds the ordered direct-child ids.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub blog_id: ObjectId,
    pub blog_author: ObjectId,
    pub commented_by: ObjectId,
    pub comment: String,
    #[serde(default)]
    pub children: Vec<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    pub is_reply: bool,
    pub commented_at: DateTime<Utc>,
}

/// Counts returned by a cascading delete, applied once to the blog aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubtreeRemoval {
    /// The deleted node plus every descendant.
    pub removed_count: i64,
    /// 1 if the deleted node itself was a root comment, else 0. Descendants
    /// removed alongside it were replies and never count here.
    pub removed_parent_count: i64,
}

#[derive(Deserialize)]
pub struct AddCommentRequest {
    pub blog_id: String,
    pub blog_author: String,
    pub comment: String,
    pub replying_to: Option<String>,
}

#[derive(Deserialize)]
pub struct GetBlogCommentsRequest {
    pub blog_id: String,
    #[serde(default)]
    pub skip: u64,
}

#[derive(Deserialize)]
pub struct GetRepliesRequest {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub skip: u64,
}

#[derive(Deserialize)]
pub struct DeleteCommentRequest {
    #[serde(rename = "_id")]
    pub id: String,
}
