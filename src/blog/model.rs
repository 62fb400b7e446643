use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// The slice of a blog document the comment engine reads and updates.
/// Full blog CRUD lives elsewhere; only the activity counters are touched here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Blog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub author: ObjectId,
    #[serde(default)]
    pub activity: BlogActivity,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BlogActivity {
    #[serde(default)]
    pub total_comments: i64,
    #[serde(default)]
    pub total_parent_comments: i64,
}
