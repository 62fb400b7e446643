use crate::comment::model::{Comment, SubtreeRemoval};
use crate::utils::error::CustomError;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

/// Upper bound on comment body length, matching the composer limit.
pub const MAX_COMMENT_LEN: usize = 4096;

/// Validate and trim a comment body before it is persisted.
pub fn validate_text(text: &str) -> Result<&str, CustomError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(CustomError::ValidationError(
            "Comment content cannot be empty".to_string(),
        ));
    }

    if trimmed.len() > MAX_COMMENT_LEN {
        return Err(CustomError::ValidationError(format!(
            "Comment content exceeds {} characters",
            MAX_COMMENT_LEN
        )));
    }

    Ok(trimmed)
}

/// Persistence surface for the comment tree. Implemented by the MongoDB
/// `CommentService` in production and by an in-memory store in tests.
#[async_trait]
pub trait CommentStore {
    /// Create a depth-0 comment on a blog. Increments both blog counters.
    async fn create_root(
        &self,
        blog_id: ObjectId,
        blog_author: ObjectId,
        author: ObjectId,
        text: &str,
    ) -> Result<Comment, CustomError>;

    /// Create a reply under an existing comment, appending the new id to the
    /// parent's `children`. Fails with `NotFoundError` if the parent is gone
    /// (including a concurrent delete); an orphan reply is never left behind.
    /// Increments `total_comments` only.
    async fn create_reply(
        &self,
        parent_id: ObjectId,
        author: ObjectId,
        text: &str,
    ) -> Result<Comment, CustomError>;

    /// Page of root comments for a blog, newest first.
    async fn fetch_root_page(
        &self,
        blog_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Comment>, CustomError>;

    /// Page of direct children of a comment (one level), newest first.
    async fn fetch_children_page(
        &self,
        parent_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Comment>, CustomError>;

    /// Delete a comment and every descendant, unlink it from its parent,
    /// drop related notifications, and return the counts the caller applies
    /// to the blog aggregate exactly once.
    async fn delete_subtree(&self, node_id: ObjectId) -> Result<SubtreeRemoval, CustomError>;

    /// Fetch a single comment, `None` if it does not exist.
    async fn get(&self, node_id: ObjectId) -> Result<Option<Comment>, CustomError>;
}
