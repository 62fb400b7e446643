use crate::blog::model::Blog;
use crate::comment::model::{Comment, SubtreeRemoval};
use crate::comment::store::{CommentStore, validate_text};
use crate::notification::service::NotificationService;
use crate::utils::error::CustomError;
use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};

pub struct CommentService {
    comments: Collection<Comment>,
    blogs: Collection<Blog>,
    notifications: NotificationService,
}

impl CommentService {
    pub fn new(client: &Client, notifications: NotificationService) -> Self {
        let db = client.database("rust_blogdb");
        CommentService {
            comments: db.collection::<Comment>("comments"),
            blogs: db.collection::<Blog>("blogs"),
            notifications,
        }
    }

    async fn insert(&self, comment: &Comment) -> Result<ObjectId, CustomError> {
        let result = self.comments.insert_one(comment).await.map_err(|e| {
            CustomError::TransientError(format!("Failed to create comment: {}", e))
        })?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            CustomError::InternalServerError("Failed to get inserted comment ID".to_string())
        })
    }

    /// Apply a delta to the blog's activity counters.
    async fn bump_activity(
        &self,
        blog_id: ObjectId,
        total: i64,
        parents: i64,
    ) -> Result<(), CustomError> {
        self.blogs
            .update_one(
                doc! { "_id": blog_id },
                doc! { "$inc": {
                    "activity.total_comments": total,
                    "activity.total_parent_comments": parents,
                }},
            )
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to update blog activity: {}", e))
            })?;

        Ok(())
    }

    /// Collect the id of every descendant of `node`, level by level, so the
    /// whole subtree can be deleted with a single destructive statement.
    async fn collect_descendants(&self, node: &Comment) -> Result<Vec<ObjectId>, CustomError> {
        let mut collected = Vec::new();
        let mut frontier = node.children.clone();

        while !frontier.is_empty() {
            collected.extend(frontier.iter().copied());

            let cursor = self
                .comments
                .find(doc! { "parent": { "$in": frontier.clone() } })
                .await
                .map_err(|e| {
                    CustomError::TransientError(format!("Failed to walk comment tree: {}", e))
                })?;

            let level: Vec<Comment> = cursor.try_collect().await.map_err(|e| {
                CustomError::TransientError(format!("Failed to walk comment tree: {}", e))
            })?;

            frontier = level
                .into_iter()
                .flat_map(|child| child.children)
                .collect();
        }

        Ok(collected)
    }
}

#[async_trait]
impl CommentStore for CommentService {
    async fn create_root(
        &self,
        blog_id: ObjectId,
        blog_author: ObjectId,
        author: ObjectId,
        text: &str,
    ) -> Result<Comment, CustomError> {
        let text = validate_text(text)?;

        let mut comment = Comment {
            id: None,
            blog_id,
            blog_author,
            commented_by: author,
            comment: text.to_string(),
            children: Vec::new(),
            parent: None,
            is_reply: false,
            commented_at: Utc::now(),
        };

        let id = self.insert(&comment).await?;
        comment.id = Some(id);

        self.bump_activity(blog_id, 1, 1).await?;

        self.notifications
            .notify_comment(blog_id, blog_author, author, id)
            .await?;

        Ok(comment)
    }

    async fn create_reply(
        &self,
        parent_id: ObjectId,
        author: ObjectId,
        text: &str,
    ) -> Result<Comment, CustomError> {
        let text = validate_text(text)?;

        let parent = self
            .get(parent_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Parent comment not found".to_string()))?;

        let mut comment = Comment {
            id: None,
            blog_id: parent.blog_id,
            blog_author: parent.blog_author,
            commented_by: author,
            comment: text.to_string(),
            children: Vec::new(),
            parent: Some(parent_id),
            is_reply: true,
            commented_at: Utc::now(),
        };

        let id = self.insert(&comment).await?;
        comment.id = Some(id);

        // Conditional push: if the parent was deleted between the lookup and
        // here, nothing matches, and the freshly inserted reply is rolled
        // back instead of being left dangling.
        let linked = self
            .comments
            .update_one(
                doc! { "_id": parent_id },
                doc! { "$push": { "children": id } },
            )
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to link reply to parent: {}", e))
            })?;

        if linked.matched_count == 0 {
            self.comments
                .delete_one(doc! { "_id": id })
                .await
                .map_err(|e| {
                    CustomError::TransientError(format!("Failed to roll back reply: {}", e))
                })?;
            return Err(CustomError::NotFoundError(
                "Parent comment not found".to_string(),
            ));
        }

        self.bump_activity(parent.blog_id, 1, 0).await?;

        self.notifications
            .notify_reply(parent.blog_id, parent.commented_by, author, id, parent_id)
            .await?;

        Ok(comment)
    }

    async fn fetch_root_page(
        &self,
        blog_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Comment>, CustomError> {
        let cursor = self
            .comments
            .find(doc! { "blog_id": blog_id, "is_reply": false })
            .sort(doc! { "commented_at": -1, "_id": -1 })
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to fetch comments: {}", e))
            })?;

        cursor.try_collect().await.map_err(|e| {
            CustomError::TransientError(format!("Failed to collect comments: {}", e))
        })
    }

    async fn fetch_children_page(
        &self,
        parent_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Comment>, CustomError> {
        let cursor = self
            .comments
            .find(doc! { "parent": parent_id })
            .sort(doc! { "commented_at": -1, "_id": -1 })
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to fetch replies: {}", e))
            })?;

        cursor.try_collect().await.map_err(|e| {
            CustomError::TransientError(format!("Failed to collect replies: {}", e))
        })
    }

    async fn delete_subtree(&self, node_id: ObjectId) -> Result<SubtreeRemoval, CustomError> {
        let node = self
            .get(node_id)
            .await?
            .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

        let mut ids = self.collect_descendants(&node).await?;
        ids.push(node_id);

        // Unlink from the parent first so survivors never reference a
        // deleted child.
        if let Some(parent_id) = node.parent {
            self.comments
                .update_one(
                    doc! { "_id": parent_id },
                    doc! { "$pull": { "children": node_id } },
                )
                .await
                .map_err(|e| {
                    CustomError::TransientError(format!(
                        "Failed to unlink comment from parent: {}",
                        e
                    ))
                })?;
        }

        self.notifications.delete_for_comments(&ids).await?;

        self.comments
            .delete_many(doc! { "_id": { "$in": ids.clone() } })
            .await
            .map_err(|e| {
                CustomError::TransientError(format!("Failed to delete comments: {}", e))
            })?;

        let removal = SubtreeRemoval {
            removed_count: ids.len() as i64,
            removed_parent_count: if node.is_reply { 0 } else { 1 },
        };

        self.bump_activity(
            node.blog_id,
            -removal.removed_count,
            -removal.removed_parent_count,
        )
        .await?;

        Ok(removal)
    }

    async fn get(&self, node_id: ObjectId) -> Result<Option<Comment>, CustomError> {
        self.comments
            .find_one(doc! { "_id": node_id })
            .await
            .map_err(|e| CustomError::TransientError(format!("Failed to fetch comment: {}", e)))
    }
}
