//! In-memory `CommentStore` used by the session and thread tests, with the
//! same ordering and cascade semantics as the MongoDB service plus a
//! fail-next switch for exercising the confirm-then-mutate contract.

use crate::comment::model::{Comment, SubtreeRemoval};
use crate::comment::store::{CommentStore, validate_text};
use crate::utils::error::CustomError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    comments: HashMap<ObjectId, Comment>,
    activity: HashMap<ObjectId, (i64, i64)>,
    seq: i64,
    fail_next: bool,
}

#[derive(Default)]
pub struct MemoryCommentStore {
    inner: Mutex<Inner>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with a `TransientError`.
    pub fn fail_next_call(&self) {
        self.inner.lock().unwrap().fail_next = true;
    }

    pub fn live_count(&self, blog_id: ObjectId) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id)
            .count() as i64
    }

    pub fn live_parent_count(&self, blog_id: ObjectId) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id && !c.is_reply)
            .count() as i64
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.lock().unwrap().comments.contains_key(&id)
    }

    /// Persisted blog counters as maintained by create/delete.
    pub fn recorded_activity(&self, blog_id: ObjectId) -> (i64, i64) {
        self.inner
            .lock()
            .unwrap()
            .activity
            .get(&blog_id)
            .copied()
            .unwrap_or((0, 0))
    }
}

impl Inner {
    fn take_failure(&mut self) -> Result<(), CustomError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(CustomError::TransientError(
                "injected store failure".to_string(),
            ));
        }
        Ok(())
    }

    fn insert(&mut self, mut comment: Comment) -> Comment {
        let id = ObjectId::new();
        // Strictly increasing timestamps so newest-first paging is total.
        self.seq += 1;
        comment.id = Some(id);
        comment.commented_at = Utc::now() + Duration::milliseconds(self.seq);
        self.comments.insert(id, comment.clone());
        comment
    }

    fn bump(&mut self, blog_id: ObjectId, total: i64, parents: i64) {
        let entry = self.activity.entry(blog_id).or_insert((0, 0));
        entry.0 += total;
        entry.1 += parents;
    }

    fn page(&self, mut matches: Vec<Comment>, skip: u64, limit: i64) -> Vec<Comment> {
        matches.sort_by(|a, b| (b.commented_at, b.id).cmp(&(a.commented_at, a.id)));
        matches
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect()
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn create_root(
        &self,
        blog_id: ObjectId,
        blog_author: ObjectId,
        author: ObjectId,
        text: &str,
    ) -> Result<Comment, CustomError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let text = validate_text(text)?;

        let comment = inner.insert(Comment {
            id: None,
            blog_id,
            blog_author,
            commented_by: author,
            comment: text.to_string(),
            children: Vec::new(),
            parent: None,
            is_reply: false,
            commented_at: Utc::now(),
        });

        inner.bump(blog_id, 1, 1);
        Ok(comment)
    }

    async fn create_reply(
        &self,
        parent_id: ObjectId,
        author: ObjectId,
        text: &str,
    ) -> Result<Comment, CustomError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        let text = validate_text(text)?;

        let parent = inner
            .comments
            .get(&parent_id)
            .cloned()
            .ok_or_else(|| CustomError::NotFoundError("Parent comment not found".to_string()))?;

        let comment = inner.insert(Comment {
            id: None,
            blog_id: parent.blog_id,
            blog_author: parent.blog_author,
            commented_by: author,
            comment: text.to_string(),
            children: Vec::new(),
            parent: Some(parent_id),
            is_reply: true,
            commented_at: Utc::now(),
        });

        inner
            .comments
            .get_mut(&parent_id)
            .expect("parent checked above")
            .children
            .push(comment.id.unwrap());

        inner.bump(parent.blog_id, 1, 0);
        Ok(comment)
    }

    async fn fetch_root_page(
        &self,
        blog_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Comment>, CustomError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let matches = inner
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id && !c.is_reply)
            .cloned()
            .collect();
        Ok(inner.page(matches, skip, limit))
    }

    async fn fetch_children_page(
        &self,
        parent_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Comment>, CustomError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let matches = inner
            .comments
            .values()
            .filter(|c| c.parent == Some(parent_id))
            .cloned()
            .collect();
        Ok(inner.page(matches, skip, limit))
    }

    async fn delete_subtree(&self, node_id: ObjectId) -> Result<SubtreeRemoval, CustomError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let node = inner
            .comments
            .get(&node_id)
            .cloned()
            .ok_or_else(|| CustomError::NotFoundError("Comment not found".to_string()))?;

        // Worklist over child ids, no recursion.
        let mut ids = vec![node_id];
        let mut frontier = node.children.clone();
        while let Some(id) = frontier.pop() {
            ids.push(id);
            if let Some(child) = inner.comments.get(&id) {
                frontier.extend(child.children.iter().copied());
            }
        }

        if let Some(parent_id) = node.parent {
            if let Some(parent) = inner.comments.get_mut(&parent_id) {
                parent.children.retain(|child| *child != node_id);
            }
        }

        for id in &ids {
            inner.comments.remove(id);
        }

        let removal = SubtreeRemoval {
            removed_count: ids.len() as i64,
            removed_parent_count: if node.is_reply { 0 } else { 1 },
        };
        inner.bump(
            node.blog_id,
            -removal.removed_count,
            -removal.removed_parent_count,
        );

        Ok(removal)
    }

    async fn get(&self, node_id: ObjectId) -> Result<Option<Comment>, CustomError> {
        Ok(self.inner.lock().unwrap().comments.get(&node_id).cloned())
    }
}
