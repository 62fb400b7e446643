use crate::comment::model::SubtreeRemoval;
use crate::comment::store::CommentStore;
use crate::comment::thread::{ThreadEntry, ThreadView};
use crate::utils::error::CustomError;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

/// Page sizes for root comments and replies.
pub const ROOT_PAGE_SIZE: i64 = 5;
pub const REPLY_PAGE_SIZE: i64 = 5;

/// The per-blog comment aggregate, mirroring the persisted blog counters.
/// Deltas are applied exactly once per logical operation; a cascading delete
/// reports its full descendant count through `SubtreeRemoval`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentActivity {
    pub total_comments: i64,
    pub total_parent_comments: i64,
}

impl CommentActivity {
    pub fn record_create(&mut self, is_reply: bool) {
        self.total_comments += 1;
        if !is_reply {
            self.total_parent_comments += 1;
        }
    }

    pub fn record_delete(&mut self, removal: &SubtreeRemoval) {
        self.total_comments -= removal.removed_count;
        self.total_parent_comments -= removal.removed_parent_count;
    }
}

/// One open comment thread: the materialized view of a blog's comment tree
/// plus its aggregate counters, driving the store for every mutation.
///
/// Every operation is confirm-then-mutate: the store call completes first
/// and the view is only touched on success, so any failure leaves the
/// sequence exactly as it was.
pub struct ThreadSession<S> {
    store: S,
    blog_id: ObjectId,
    blog_author: ObjectId,
    view: ThreadView,
    activity: CommentActivity,
    roots_loaded: usize,
}

impl<S: CommentStore> ThreadSession<S> {
    pub fn new(
        store: S,
        blog_id: ObjectId,
        blog_author: ObjectId,
        activity: CommentActivity,
    ) -> Self {
        ThreadSession {
            store,
            blog_id,
            blog_author,
            view: ThreadView::new(),
            activity,
            roots_loaded: 0,
        }
    }

    pub fn view(&self) -> &ThreadView {
        &self.view
    }

    pub fn activity(&self) -> CommentActivity {
        self.activity
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn entry(&self, index: usize) -> Result<&ThreadEntry, CustomError> {
        self.view
            .get(index)
            .ok_or_else(|| CustomError::BadRequestError("No comment at this position".to_string()))
    }

    fn entry_id(&self, index: usize) -> Result<ObjectId, CustomError> {
        self.entry(index)?.comment.id.ok_or_else(|| {
            CustomError::InternalServerError("Materialized comment has no ID".to_string())
        })
    }

    /// Fetch the next page of root comments, skipping however many are
    /// already materialized, and append it to the view.
    pub async fn load_more_roots(&mut self) -> Result<usize, CustomError> {
        let page = self
            .store
            .fetch_root_page(self.blog_id, self.roots_loaded as u64, ROOT_PAGE_SIZE)
            .await?;

        let fetched = page.len();
        self.view.append_roots(page);
        self.roots_loaded += fetched;
        Ok(fetched)
    }

    /// Post a root comment; it renders first. Counted as loaded so the next
    /// root page does not fetch it again.
    pub async fn post_comment(&mut self, author: ObjectId, text: &str) -> Result<(), CustomError> {
        let comment = self
            .store
            .create_root(self.blog_id, self.blog_author, author, text)
            .await?;

        self.view.insert_root(comment);
        self.roots_loaded += 1;
        self.activity.record_create(false);
        Ok(())
    }

    /// Post a reply under the comment at `parent_index`.
    pub async fn post_reply(
        &mut self,
        parent_index: usize,
        author: ObjectId,
        text: &str,
    ) -> Result<(), CustomError> {
        let parent_id = self.entry_id(parent_index)?;

        let comment = self.store.create_reply(parent_id, author, text).await?;

        self.view.insert_reply(parent_index, comment);
        self.activity.record_create(true);
        Ok(())
    }

    /// Whether the comment at `index` has persisted replies that are not yet
    /// materialized. This gates the "load more replies" affordance.
    pub fn has_more_replies(&self, index: usize) -> bool {
        match self.view.get(index) {
            Some(entry) => entry.comment.children.len() > self.view.materialized_children(index),
            None => false,
        }
    }

    /// Merge the next page of replies under `parent_index` into the view.
    /// Returns how many were merged; zero when everything is already loaded.
    pub async fn load_more_replies(&mut self, parent_index: usize) -> Result<usize, CustomError> {
        let parent_id = self.entry_id(parent_index)?;

        // Skip direct children already on screen; insert after the whole
        // materialized subtree so earlier pages (and their expansions) keep
        // their positions.
        let skip = self.view.materialized_children(parent_index);
        if self.entry(parent_index)?.comment.children.len() <= skip {
            return Ok(0);
        }
        let offset = self.view.subtree_len(parent_index);

        let page = self
            .store
            .fetch_children_page(parent_id, skip as u64, REPLY_PAGE_SIZE)
            .await?;

        let fetched = page.len();
        self.view.expand_subtree(parent_index, page, offset);
        Ok(fetched)
    }

    /// Evict the materialized subtree under `index` from the view. The
    /// persisted comments are untouched; expanding again re-fetches them.
    pub fn collapse_replies(&mut self, index: usize) -> Result<usize, CustomError> {
        self.entry(index)?;
        Ok(self.view.collapse_subtree(index))
    }

    /// Delete the comment at `index` and its whole subtree, server side
    /// first. Only the comment's author or the blog's author may delete.
    pub async fn delete_comment(
        &mut self,
        index: usize,
        actor: ObjectId,
    ) -> Result<SubtreeRemoval, CustomError> {
        let entry = self.entry(index)?;
        if actor != entry.comment.commented_by && actor != self.blog_author {
            return Err(CustomError::ForbiddenError(
                "Only the comment author or the blog author can delete this comment".to_string(),
            ));
        }
        let is_root = entry.depth == 0;
        let id = self.entry_id(index)?;

        let removal = self.store.delete_subtree(id).await?;

        self.view.remove_deleted(index);
        if is_root {
            self.roots_loaded = self.roots_loaded.saturating_sub(1);
        }
        self.activity.record_delete(&removal);
        Ok(removal)
    }
}
