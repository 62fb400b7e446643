use crate::comment::model::Comment;

/// One materialized comment in the flattened thread. `depth` is computed when
/// the comment is merged into the view (root = 0, reply = parent + 1) and
/// drives both indentation and the subtree boundary scans below.
#[derive(Debug, Clone)]
pub struct ThreadEntry {
    pub comment: Comment,
    pub depth: usize,
    pub replies_expanded: bool,
}

/// The flattened, order-preserving view of however much of a blog's comment
/// tree is currently loaded. Entries are kept in pre-order: a comment is
/// followed by all of its materialized descendants before any later sibling.
///
/// The view never holds a real tree; every structural operation is an index
/// scan over depths. The central boundary rule: the subtree of the entry at
/// `i` is exactly the run of entries after `i` whose depth is strictly
/// greater than `entries[i].depth`.
#[derive(Debug, Default)]
pub struct ThreadView {
    entries: Vec<ThreadEntry>,
}

/// Map a page of root comments into depth-0 entries, preserving order.
pub fn flatten_roots(nodes: Vec<Comment>) -> Vec<ThreadEntry> {
    nodes
        .into_iter()
        .map(|comment| ThreadEntry {
            comment,
            depth: 0,
            replies_expanded: false,
        })
        .collect()
}

impl ThreadView {
    pub fn new() -> Self {
        ThreadView {
            entries: Vec::new(),
        }
    }

    pub fn from_roots(nodes: Vec<Comment>) -> Self {
        ThreadView {
            entries: flatten_roots(nodes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ThreadEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ThreadEntry> {
        self.entries.get(index)
    }

    /// Append a further page of root comments at the end of the view.
    pub fn append_roots(&mut self, nodes: Vec<Comment>) {
        self.entries.extend(flatten_roots(nodes));
    }

    /// A freshly posted root comment renders first.
    pub fn insert_root(&mut self, comment: Comment) {
        self.entries.insert(
            0,
            ThreadEntry {
                comment,
                depth: 0,
                replies_expanded: false,
            },
        );
    }

    /// A freshly posted reply becomes its parent's first rendered child, so
    /// it always lands immediately after the parent regardless of how many
    /// of the parent's other replies are materialized.
    pub fn insert_reply(&mut self, parent_index: usize, comment: Comment) {
        let depth = self.entries[parent_index].depth + 1;

        if let Some(id) = comment.id {
            self.entries[parent_index].comment.children.push(id);
        }
        self.entries[parent_index].replies_expanded = true;

        self.entries.insert(
            parent_index + 1,
            ThreadEntry {
                comment,
                depth,
                replies_expanded: false,
            },
        );
    }

    /// Merge a fetched page of children into the view, one level below the
    /// parent. `insertion_offset` is the number of entries already
    /// materialized inside the parent's subtree, so a later page lands after
    /// the replies (and their expanded descendants) merged by earlier pages.
    pub fn expand_subtree(
        &mut self,
        parent_index: usize,
        page: Vec<Comment>,
        insertion_offset: usize,
    ) {
        let depth = self.entries[parent_index].depth + 1;
        let at = parent_index + 1 + insertion_offset;

        for (i, comment) in page.into_iter().enumerate() {
            self.entries.insert(
                at + i,
                ThreadEntry {
                    comment,
                    depth,
                    replies_expanded: false,
                },
            );
        }

        self.entries[parent_index].replies_expanded = true;
    }

    /// Evict the parent's materialized subtree from the view. The underlying
    /// comments stay persisted; collapsing is a view-only operation. Returns
    /// the number of entries removed.
    pub fn collapse_subtree(&mut self, parent_index: usize) -> usize {
        let removed = self.evict_descendants(parent_index);
        self.entries[parent_index].replies_expanded = false;
        removed
    }

    /// Index of the nearest preceding entry with strictly smaller depth, or
    /// `None` if the entry is a root. Strictly-less-than is what skips over
    /// the entry's own siblings at the same depth.
    pub fn find_parent_index(&self, index: usize) -> Option<usize> {
        let depth = self.entries[index].depth;
        self.entries[..index]
            .iter()
            .rposition(|entry| entry.depth < depth)
    }

    /// Remove an entry the store has confirmed deleted: its materialized
    /// descendants go with it, and the parent's in-memory `children` copy is
    /// unlinked. Returns the total number of entries removed.
    pub fn remove_deleted(&mut self, index: usize) -> usize {
        let removed = self.evict_descendants(index);

        let id = self.entries[index].comment.id;
        if let Some(parent_index) = self.find_parent_index(index) {
            let parent = &mut self.entries[parent_index];
            if let Some(id) = id {
                parent.comment.children.retain(|child| *child != id);
            }
            if parent.comment.children.is_empty() {
                // Nothing left to expand.
                parent.replies_expanded = false;
            }
        }

        self.entries.remove(index);
        removed + 1
    }

    /// Number of materialized entries inside the subtree rooted at `index`
    /// (the entry itself excluded).
    pub fn subtree_len(&self, index: usize) -> usize {
        self.subtree_end(index) - (index + 1)
    }

    /// Number of direct children of `index` currently materialized. This is
    /// the `skip` for the next reply page.
    pub fn materialized_children(&self, index: usize) -> usize {
        let child_depth = self.entries[index].depth + 1;
        self.entries[index + 1..self.subtree_end(index)]
            .iter()
            .filter(|entry| entry.depth == child_depth)
            .count()
    }

    /// First position after `index` that is not a strict descendant: the
    /// scan stops at the first entry whose depth drops back to the parent's
    /// level or below, or at the end of the view. Never crosses a sibling.
    fn subtree_end(&self, index: usize) -> usize {
        let depth = self.entries[index].depth;
        let mut end = index + 1;
        while end < self.entries.len() && self.entries[end].depth > depth {
            end += 1;
        }
        end
    }

    fn evict_descendants(&mut self, index: usize) -> usize {
        let end = self.subtree_end(index);
        let removed = end - (index + 1);
        self.entries.drain(index + 1..end);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mongodb::bson::oid::ObjectId;

    fn node(text: &str, parent: Option<&Comment>) -> Comment {
        Comment {
            id: Some(ObjectId::new()),
            blog_id: ObjectId::new(),
            blog_author: ObjectId::new(),
            commented_by: ObjectId::new(),
            comment: text.to_string(),
            children: Vec::new(),
            parent: parent.map(|p| p.id.unwrap()),
            is_reply: parent.is_some(),
            commented_at: Utc::now(),
        }
    }

    fn texts(view: &ThreadView) -> Vec<(&str, usize)> {
        view.entries()
            .iter()
            .map(|entry| (entry.comment.comment.as_str(), entry.depth))
            .collect()
    }

    fn assert_depth_invariant(view: &ThreadView) {
        for pair in view.entries().windows(2) {
            assert!(
                pair[1].depth <= pair[0].depth + 1,
                "depth jumped from {} to {}",
                pair[0].depth,
                pair[1].depth
            );
        }
    }

    /// A,B roots; A1, A2 replies to A; A1.1 reply to A1.
    fn sample_view() -> ThreadView {
        let a = node("A", None);
        let b = node("B", None);
        let a1 = node("A1", Some(&a));
        let a2 = node("A2", Some(&a));
        let a11 = node("A1.1", Some(&a1));

        let mut view = ThreadView::from_roots(vec![a, b]);
        view.expand_subtree(0, vec![a1, a2], 0);
        view.expand_subtree(1, vec![a11], 0);
        view
    }

    #[test]
    fn flatten_roots_preserves_order_at_depth_zero() {
        let view = ThreadView::from_roots(vec![node("A", None), node("B", None)]);
        assert_eq!(texts(&view), vec![("A", 0), ("B", 0)]);
        assert!(!view.get(0).unwrap().replies_expanded);
    }

    #[test]
    fn insert_root_prepends() {
        let mut view = ThreadView::from_roots(vec![node("A", None)]);
        view.insert_root(node("B", None));
        assert_eq!(texts(&view), vec![("B", 0), ("A", 0)]);
    }

    #[test]
    fn insert_reply_lands_immediately_after_parent() {
        let mut view = sample_view();
        let a = view.get(0).unwrap().comment.clone();
        let a3 = node("A3", Some(&a));
        let a3_id = a3.id.unwrap();

        view.insert_reply(0, a3);

        assert_eq!(
            texts(&view),
            vec![
                ("A", 0),
                ("A3", 1),
                ("A1", 1),
                ("A1.1", 2),
                ("A2", 1),
                ("B", 0),
            ]
        );
        let parent = view.get(0).unwrap();
        assert!(parent.replies_expanded);
        assert!(parent.comment.children.contains(&a3_id));
        assert_depth_invariant(&view);
    }

    #[test]
    fn expand_nested_subtree_indents_one_level() {
        let view = sample_view();
        assert_eq!(
            texts(&view),
            vec![("A", 0), ("A1", 1), ("A1.1", 2), ("A2", 1), ("B", 0)]
        );
        assert_depth_invariant(&view);
    }

    #[test]
    fn expand_second_page_appends_after_loaded_replies() {
        let mut view = sample_view();
        let a = view.get(0).unwrap().comment.clone();
        let a3 = node("A3", Some(&a));

        // A's subtree currently holds A1, A1.1, A2 = 3 entries.
        view.expand_subtree(0, vec![a3], view.subtree_len(0));

        assert_eq!(
            texts(&view),
            vec![
                ("A", 0),
                ("A1", 1),
                ("A1.1", 2),
                ("A2", 1),
                ("A3", 1),
                ("B", 0),
            ]
        );
        assert_depth_invariant(&view);
    }

    #[test]
    fn collapse_removes_strict_descendants_only() {
        let mut view = sample_view();
        let removed = view.collapse_subtree(0);

        assert_eq!(removed, 3);
        assert_eq!(texts(&view), vec![("A", 0), ("B", 0)]);
        assert!(!view.get(0).unwrap().replies_expanded);
    }

    #[test]
    fn collapse_inner_subtree_spares_parent_siblings() {
        let mut view = sample_view();
        let removed = view.collapse_subtree(1); // collapse A1

        assert_eq!(removed, 1);
        assert_eq!(texts(&view), vec![("A", 0), ("A1", 1), ("A2", 1), ("B", 0)]);
    }

    #[test]
    fn collapse_expand_round_trips() {
        let mut view = sample_view();
        let before = texts(&view)
            .iter()
            .map(|(t, d)| (t.to_string(), *d))
            .collect::<Vec<_>>();

        let a1 = view.get(1).unwrap().comment.clone();
        let a11 = node("A1.1", Some(&a1));
        view.collapse_subtree(1);
        view.expand_subtree(1, vec![a11], 0);

        let after = texts(&view)
            .iter()
            .map(|(t, d)| (t.to_string(), *d))
            .collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn find_parent_skips_siblings_at_same_depth() {
        let view = sample_view();
        // A2 at index 3; the scan must step over A1.1 and A1's subtree back
        // to A, not stop at sibling A1.
        assert_eq!(view.find_parent_index(3), Some(0));
        assert_eq!(view.find_parent_index(2), Some(1)); // A1.1 -> A1
        assert_eq!(view.find_parent_index(1), Some(0)); // A1 -> A
        assert_eq!(view.find_parent_index(0), None); // A is a root
        assert_eq!(view.find_parent_index(4), None); // B is a root
    }

    #[test]
    fn parent_lookup_matches_persisted_parent_id() {
        let view = sample_view();
        for index in 0..view.len() {
            let entry = view.get(index).unwrap();
            match view.find_parent_index(index) {
                Some(parent_index) => assert_eq!(
                    view.get(parent_index).unwrap().comment.id,
                    Some(entry.comment.parent.unwrap())
                ),
                None => assert!(entry.comment.parent.is_none()),
            }
        }
    }

    #[test]
    fn remove_deleted_takes_descendants_and_unlinks_parent() {
        let mut view = sample_view();
        let a1_id = view.get(1).unwrap().comment.id.unwrap();
        // Give A a children list to unlink from.
        view.entries[0].comment.children = vec![a1_id, view.entries[3].comment.id.unwrap()];
        view.entries[0].replies_expanded = true;

        let removed = view.remove_deleted(1); // delete A1 (takes A1.1)

        assert_eq!(removed, 2);
        assert_eq!(texts(&view), vec![("A", 0), ("A2", 1), ("B", 0)]);
        let a = view.get(0).unwrap();
        assert!(!a.comment.children.contains(&a1_id));
        assert!(a.replies_expanded); // A2 still listed
    }

    #[test]
    fn remove_last_child_clears_expanded_flag() {
        let a = node("A", None);
        let a1 = node("A1", Some(&a));
        let a1_id = a1.id.unwrap();

        let mut view = ThreadView::from_roots(vec![a]);
        view.expand_subtree(0, vec![a1], 0);
        view.entries[0].comment.children = vec![a1_id];

        view.remove_deleted(1);

        let a = view.get(0).unwrap();
        assert!(a.comment.children.is_empty());
        assert!(!a.replies_expanded);
    }

    #[test]
    fn materialized_children_counts_direct_level_only() {
        let view = sample_view();
        assert_eq!(view.materialized_children(0), 2); // A1, A2 but not A1.1
        assert_eq!(view.materialized_children(1), 1); // A1.1
        assert_eq!(view.materialized_children(4), 0); // B
    }

    #[test]
    fn depth_invariant_holds_across_mixed_operations() {
        let mut view = sample_view();
        let a2 = view.get(3).unwrap().comment.clone();
        let a21 = node("A2.1", Some(&a2));

        view.expand_subtree(3, vec![a21], 0);
        view.collapse_subtree(1);
        view.insert_root(node("C", None));
        view.remove_deleted(2); // delete A1 after collapse

        assert_depth_invariant(&view);
    }
}
