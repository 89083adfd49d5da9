use std::collections::HashMap;

use super::model::Comment;

/// Assembles one page of comments into a forest of roots with nested replies.
///
/// Input order is preserved at every level. A reply whose parent is not in
/// `comments` (for example because the parent fell on another page) is
/// dropped together with anything nested under it. Runs in O(n).
pub fn build_tree(comments: Vec<Comment>) -> Vec<Comment> {
    let index: HashMap<i32, usize> = comments
        .iter()
        .enumerate()
        .map(|(pos, c)| (c.id, pos))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (pos, c) in comments.iter().enumerate() {
        match c.parent_id {
            None => roots.push(pos),
            Some(parent_id) => {
                if let Some(&parent) = index.get(&parent_id) {
                    if parent != pos {
                        children[parent].push(pos);
                    }
                }
            }
        }
    }

    // Pre-order from the roots; every reachable position is listed once,
    // always before its own replies.
    let mut order = Vec::with_capacity(children.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(pos) = stack.pop() {
        order.push(pos);
        stack.extend(children[pos].iter().rev());
    }

    // Walking it backwards finishes every reply before its parent claims it.
    // Each slot is taken at most once, so no comment can appear twice.
    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    for &pos in order.iter().rev() {
        let replies: Vec<Comment> = children[pos]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(node) = slots[pos].as_mut() {
            node.replies = replies;
        }
    }

    roots.into_iter().filter_map(|pos| slots[pos].take()).collect()
}
