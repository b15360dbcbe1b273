//! Substring filtering and viewport math for the scrollable lists.

use std::borrow::Cow;

use crate::types::{Branch, Pipeline, PullRequest, Repository};

/// Branches whose pipelines are listed when no filter query is active.
pub const TRACKED_BRANCHES: [&str; 4] = ["develop", "staging", "main", "master"];

/// A list item that can be matched against a filter query.
pub trait Searchable {
    /// The fields a query is matched against, in no particular order.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// The visible subsequence of `items` for `query`.
    fn filtered<'a>(items: &'a [Self], query: &str) -> Vec<&'a Self>
    where
        Self: Sized,
    {
        filter(items, query)
    }
}

/// Case-insensitive substring filter preserving the original order.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    if query.is_empty() {
        return items.iter().collect();
    }

    let query = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
        })
        .collect()
}

impl Searchable for Repository {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(&self.name), Cow::Borrowed(&self.slug)]
    }
}

impl Searchable for Branch {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(&self.name)]
    }
}

impl Searchable for PullRequest {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(&self.title),
            Cow::Borrowed(&self.author),
            Cow::Borrowed(&self.source_branch),
        ]
    }
}

impl Searchable for Pipeline {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Owned(self.build_number.to_string()),
            Cow::Borrowed(self.state.as_api_str()),
            Cow::Borrowed(self.result.as_api_str()),
            Cow::Borrowed(&self.branch),
        ]
    }

    /// An empty query shows only tracked branches. Any query text searches
    /// every pipeline regardless of branch.
    fn filtered<'a>(items: &'a [Self], query: &str) -> Vec<&'a Self> {
        if query.is_empty() {
            return items
                .iter()
                .filter(|p| is_tracked_branch(&p.branch))
                .collect();
        }
        filter(items, query)
    }
}

/// Strip `refs/heads/` and leading slashes; `-` stands in for no branch.
pub fn normalize_branch(branch: &str) -> &str {
    let branch = branch.trim();
    let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
    let branch = branch.trim_start_matches('/');
    if branch.is_empty() {
        "-"
    } else {
        branch
    }
}

pub fn is_tracked_branch(branch: &str) -> bool {
    let branch = normalize_branch(branch).to_lowercase();
    TRACKED_BRANCHES.contains(&branch.as_str())
}

/// Visible `(start, end)` range of a list of `total` rows in a viewport of
/// `height` rows, roughly centered on `cursor`.
pub fn window(cursor: usize, total: usize, height: usize) -> (usize, usize) {
    if total <= height {
        return (0, total);
    }

    let height = height.max(1);
    let start = cursor.saturating_sub(height / 2).min(total - height);
    (start, start + height)
}

/// Clamp a cursor into `[0, len - 1]`, or 0 for an empty list.
pub fn clamp_cursor(cursor: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        cursor.min(len - 1)
    }
}
