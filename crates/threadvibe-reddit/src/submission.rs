//! Submission payload parsing.
//!
//! Reddit's comments endpoint returns an array of two listings: the
//! submission itself, then the comment forest. Comment replies are
//! either a nested listing or an empty string, and unexpanded branches
//! appear as `more` placeholder nodes, so the tree is walked through a
//! `serde_json::Value` escape hatch rather than a fully typed mirror.

use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::Value;

use crate::client::RedditError;

/// A kinded API object: `t3` is a submission, `t1` a comment, `more` an
/// unexpanded placeholder.
#[derive(Debug, Deserialize)]
pub(crate) struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// One resolved submission and its comment forest.
#[derive(Debug)]
pub struct Submission {
    pub id: String,
    pub title: String,
    comments: Vec<Comment>,
}

#[derive(Debug)]
struct Comment {
    body: String,
    replies: Vec<Comment>,
}

impl Submission {
    /// Build a submission from the two-listing comments payload.
    pub(crate) fn from_listings(url: &str, listings: Vec<Thing>) -> Result<Self, RedditError> {
        let mut listings = listings.into_iter();

        let post = listings
            .next()
            .and_then(|thing| first_child(thing, "t3"))
            .ok_or_else(|| RedditError::NotFound(url.to_string()))?;
        let id = post["id"]
            .as_str()
            .ok_or_else(|| RedditError::NotFound(url.to_string()))?
            .to_string();
        let title = post["title"].as_str().unwrap_or_default().to_string();

        let comments = match listings.next() {
            Some(thing) => children_of(&thing.data)
                .into_iter()
                .filter_map(parse_comment)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            id,
            title,
            comments,
        })
    }

    /// Flatten the comment forest breadth-first into bodies, top-level
    /// comments before any replies, capped at `limit`.
    pub fn flattened_comments(&self, limit: usize) -> Vec<String> {
        let mut bodies = Vec::new();
        let mut queue: VecDeque<&Comment> = self.comments.iter().collect();

        while let Some(comment) = queue.pop_front() {
            if bodies.len() == limit {
                break;
            }
            bodies.push(comment.body.clone());
            queue.extend(comment.replies.iter());
        }

        bodies
    }
}

fn first_child(thing: Thing, kind: &str) -> Option<Value> {
    let listing: Listing = serde_json::from_value(thing.data).ok()?;
    listing
        .children
        .into_iter()
        .find(|child| child.kind == kind)
        .map(|child| child.data)
}

fn children_of(data: &Value) -> Vec<&Value> {
    data["children"]
        .as_array()
        .map(|children| children.iter().collect())
        .unwrap_or_default()
}

/// Parse one comment node; `more` placeholders and malformed nodes
/// yield `None` and are dropped, matching a fetch that discards
/// unexpanded branches.
fn parse_comment(node: &Value) -> Option<Comment> {
    if node["kind"].as_str() != Some("t1") {
        return None;
    }
    let data = &node["data"];
    let body = data["body"].as_str()?.to_string();

    // Replies are a listing object, or "" when there are none.
    let replies = match &data["replies"] {
        Value::Object(_) => children_of(&data["replies"]["data"])
            .into_iter()
            .filter_map(parse_comment)
            .collect(),
        _ => Vec::new(),
    };

    Some(Comment { body, replies })
}
