use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::firestore::Document;

/// Collection holding solutions (posts that receive comments).
pub const SOLUTIONS_COLLECTION: &str = "solutions";

/// Collection holding user profiles.
pub const USERS_COLLECTION: &str = "users";

/// Subcollection of a solution holding its comments.
pub const COMMENTS_COLLECTION: &str = "comments";

/// Solution field naming the owning user.
pub const OWNER_ID_FIELD: &str = "ownerId";

/// User field listing registered Huawei push tokens.
pub const PUSH_TOKENS_FIELD: &str = "huaweiPushTokens";

/// Path parameters of a comment document: `solutions/{solutionId}/comments/{commentId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPath {
    pub solution_id: String,
    pub comment_id: String,
}

impl CommentPath {
    /// Parse a document path, either relative or a full resource name
    /// (`projects/{p}/databases/{d}/documents/solutions/...`).
    pub fn parse(name: &str) -> Option<Self> {
        let relative = match name.split_once("/documents/") {
            Some((_, rest)) => rest,
            None => name,
        };

        let segments: Vec<&str> = relative.split('/').collect();
        match segments.as_slice() {
            [SOLUTIONS_COLLECTION, solution_id, COMMENTS_COLLECTION, comment_id]
                if !solution_id.is_empty() && !comment_id.is_empty() =>
            {
                Some(Self {
                    solution_id: solution_id.to_string(),
                    comment_id: comment_id.to_string(),
                })
            }
            _ => None,
        }
    }
}

/// A newly created comment, as delivered by the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEvent {
    pub solution_id: String,
    pub comment_id: String,
    pub author_user_id: String,
    pub author_username: String,
    pub text: String,
}

impl CommentEvent {
    /// Build the event from the created comment document.
    ///
    /// Missing `userId`, `username` or `text` fields decode as empty strings.
    pub fn from_document(document: &Document) -> Result<Self, AppError> {
        let path = CommentPath::parse(&document.name).ok_or_else(|| {
            AppError::InvalidEvent(format!(
                "document {:?} is not a solution comment",
                document.name
            ))
        })?;

        let field = |key: &str| {
            document.string_field(key).map(str::to_string).unwrap_or_else(|| {
                tracing::warn!(field = key, comment_id = %path.comment_id, "Comment field missing");
                String::new()
            })
        };

        Ok(Self {
            author_user_id: field("userId"),
            author_username: field("username"),
            text: field("text"),
            solution_id: path.solution_id,
            comment_id: path.comment_id,
        })
    }
}

/// The parts of a solution document this service reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub owner_id: Option<String>,
}

impl Solution {
    pub fn from_document(document: &Document) -> Self {
        Self {
            owner_id: document
                .string_field(OWNER_ID_FIELD)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }
}

/// The parts of a user document this service reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Registered device tokens, in stored order
    pub push_tokens: Vec<String>,
}

impl UserProfile {
    pub fn from_document(document: &Document) -> Self {
        Self {
            push_tokens: document.string_array_field(PUSH_TOKENS_FIELD),
        }
    }
}
