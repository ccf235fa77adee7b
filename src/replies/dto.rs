use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Reply;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    pub post_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReplyRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
}

impl From<Reply> for ReplyResponse {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.id,
            post_id: reply.post_id,
            parent_id: reply.parent_id,
            author_id: reply.author_id,
            content: reply.content,
            created_at: reply.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyReactionRequest {
    pub reply_id: Uuid,
    pub reaction_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_tolerates_missing_parent() {
        let req: CreateReplyRequest = serde_json::from_str(
            r#"{"postId":"4f5c1b1e-54ae-4f8e-9c36-7d10b2f0b6b3","content":"Resposta direta ao post"}"#,
        )
        .unwrap();
        assert!(req.parent_id.is_none());
    }
}
