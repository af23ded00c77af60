use crate::model::{Id, Timestamp, post::PostMarker, user::UserMarker};
use serde::{Deserialize, Serialize};

pub const COMMENT_BODY_MAX_LEN: usize = 1000;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

validated_text! {
    CommentBody, InvalidCommentBodyError = "Comment must be 1-1000 characters";
    |value| (1..=COMMENT_BODY_MAX_LEN).contains(&value.chars().count())
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub user_id: Id<UserMarker>,
    pub post_id: Id<PostMarker>,
    pub body: CommentBody,
    pub created_at: Timestamp,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CreateComment {
    pub post_id: Id<PostMarker>,
    pub body: CommentBody,
}
