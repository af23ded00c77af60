use crate::{
    media::MediaKind,
    model::{
        Id, Timestamp,
        user::{User, UserMarker},
    },
};
use serde::{Deserialize, Serialize};
use url::Url;

pub const POST_TITLE_MAX_LEN: usize = 200;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

validated_text! {
    /// An optional caption shown above the media. At most 200 characters.
    PostTitle, InvalidPostTitleError = "Title must be at most 200 characters";
    |value| value.chars().count() <= POST_TITLE_MAX_LEN
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct MemePost {
    pub id: Id<PostMarker>,
    pub author_id: Id<UserMarker>,
    pub title: Option<PostTitle>,
    #[serde(rename = "media_type")]
    pub media_kind: MediaKind,
    pub media_url: Url,
    pub storage_path: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MemePost {
    /// Authors may delete their own posts, admins may delete any.
    #[must_use]
    pub fn can_delete(&self, user: &User) -> bool {
        user.id == self.author_id || user.is_admin()
    }
}

/// Everything needed to persist a new post. Ids and timestamps are assigned
/// by the store.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub title: Option<PostTitle>,
    #[serde(rename = "media_type")]
    pub media_kind: MediaKind,
    pub media_url: Url,
    pub storage_path: Option<String>,
    pub nsfw: bool,
}

#[cfg(test)]
mod tests {
    use crate::{
        media::MediaKind,
        model::{
            Id, Timestamp,
            post::{MemePost, PostTitle},
            user::{Role, User},
        },
    };
    use time::macros::utc_datetime;
    use url::Url;

    fn user(role: Role) -> User {
        User {
            id: Id::generate(),
            email: "someone@example.com".into(),
            name: None,
            image: None,
            role,
            created_at: Timestamp::new(utc_datetime!(2026-01-01 00:00)),
        }
    }

    fn post_by(author: &User) -> MemePost {
        let created_at = Timestamp::new(utc_datetime!(2026-10-18 12:00));
        MemePost {
            id: Id::generate(),
            author_id: author.id,
            title: None,
            media_kind: MediaKind::Image,
            media_url: Url::parse("https://example.com/meme.jpg").unwrap(),
            storage_path: None,
            nsfw: false,
            like_count: 0,
            comment_count: 0,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn title_length_is_counted_in_chars() {
        assert!(PostTitle::try_from("a".repeat(200).as_str()).is_ok());
        assert!(PostTitle::try_from("ä".repeat(200).as_str()).is_ok());
        assert!(PostTitle::try_from("a".repeat(201).as_str()).is_err());
    }

    #[test]
    fn deletion_rights() {
        let author = user(Role::User);
        let stranger = user(Role::User);
        let admin = user(Role::Admin);
        let post = post_by(&author);

        assert!(post.can_delete(&author));
        assert!(!post.can_delete(&stranger));
        assert!(post.can_delete(&admin));
    }

    #[test]
    fn media_kind_serializes_as_media_type() {
        let post = post_by(&user(Role::User));
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["media_type"], "IMAGE");
    }
}
