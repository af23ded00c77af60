use memefeed_common::{
    media::MediaKind,
    model::{
        ModelValidationError, Timestamp,
        article::{Article, ArticleContent, ArticleTitle, Slug},
        comment::{Comment, CommentBody},
        post::{MemePost, PostTitle},
        user::{Profile, Role, User, Username},
    },
};
use thiserror::Error;
use time::{Date, UtcDateTime};
use url::Url;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum DbDataError {
    #[error(transparent)]
    Model(#[from] ModelValidationError),
    #[error("Unknown media type {0:?}")]
    MediaType(String),
    #[error("Unknown role {0:?}")]
    Role(String),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: String,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub date_of_birth: Date,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct MemePostRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: Option<String>,
    pub media_type: String,
    pub media_url: String,
    pub storage_path: Option<String>,
    pub nsfw: bool,
    pub like_count: u64,
    pub comment_count: u64,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CommentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub body: String,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub cover_image_url: Option<String>,
    pub content: String,
    pub published: bool,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}

fn parse_media_type(media_type: String) -> Result<MediaKind, DbDataError> {
    match media_type.as_str() {
        "IMAGE" => Ok(MediaKind::Image),
        "GIF" => Ok(MediaKind::Gif),
        "VIDEO" => Ok(MediaKind::Video),
        _ => Err(DbDataError::MediaType(media_type)),
    }
}

fn parse_role(role: String) -> Result<Role, DbDataError> {
    match role.as_str() {
        "USER" => Ok(Role::User),
        "ADMIN" => Ok(Role::Admin),
        _ => Err(DbDataError::Role(role)),
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "USER",
        Role::Admin => "ADMIN",
    }
}

fn parse_optional_url(url: Option<String>) -> Result<Option<Url>, DbDataError> {
    url.as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|err| ModelValidationError::from(err).into())
}

impl TryFrom<UserRecord> for User {
    type Error = DbDataError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            email: value.email,
            name: value.name,
            image: parse_optional_url(value.image)?,
            role: parse_role(value.role)?,
            created_at: Timestamp::new(value.created_at),
        })
    }
}

impl From<&User> for UserRecord {
    fn from(value: &User) -> Self {
        Self {
            id: value.id.uuid(),
            email: value.email.clone(),
            name: value.name.clone(),
            image: value.image.as_ref().map(Url::to_string),
            role: role_str(value.role).to_owned(),
            created_at: value.created_at.get(),
        }
    }
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = DbDataError;

    fn try_from(value: ProfileRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            user_id: value.user_id.into(),
            username: Username::new(value.username).map_err(ModelValidationError::from)?,
            date_of_birth: value.date_of_birth,
            created_at: Timestamp::new(value.created_at),
        })
    }
}

impl From<&Profile> for ProfileRecord {
    fn from(value: &Profile) -> Self {
        Self {
            id: value.id.uuid(),
            user_id: value.user_id.uuid(),
            username: value.username.get().to_owned(),
            date_of_birth: value.date_of_birth,
            created_at: value.created_at.get(),
        }
    }
}

impl TryFrom<MemePostRecord> for MemePost {
    type Error = DbDataError;

    fn try_from(value: MemePostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            author_id: value.author_id.into(),
            title: value
                .title
                .map(PostTitle::new)
                .transpose()
                .map_err(ModelValidationError::from)?,
            media_kind: parse_media_type(value.media_type)?,
            media_url: Url::parse(&value.media_url).map_err(ModelValidationError::from)?,
            storage_path: value.storage_path,
            nsfw: value.nsfw,
            like_count: value.like_count,
            comment_count: value.comment_count,
            created_at: Timestamp::new(value.created_at),
            updated_at: Timestamp::new(value.updated_at),
        })
    }
}

impl From<&MemePost> for MemePostRecord {
    fn from(value: &MemePost) -> Self {
        Self {
            id: value.id.uuid(),
            author_id: value.author_id.uuid(),
            title: value.title.as_ref().map(|title| title.get().to_owned()),
            media_type: value.media_kind.as_str().to_owned(),
            media_url: value.media_url.to_string(),
            storage_path: value.storage_path.clone(),
            nsfw: value.nsfw,
            like_count: value.like_count,
            comment_count: value.comment_count,
            created_at: value.created_at.get(),
            updated_at: value.updated_at.get(),
        }
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = DbDataError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            user_id: value.user_id.into(),
            post_id: value.post_id.into(),
            body: CommentBody::new(value.body).map_err(ModelValidationError::from)?,
            created_at: Timestamp::new(value.created_at),
        })
    }
}

impl TryFrom<ArticleRecord> for Article {
    type Error = DbDataError;

    fn try_from(value: ArticleRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            author_id: value.author_id.into(),
            title: ArticleTitle::new(value.title).map_err(ModelValidationError::from)?,
            slug: Slug::new(value.slug).map_err(ModelValidationError::from)?,
            cover_image_url: parse_optional_url(value.cover_image_url)?,
            content: ArticleContent::new(value.content).map_err(ModelValidationError::from)?,
            published: value.published,
            created_at: Timestamp::new(value.created_at),
            updated_at: Timestamp::new(value.updated_at),
        })
    }
}

impl From<&Article> for ArticleRecord {
    fn from(value: &Article) -> Self {
        Self {
            id: value.id.uuid(),
            author_id: value.author_id.uuid(),
            title: value.title.get().to_owned(),
            slug: value.slug.get().to_owned(),
            cover_image_url: value.cover_image_url.as_ref().map(Url::to_string),
            content: value.content.get().to_owned(),
            published: value.published,
            created_at: value.created_at.get(),
            updated_at: value.updated_at.get(),
        }
    }
}
