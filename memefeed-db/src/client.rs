use crate::record::{
    ArticleRecord, CommentRecord, DbDataError, MemePostRecord, ProfileRecord, UserRecord,
};
use memefeed_common::model::{
    Id,
    article::{Article, Slug},
    comment::{CommentMarker, CreateComment},
    post::{CreatePost, MemePost, PostMarker},
    user::{Profile, User, UserMarker},
};
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use time::UtcDateTime;
use tracing::debug;
use url::Url;
use uuid::Uuid;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] DbDataError),
    #[error("Post with id {0} does not exist")]
    PostNotFound(Id<PostMarker>),
    #[error("Storage path could not be turned into a URL: {0}")]
    StorageUrl(#[from] url::ParseError),
    #[error("The backend is unavailable: {0}")]
    Unavailable(String),
}

/// Object-storage location of an uploaded media file.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct StoredMedia {
    pub storage_path: String,
    pub public_url: Url,
}

/// A file about to be placed in object storage.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct MediaUpload<'a> {
    pub owner: Id<UserMarker>,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub size: u64,
}

/// Outcome of toggling a like.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

/// The hosted backend that persists posts and serves feeds.
pub trait PostStore: Send + Sync {
    fn upload_media(
        &self,
        upload: MediaUpload<'_>,
    ) -> impl Future<Output = Result<StoredMedia>> + Send;

    fn create_post(&self, post: &CreatePost) -> impl Future<Output = Result<Id<PostMarker>>> + Send;

    fn fetch_post(
        &self,
        post_id: Id<PostMarker>,
    ) -> impl Future<Output = Result<Option<MemePost>>> + Send;

    fn fetch_posts(&self) -> impl Future<Output = Result<Vec<MemePost>>> + Send;

    fn fetch_user(
        &self,
        user_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    fn fetch_profile(
        &self,
        user_id: Id<UserMarker>,
    ) -> impl Future<Output = Result<Option<Profile>>> + Send;

    fn toggle_like(
        &self,
        user_id: Id<UserMarker>,
        post_id: Id<PostMarker>,
    ) -> impl Future<Output = Result<LikeState>> + Send;

    fn create_comment(
        &self,
        user_id: Id<UserMarker>,
        comment: &CreateComment,
    ) -> impl Future<Output = Result<Id<CommentMarker>>> + Send;

    /// Published articles only.
    fn fetch_articles(&self) -> impl Future<Output = Result<Vec<Article>>> + Send;

    fn fetch_article_by_slug(
        &self,
        slug: &Slug,
    ) -> impl Future<Output = Result<Option<Article>>> + Send;
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<UserRecord>,
    profiles: Vec<ProfileRecord>,
    posts: Vec<MemePostRecord>,
    likes: HashSet<(Uuid, Uuid)>,
    comments: Vec<CommentRecord>,
    articles: Vec<ArticleRecord>,
}

/// In-process stand-in for the hosted backend. Rows are kept as flat records
/// and validated on the way out, like rows coming back from a real database.
#[derive(Debug)]
pub struct DbClient {
    storage_base: Url,
    tables: Mutex<Tables>,
}

impl DbClient {
    /// `storage_base` is the public URL uploaded files are served under.
    #[must_use]
    pub fn new(storage_base: Url) -> Self {
        Self {
            storage_base,
            tables: Mutex::new(Tables::default()),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_user(&self, user: &User) {
        self.tables().users.push(user.into());
    }

    pub fn insert_profile(&self, profile: &Profile) {
        self.tables().profiles.push(profile.into());
    }

    pub fn insert_post(&self, post: &MemePost) {
        self.tables().posts.push(post.into());
    }

    pub fn insert_article(&self, article: &Article) {
        self.tables().articles.push(article.into());
    }

    /// Raw access for backfilling rows that bypass model validation.
    pub fn insert_post_record(&self, record: MemePostRecord) {
        self.tables().posts.push(record);
    }
}

impl PostStore for DbClient {
    async fn upload_media(&self, upload: MediaUpload<'_>) -> Result<StoredMedia> {
        let storage_path = format!("{}/{}-{}", upload.owner, Uuid::new_v4(), upload.file_name);
        let public_url = self.storage_base.join(&storage_path)?;

        debug!(
            %storage_path,
            content_type = upload.content_type,
            size = upload.size,
            "Stored media upload"
        );

        Ok(StoredMedia {
            storage_path,
            public_url,
        })
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        let id = Uuid::new_v4();
        let now = UtcDateTime::now();

        self.tables().posts.push(MemePostRecord {
            id,
            author_id: post.author.uuid(),
            title: post.title.as_ref().map(|title| title.get().to_owned()),
            media_type: post.media_kind.as_str().to_owned(),
            media_url: post.media_url.to_string(),
            storage_path: post.storage_path.clone(),
            nsfw: post.nsfw,
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        });

        debug!(post_id = %id, author = %post.author, "Created meme post");
        Ok(id.into())
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<MemePost>> {
        let record = self
            .tables()
            .posts
            .iter()
            .find(|record| record.id == post_id.uuid())
            .cloned();

        let post = record.map(MemePost::try_from).transpose()?;
        Ok(post)
    }

    async fn fetch_posts(&self) -> Result<Vec<MemePost>> {
        let records = self.tables().posts.clone();

        let posts = records
            .into_iter()
            .map(MemePost::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = self
            .tables()
            .users
            .iter()
            .find(|record| record.id == user_id.uuid())
            .cloned();

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_profile(&self, user_id: Id<UserMarker>) -> Result<Option<Profile>> {
        let record = self
            .tables()
            .profiles
            .iter()
            .find(|record| record.user_id == user_id.uuid())
            .cloned();

        let profile = record.map(Profile::try_from).transpose()?;
        Ok(profile)
    }

    async fn toggle_like(
        &self,
        user_id: Id<UserMarker>,
        post_id: Id<PostMarker>,
    ) -> Result<LikeState> {
        let mut tables = self.tables();
        let tables = &mut *tables;

        let post = tables
            .posts
            .iter_mut()
            .find(|record| record.id == post_id.uuid())
            .ok_or(DbError::PostNotFound(post_id))?;

        let key = (user_id.uuid(), post_id.uuid());
        let liked = if tables.likes.remove(&key) {
            post.like_count = post.like_count.saturating_sub(1);
            false
        } else {
            tables.likes.insert(key);
            post.like_count += 1;
            true
        };

        Ok(LikeState {
            liked,
            like_count: post.like_count,
        })
    }

    async fn create_comment(
        &self,
        user_id: Id<UserMarker>,
        comment: &CreateComment,
    ) -> Result<Id<CommentMarker>> {
        let mut tables = self.tables();

        let post = tables
            .posts
            .iter_mut()
            .find(|record| record.id == comment.post_id.uuid())
            .ok_or(DbError::PostNotFound(comment.post_id))?;
        post.comment_count += 1;

        let id = Uuid::new_v4();
        tables.comments.push(CommentRecord {
            id,
            user_id: user_id.uuid(),
            post_id: comment.post_id.uuid(),
            body: comment.body.get().to_owned(),
            created_at: UtcDateTime::now(),
        });

        Ok(id.into())
    }

    async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let records: Vec<_> = self
            .tables()
            .articles
            .iter()
            .filter(|record| record.published)
            .cloned()
            .collect();

        let articles = records
            .into_iter()
            .map(Article::try_from)
            .collect::<Result<_, _>>()?;
        Ok(articles)
    }

    async fn fetch_article_by_slug(&self, slug: &Slug) -> Result<Option<Article>> {
        let record = self
            .tables()
            .articles
            .iter()
            .find(|record| record.published && record.slug == slug.get())
            .cloned();

        let article = record.map(Article::try_from).transpose()?;
        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::{DbClient, DbError, MediaUpload, PostStore},
        record::MemePostRecord,
    };
    use memefeed_common::{
        media::MediaKind,
        model::{
            Id, Timestamp,
            article::{Article, ArticleContent, ArticleTitle, Slug},
            comment::{CommentBody, CreateComment},
            post::{CreatePost, PostTitle},
            user::{Profile, Username},
        },
    };
    use time::macros::{date, utc_datetime};
    use url::Url;
    use uuid::Uuid;

    fn client() -> DbClient {
        DbClient::new(Url::parse("https://cdn.example.com/memes/").unwrap())
    }

    fn create_post() -> CreatePost {
        CreatePost {
            author: Id::generate(),
            title: Some(PostTitle::try_from("Me explaining my code to my manager").unwrap()),
            media_kind: MediaKind::Image,
            media_url: Url::parse("https://example.com/manager.jpg").unwrap(),
            storage_path: None,
            nsfw: false,
        }
    }

    fn article(slug: &str, published: bool) -> Article {
        let created_at = Timestamp::new(utc_datetime!(2026-10-17 09:00));
        Article {
            id: Id::generate(),
            author_id: Id::generate(),
            title: ArticleTitle::try_from("The Business of Memes").unwrap(),
            slug: Slug::try_from(slug).unwrap(),
            cover_image_url: None,
            content: ArticleContent::try_from("Brands are leveraging meme culture").unwrap(),
            published,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn created_posts_can_be_fetched() {
        let db = client();
        let request = create_post();

        let id = db.create_post(&request).await.unwrap();
        let post = db.fetch_post(id).await.unwrap().unwrap();

        assert_eq!(post.author_id, request.author);
        assert_eq!(post.title, request.title);
        assert_eq!(post.like_count, 0);
        assert_eq!(db.fetch_posts().await.unwrap().len(), 1);
        assert!(db.fetch_post(Id::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uploads_land_under_the_storage_base() {
        let db = client();
        let owner = Id::generate();

        let stored = db
            .upload_media(MediaUpload {
                owner,
                file_name: "clip.mp4",
                content_type: "video/mp4",
                size: 1024,
            })
            .await
            .unwrap();

        assert!(stored.storage_path.starts_with(&owner.to_string()));
        assert!(stored.storage_path.ends_with("-clip.mp4"));
        assert!(
            stored
                .public_url
                .as_str()
                .starts_with("https://cdn.example.com/memes/")
        );
    }

    #[tokio::test]
    async fn likes_toggle() {
        let db = client();
        let user = Id::generate();
        let post = db.create_post(&create_post()).await.unwrap();

        let liked = db.toggle_like(user, post).await.unwrap();
        assert!(liked.liked);
        assert_eq!(liked.like_count, 1);

        let unliked = db.toggle_like(user, post).await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.like_count, 0);

        assert!(matches!(
            db.toggle_like(user, Id::generate()).await,
            Err(DbError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn comments_bump_the_count() {
        let db = client();
        let post_id = db.create_post(&create_post()).await.unwrap();
        let comment = CreateComment {
            post_id,
            body: CommentBody::try_from("lmao").unwrap(),
        };

        db.create_comment(Id::generate(), &comment).await.unwrap();
        db.create_comment(Id::generate(), &comment).await.unwrap();

        let post = db.fetch_post(post_id).await.unwrap().unwrap();
        assert_eq!(post.comment_count, 2);
    }

    #[tokio::test]
    async fn profiles_are_looked_up_by_user() {
        let db = client();
        let profile = Profile {
            id: Id::generate(),
            user_id: Id::generate(),
            username: Username::try_from("testing_queen").unwrap(),
            date_of_birth: date!(1994-05-02),
            created_at: Timestamp::new(utc_datetime!(2026-07-20 08:00)),
        };
        db.insert_profile(&profile);

        assert_eq!(
            db.fetch_profile(profile.user_id).await.unwrap(),
            Some(profile)
        );
        assert_eq!(db.fetch_profile(Id::generate()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unpublished_articles_are_hidden() {
        let db = client();
        db.insert_article(&article("business-of-memes", true));
        db.insert_article(&article("draft-article", false));

        let articles = db.fetch_articles().await.unwrap();
        assert_eq!(articles.len(), 1);

        let found = db
            .fetch_article_by_slug(&Slug::try_from("business-of-memes").unwrap())
            .await
            .unwrap();
        assert!(found.is_some());

        let draft = db
            .fetch_article_by_slug(&Slug::try_from("draft-article").unwrap())
            .await
            .unwrap();
        assert!(draft.is_none());
    }

    #[tokio::test]
    async fn invalid_rows_surface_as_data_errors() {
        let db = client();
        let now = utc_datetime!(2026-10-18 10:00);
        db.insert_post_record(MemePostRecord {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: None,
            media_type: "HOLOGRAM".into(),
            media_url: "https://example.com/a.png".into(),
            storage_path: None,
            nsfw: false,
            like_count: 0,
            comment_count: 0,
            created_at: now,
            updated_at: now,
        });

        assert!(matches!(db.fetch_posts().await, Err(DbError::Data(_))));
    }
}
