use crate::clock::Clock;
use memefeed_common::{
    model::{
        Id, Timestamp,
        article::{Article, Slug},
        post::{MemePost, PostMarker},
        user::{Profile, UserMarker},
    },
    time_ago::RelativeTime,
};
use memefeed_db::client::{DbError, PostStore};
use serde::Serialize;
use std::{cmp::Reverse, sync::Arc};
use thiserror::Error;
use time::Duration;
use url::Url;

const UNKNOWN_AUTHOR: &str = "Anonymous";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    #[default]
    Today,
    Week,
}

impl TimeFrame {
    /// How far back a post may have been created to count.
    #[must_use]
    pub fn span(self) -> Duration {
        match self {
            TimeFrame::Today => Duration::days(1),
            TimeFrame::Week => Duration::weeks(1),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum FeedKind {
    /// Most liked first, limited to the time frame.
    Top(TimeFrame),
    /// Newest first.
    Fresh,
}

#[derive(Clone, Debug, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub post: MemePost,
    pub author: String,
    pub time_ago: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArticleSummary {
    #[serde(flatten)]
    pub article: Article,
    pub read_minutes: usize,
    pub published_on: String,
}

impl ArticleSummary {
    fn new(article: Article) -> Result<Self, FeedError> {
        Ok(Self {
            read_minutes: article.estimated_read_minutes(),
            published_on: article.published_on()?,
            article,
        })
    }
}

/// A user's public profile with their posts, newest first.
#[derive(Clone, Debug, Serialize)]
pub struct ProfilePage {
    #[serde(flatten)]
    pub profile: Profile,
    pub age: i32,
    pub posts: Vec<FeedEntry>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Could not format the publication date: {0}")]
    Date(#[from] time::error::Format),
}

/// Read-only views over the posts and articles in a [`PostStore`].
pub struct Feed<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: PostStore> Feed<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn load(&self, kind: FeedKind) -> Result<Vec<FeedEntry>, FeedError> {
        let now = self.clock.now();
        let mut posts = self.store.fetch_posts().await?;

        match kind {
            FeedKind::Top(frame) => {
                posts.retain(|post| post.created_at.until(now) <= frame.span());
                posts.sort_by_key(|post| (Reverse(post.like_count), Reverse(post.created_at)));
            }
            FeedKind::Fresh => posts.sort_by_key(|post| Reverse(post.created_at)),
        }

        let mut entries = Vec::with_capacity(posts.len());
        for post in posts {
            entries.push(self.entry(post, now).await?);
        }
        Ok(entries)
    }

    pub async fn post(&self, post_id: Id<PostMarker>) -> Result<Option<FeedEntry>, FeedError> {
        let Some(post) = self.store.fetch_post(post_id).await? else {
            return Ok(None);
        };

        Ok(Some(self.entry(post, self.clock.now()).await?))
    }

    async fn entry(&self, post: MemePost, now: Timestamp) -> Result<FeedEntry, FeedError> {
        let author = self
            .store
            .fetch_user(post.author_id)
            .await?
            .map_or_else(|| UNKNOWN_AUTHOR.to_owned(), |user| user.display_name().to_owned());

        Ok(FeedEntry {
            time_ago: RelativeTime::between(post.created_at, now).to_string(),
            author,
            post,
        })
    }

    pub async fn profile(
        &self,
        user_id: Id<UserMarker>,
    ) -> Result<Option<ProfilePage>, FeedError> {
        let Some(profile) = self.store.fetch_profile(user_id).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let mut posts = self.store.fetch_posts().await?;
        posts.retain(|post| post.author_id == user_id);
        posts.sort_by_key(|post| Reverse(post.created_at));

        let mut entries = Vec::with_capacity(posts.len());
        for post in posts {
            entries.push(self.entry(post, now).await?);
        }

        Ok(Some(ProfilePage {
            age: profile.age_on(now.get().date()),
            profile,
            posts: entries,
        }))
    }

    /// Published articles, newest first.
    pub async fn articles(&self) -> Result<Vec<ArticleSummary>, FeedError> {
        let mut articles = self.store.fetch_articles().await?;
        articles.sort_by_key(|article| Reverse(article.created_at));

        articles.into_iter().map(ArticleSummary::new).collect()
    }

    pub async fn article(&self, slug: &Slug) -> Result<Option<ArticleSummary>, FeedError> {
        self.store
            .fetch_article_by_slug(slug)
            .await?
            .map(ArticleSummary::new)
            .transpose()
    }
}

/// Link to a single meme, e.g. `https://memes.example/meme/<id>`.
pub fn share_url(base: &Url, post_id: Id<PostMarker>) -> Result<Url, url::ParseError> {
    let base = base.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/meme/{post_id}"))
}
