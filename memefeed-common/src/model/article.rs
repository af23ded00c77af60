use crate::model::{Id, Timestamp, user::UserMarker};
use serde::{Deserialize, Serialize};
use time::{format_description::BorrowedFormatItem, macros::format_description};
use url::Url;

pub const ARTICLE_TITLE_MAX_LEN: usize = 200;
pub const SLUG_MAX_LEN: usize = 200;
pub const WORDS_PER_MINUTE: usize = 200;

const LONG_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:long] [day padding:none], [year]");

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ArticleMarker;

validated_text! {
    ArticleTitle, InvalidArticleTitleError = "Article title must be 1-200 characters";
    |value| (1..=ARTICLE_TITLE_MAX_LEN).contains(&value.chars().count())
}

validated_text! {
    /// The URL segment of an article: lowercase letters, digits and hyphens.
    Slug, InvalidSlugError = "Slug can only contain lowercase letters, numbers, and hyphens";
    |value| (1..=SLUG_MAX_LEN).contains(&value.len())
        && value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

validated_text! {
    ArticleContent, InvalidArticleContentError = "Article content must not be empty";
    |value| !value.is_empty()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Article {
    pub id: Id<ArticleMarker>,
    pub author_id: Id<UserMarker>,
    pub title: ArticleTitle,
    pub slug: Slug,
    pub cover_image_url: Option<Url>,
    pub content: ArticleContent,
    #[serde(default)]
    pub published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Article {
    /// Minutes needed to read the article at 200 words per minute, rounded up.
    #[must_use]
    pub fn estimated_read_minutes(&self) -> usize {
        estimate_read_minutes(self.content.get())
    }

    pub fn published_on(&self) -> Result<String, time::error::Format> {
        long_date(self.created_at)
    }
}

#[must_use]
pub fn estimate_read_minutes(content: &str) -> usize {
    let words = content.split(' ').count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Renders a timestamp like "October 18, 2026".
pub fn long_date(timestamp: Timestamp) -> Result<String, time::error::Format> {
    timestamp.get().format(LONG_DATE)
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Timestamp,
        article::{Slug, estimate_read_minutes, long_date},
    };
    use time::macros::utc_datetime;

    #[test]
    fn slugs() {
        assert!(Slug::try_from("evolution-of-meme-culture").is_ok());
        assert!(Slug::try_from("top-10-memes-2026").is_ok());
        assert!(Slug::try_from("").is_err());
        assert!(Slug::try_from("Upper-Case").is_err());
        assert!(Slug::try_from("under_score").is_err());
    }

    #[test]
    fn read_time_rounds_up() {
        assert_eq!(estimate_read_minutes("Memes have been around"), 1);
        assert_eq!(estimate_read_minutes(&"word ".repeat(199)), 1);
        assert_eq!(estimate_read_minutes(&"word ".repeat(200)), 2);
        assert_eq!(estimate_read_minutes(&vec!["word"; 400].join(" ")), 2);
        assert_eq!(estimate_read_minutes(&vec!["word"; 401].join(" ")), 3);
    }

    #[test]
    fn long_dates() {
        let timestamp = Timestamp::new(utc_datetime!(2026-10-08 23:59));
        assert_eq!(long_date(timestamp).unwrap(), "October 8, 2026");
    }
}
