//! Sample users with profiles, memes and an article for running the app without a backend.

use memefeed_common::{
    media::MediaKind,
    model::{
        Id, ModelValidationError, Timestamp,
        article::{Article, ArticleContent, ArticleTitle, Slug},
        post::{MemePost, PostTitle},
        user::{Profile, Role, User, Username},
    },
};
use memefeed_db::client::DbClient;
use time::{Date, Duration, macros::date};
use tracing::debug;
use url::Url;

struct SampleMeme {
    author: &'static str,
    title: &'static str,
    kind: MediaKind,
    photo: u32,
    born: Date,
    likes: u64,
    comments: u64,
    age: Duration,
}

const SAMPLE_MEMES: [SampleMeme; 6] = [
    SampleMeme {
        author: "CodeMaster",
        title: "When you finally understand recursion",
        kind: MediaKind::Image,
        photo: 4_439_901,
        born: date!(1994-03-14),
        likes: 152,
        comments: 24,
        age: Duration::ZERO,
    },
    SampleMeme {
        author: "DevLife",
        title: "Me explaining my code to my manager",
        kind: MediaKind::Image,
        photo: 1_181_671,
        born: date!(1990-07-02),
        likes: 89,
        comments: 12,
        age: Duration::hours(1),
    },
    SampleMeme {
        author: "TestingQueen",
        title: "When the test passes on the first try",
        kind: MediaKind::Image,
        photo: 1_108_099,
        born: date!(1997-11-23),
        likes: 203,
        comments: 45,
        age: Duration::hours(2),
    },
    SampleMeme {
        author: "FridayDeployer",
        title: "Just deployed to production on Friday",
        kind: MediaKind::Image,
        photo: 2_148_222,
        born: date!(1988-01-30),
        likes: 3,
        comments: 0,
        age: Duration::ZERO,
    },
    SampleMeme {
        author: "BugHunter",
        title: "When you fix a bug but create 3 new ones",
        kind: MediaKind::Image,
        photo: 1_181_263,
        born: date!(2001-05-09),
        likes: 12,
        comments: 2,
        age: Duration::minutes(10),
    },
    SampleMeme {
        author: "NightCoder",
        title: "My code at 3 AM vs 9 AM",
        kind: MediaKind::Gif,
        photo: 1_181_677,
        born: date!(1999-12-31),
        likes: 7,
        comments: 1,
        age: Duration::minutes(20),
    },
];

const ARTICLE_CONTENT: &str = "\
# The Evolution of Meme Culture: From Ancient Greece to TikTok

Memes have been around much longer than the internet. In fact, the concept of \
ideas spreading from person to person has been a fundamental part of human \
culture since the dawn of civilization.

## What is a Meme?

The term \"meme\" was first coined by evolutionary biologist Richard Dawkins in \
his 1976 book \"The Selfish Gene.\" He described memes as units of cultural \
transmission, analogous to genes in biological evolution.

## The Internet Revolution

The internet didn't create memes, but it certainly revolutionized how they \
spread: email forwards and forum signatures first, then social media, and now \
short videos and chat reactions.";

fn photo_url(photo: u32, width: u32) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "https://images.pexels.com/photos/{photo}/pexels-photo-{photo}.jpeg?auto=compress&cs=tinysrgb&w={width}"
    ))
}

fn at(now: Timestamp, age: Duration) -> Timestamp {
    Timestamp::new(now.get() - age)
}

/// Fills `db` with sample content dated relative to `now`. Returns the users
/// that were created.
pub fn seed(db: &DbClient, now: Timestamp) -> Result<Vec<User>, ModelValidationError> {
    let mut users = Vec::with_capacity(SAMPLE_MEMES.len());

    for sample in &SAMPLE_MEMES {
        let user = User {
            id: Id::generate(),
            email: format!("{}@example.com", sample.author.to_lowercase()),
            name: Some(sample.author.to_owned()),
            image: None,
            role: Role::User,
            created_at: at(now, Duration::days(90)),
        };
        db.insert_user(&user);

        let profile = Profile {
            id: Id::generate(),
            user_id: user.id,
            username: Username::try_from(sample.author)?,
            date_of_birth: sample.born,
            created_at: user.created_at,
        };
        profile.validate_age(now.get().date())?;
        db.insert_profile(&profile);

        let created_at = at(now, sample.age);
        db.insert_post(&MemePost {
            id: Id::generate(),
            author_id: user.id,
            title: Some(PostTitle::try_from(sample.title)?),
            media_kind: sample.kind,
            media_url: photo_url(sample.photo, 800)?,
            storage_path: None,
            nsfw: false,
            like_count: sample.likes,
            comment_count: sample.comments,
            created_at,
            updated_at: created_at,
        });
        users.push(user);
    }

    let published = at(now, Duration::days(1));
    db.insert_article(&Article {
        id: Id::generate(),
        author_id: users.first().map_or_else(Id::generate, |user| user.id),
        title: ArticleTitle::try_from(
            "The Evolution of Meme Culture: From Ancient Greece to TikTok",
        )?,
        slug: Slug::try_from("evolution-of-meme-culture")?,
        cover_image_url: Some(photo_url(1_181_671, 1200)?),
        content: ArticleContent::try_from(ARTICLE_CONTENT)?,
        published: true,
        created_at: published,
        updated_at: published,
    });

    debug!(users = users.len(), "Seeded sample content");
    Ok(users)
}
