use memefeed_app::{
    clock::{Clock, SystemClock},
    config::{AppConfig, ConfigError},
    feed::{Feed, FeedError, FeedKind, TimeFrame, share_url},
    notify::TracingNotifier,
    refresh::TimeAgo,
    seed::seed,
    session::AuthState,
    submission::{SubmissionWorkflow, SubmitError},
};
use memefeed_common::model::ModelValidationError;
use memefeed_db::client::DbClient;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Error building storage URL: {0}")]
    StorageUrl(#[from] url::ParseError),
    #[error("Error seeding sample content: {0}")]
    Seed(#[from] ModelValidationError),
    #[error("Error loading feed: {0}")]
    Feed(#[from] FeedError),
    #[error("Error rendering feed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error posting meme: {0}")]
    Submit(#[from] SubmitError),
    #[error("Error waiting for shutdown signal: {0}")]
    Signal(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "memefeed_app=debug,memefeed_common=debug,memefeed_db=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_config() -> Result<AppConfig, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    AppConfig::from_env().map_err(InitError::from)
}

fn print_json(heading: &str, value: &impl Serialize) -> Result<(), InitError> {
    println!("== {heading} ==\n{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = get_config()?;
    let share_base = config.share_base_url()?;
    let refresh_interval = config.refresh_interval()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let db = Arc::new(DbClient::new(share_base.join("storage/")?));
    let users = seed(&db, clock.now())?;

    let feed = Feed::new(db.clone(), clock.clone());
    print_json("Top today", &feed.load(FeedKind::Top(TimeFrame::Today)).await?)?;
    print_json("Top this week", &feed.load(FeedKind::Top(TimeFrame::Week)).await?)?;
    print_json("Fresh", &feed.load(FeedKind::Fresh).await?)?;
    print_json("Articles", &feed.articles().await?)?;

    let session = users
        .into_iter()
        .next()
        .map_or(AuthState::SignedOut, AuthState::SignedIn);
    let workflow = SubmissionWorkflow::new(db.clone(), TracingNotifier, config.submission());
    workflow
        .set_url("https://media.giphy.com/media/friday-deploy.gif")
        .map_err(SubmitError::from)?;
    workflow
        .set_title("It works on my machine")
        .map_err(SubmitError::from)?;
    let post_id = workflow
        .submit(&session, |progress| {
            debug!(percent = progress.percent(), "Upload progress");
        })
        .await?;
    info!(url = %share_url(&share_base, post_id)?, "Share your meme");

    let Some(entry) = feed.post(post_id).await? else {
        return Ok(());
    };
    let mut label = TimeAgo::mount(entry.post.created_at, clock, refresh_interval);
    info!(post = %post_id, posted = %label.text(), "Watching post age, press Ctrl-C to quit");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(InitError::Signal)?;
                break;
            }
            Some(age) = label.changed() => info!(post = %post_id, posted = %age, "Post age changed"),
        }
    }

    label.unmount().await;
    Ok(())
}
