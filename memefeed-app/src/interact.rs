use crate::{
    notify::{Notification, Notifier},
    session::AuthState,
};
use memefeed_common::model::{
    Id,
    comment::{CommentBody, CommentMarker, CreateComment, InvalidCommentBodyError},
    post::PostMarker,
};
use memefeed_db::client::{DbError, LikeState, PostStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Please sign in to like posts")]
    SignInToLike,
    #[error("Please sign in to comment")]
    SignInToComment,
    #[error("Comment must be between 1 and 1000 characters")]
    InvalidComment(#[from] InvalidCommentBodyError),
    #[error("Something went wrong. Please try again.")]
    Store(#[from] DbError),
}

/// Likes and comments on behalf of the signed-in user.
pub struct Interactions<S, N> {
    store: Arc<S>,
    notifier: N,
}

impl<S: PostStore, N: Notifier> Interactions<S, N> {
    pub fn new(store: Arc<S>, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub async fn toggle_like(
        &self,
        session: &AuthState,
        post_id: Id<PostMarker>,
    ) -> Result<LikeState, InteractionError> {
        let result = match session.user() {
            Some(user) => self
                .store
                .toggle_like(user.id, post_id)
                .await
                .map_err(InteractionError::from),
            None => Err(InteractionError::SignInToLike),
        };

        self.report(result)
    }

    pub async fn comment(
        &self,
        session: &AuthState,
        post_id: Id<PostMarker>,
        body: &str,
    ) -> Result<Id<CommentMarker>, InteractionError> {
        let result = match session.user() {
            Some(user) => match CommentBody::new(body.trim().to_owned()) {
                Ok(body) => self
                    .store
                    .create_comment(user.id, &CreateComment { post_id, body })
                    .await
                    .map_err(InteractionError::from),
                Err(err) => Err(err.into()),
            },
            None => Err(InteractionError::SignInToComment),
        };

        self.report(result)
    }

    fn report<T>(&self, result: Result<T, InteractionError>) -> Result<T, InteractionError> {
        result.inspect_err(|err| {
            match err {
                InteractionError::Store(source) => warn!(error = %source, "Interaction failed"),
                _ => debug!(error = %err, "Interaction rejected"),
            }
            self.notifier.notify(Notification::error(err.to_string()));
        })
    }
}
