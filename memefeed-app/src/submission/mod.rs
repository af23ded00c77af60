//! Composing and posting a meme.
//!
//! The workflow owns a single [`SubmissionDraft`] and moves it through
//! [`DraftState`]s. Every rejected edit or submission is reported to the
//! [`Notifier`] as well as returned to the caller.

pub mod draft;

use crate::{
    notify::{Notification, Notifier},
    session::AuthState,
};
use draft::{LocalFile, MAX_UPLOAD_BYTES, MediaReference, SubmissionDraft, ValidationError};
use memefeed_common::{
    media::MediaKind,
    model::{
        Id,
        post::{CreatePost, PostMarker},
        user::UserMarker,
    },
};
use memefeed_db::client::{DbError, MediaUpload, PostStore};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const POSTED_MESSAGE: &str = "Meme posted successfully!";
pub const FAILED_MESSAGE: &str = "Failed to post meme. Please try again.";

const PROGRESS_STEP: u8 = 10;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct SubmissionConfig {
    pub max_upload_bytes: u64,
    /// Pause between two upload progress reports.
    pub progress_step_delay: Duration,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            progress_step_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum DraftState {
    Empty,
    MediaSelected,
    Submitting,
    Completed,
    Failed,
}

/// Percentage of a file upload, reported in steps of ten from 0 to 100.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct UploadProgress(u8);

impl UploadProgress {
    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Please sign in to post memes")]
    NotSignedIn,
    #[error("The submission was cancelled")]
    Cancelled,
    #[error("Storing the post failed: {0}")]
    Store(#[from] DbError),
}

impl SubmitError {
    /// The text shown to the user for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(_) | SubmitError::NotSignedIn | SubmitError::Cancelled => {
                self.to_string()
            }
            SubmitError::Store(_) => FAILED_MESSAGE.to_owned(),
        }
    }
}

/// Cancels the submission it was taken from.
#[derive(Clone, Debug)]
pub struct CancelHandle(CancellationToken);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Editing,
    Submitting {
        id: u64,
        token: CancellationToken,
    },
    Completed,
    Failed,
}

#[derive(Debug, Default)]
struct Inner {
    draft: SubmissionDraft,
    phase: Phase,
    /// Id handed to the next submission. Survives [`SubmissionWorkflow::reset`].
    next_submission: u64,
}

pub struct SubmissionWorkflow<S, N> {
    store: Arc<S>,
    notifier: N,
    config: SubmissionConfig,
    inner: Mutex<Inner>,
}

impl<S: PostStore, N: Notifier> SubmissionWorkflow<S, N> {
    pub fn new(store: Arc<S>, notifier: N, config: SubmissionConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            inner: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> DraftState {
        let inner = self.lock();
        match inner.phase {
            Phase::Editing if inner.draft.media().is_some() => DraftState::MediaSelected,
            Phase::Editing => DraftState::Empty,
            Phase::Submitting { .. } => DraftState::Submitting,
            Phase::Completed => DraftState::Completed,
            Phase::Failed => DraftState::Failed,
        }
    }

    #[must_use]
    pub fn draft(&self) -> SubmissionDraft {
        self.lock().draft.clone()
    }

    pub fn select_file(&self, file: LocalFile) -> Result<MediaKind, ValidationError> {
        let max_upload_bytes = self.config.max_upload_bytes;
        self.edit(|draft| draft.select_file(file, max_upload_bytes))
    }

    pub fn set_url(&self, text: &str) -> Result<Option<MediaKind>, ValidationError> {
        self.edit(|draft| draft.set_url(text))
    }

    pub fn set_title(&self, text: &str) -> Result<(), ValidationError> {
        self.edit(|draft| draft.set_title(text))
    }

    pub fn toggle_nsfw(&self, nsfw: bool) -> Result<(), ValidationError> {
        self.edit(|draft| {
            draft.toggle_nsfw(nsfw);
            Ok(())
        })
    }

    /// Overrides the inferred media kind.
    pub fn set_media_kind(&self, kind: MediaKind) -> Result<(), ValidationError> {
        self.edit(|draft| {
            draft.set_media_kind(kind);
            Ok(())
        })
    }

    pub fn clear_media(&self) -> Result<(), ValidationError> {
        self.edit(|draft| {
            draft.clear_media();
            Ok(())
        })
    }

    /// Discards the draft, cancelling a running submission.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if let Phase::Submitting { token, .. } = &inner.phase {
            token.cancel();
        }
        inner.draft = SubmissionDraft::default();
        inner.phase = Phase::Editing;
    }

    /// `None` unless a submission is running.
    #[must_use]
    pub fn cancel_handle(&self) -> Option<CancelHandle> {
        match &self.lock().phase {
            Phase::Submitting { token, .. } => Some(CancelHandle(token.clone())),
            Phase::Editing | Phase::Completed | Phase::Failed => None,
        }
    }

    /// Returns whether a running submission was cancelled.
    pub fn cancel(&self) -> bool {
        let handle = self.cancel_handle();
        if let Some(handle) = &handle {
            handle.cancel();
        }
        handle.is_some()
    }

    fn edit<T>(
        &self,
        apply: impl FnOnce(&mut SubmissionDraft) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let result = {
            let mut inner = self.lock();
            if matches!(inner.phase, Phase::Submitting { .. }) {
                Err(ValidationError::SubmissionInProgress)
            } else {
                let result = apply(&mut inner.draft);
                if result.is_ok() {
                    inner.phase = Phase::Editing;
                }
                result
            }
        };

        result.map_err(|err| self.reject(err))
    }

    fn reject(&self, err: ValidationError) -> ValidationError {
        debug!(error = %err, "Rejected meme draft");
        self.notifier.notify(Notification::error(err.to_string()));
        err
    }

    /// Uploads the selected file if there is one, then creates the post.
    ///
    /// On success the draft is cleared. On failure or cancellation the draft
    /// is left as it was before submitting. A submission that was discarded
    /// by [`reset`](Self::reset) leaves the workflow alone when it finishes.
    pub async fn submit<F>(
        &self,
        session: &AuthState,
        mut on_progress: F,
    ) -> Result<Id<PostMarker>, SubmitError>
    where
        F: FnMut(UploadProgress),
    {
        let started: Result<_, SubmitError> = {
            let mut inner = self.lock();
            if matches!(inner.phase, Phase::Submitting { .. }) {
                Err(ValidationError::SubmissionInProgress.into())
            } else if let Err(err) = inner
                .draft
                .validate_for_submission(self.config.max_upload_bytes)
            {
                Err(err.into())
            } else if let Some(author) = session.user() {
                let id = inner.next_submission;
                inner.next_submission += 1;
                let token = CancellationToken::new();
                inner.phase = Phase::Submitting {
                    id,
                    token: token.clone(),
                };
                Ok((author, id, inner.draft.clone(), token))
            } else {
                Err(SubmitError::NotSignedIn)
            }
        };
        let (author, id, snapshot, token) = started.inspect_err(|err| {
            debug!(error = %err, "Rejected meme submission");
            self.notifier.notify(Notification::error(err.user_message()));
        })?;

        info!(author = %author.id, media_kind = %snapshot.media_kind(), "Posting meme");
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Err(SubmitError::Cancelled),
            result = self.publish(author.id, &snapshot, &mut on_progress) => result,
        };

        let discarded = {
            let mut inner = self.lock();
            let discarded =
                !matches!(inner.phase, Phase::Submitting { id: current, .. } if current == id);
            match &outcome {
                _ if discarded => {}
                Ok(_) => {
                    inner.draft = SubmissionDraft::default();
                    inner.phase = Phase::Completed;
                }
                Err(SubmitError::Cancelled) => {
                    inner.draft = snapshot;
                    inner.phase = Phase::Editing;
                }
                Err(_) => {
                    inner.draft = snapshot;
                    inner.phase = Phase::Failed;
                }
            }
            discarded
        };

        match &outcome {
            Ok(post_id) => {
                info!(post = %post_id, discarded, "Posted meme");
                self.notifier.notify(Notification::success(POSTED_MESSAGE));
            }
            Err(SubmitError::Cancelled) => {
                debug!(discarded, "Meme submission cancelled");
            }
            Err(err) => {
                warn!(error = %err, "Posting meme failed");
                self.notifier.notify(Notification::error(err.user_message()));
            }
        }

        outcome
    }

    async fn publish<F>(
        &self,
        author: Id<UserMarker>,
        draft: &SubmissionDraft,
        on_progress: &mut F,
    ) -> Result<Id<PostMarker>, SubmitError>
    where
        F: FnMut(UploadProgress),
    {
        let (media_url, storage_path) = match draft.media() {
            Some(MediaReference::File(file)) => {
                self.report_progress(on_progress).await;

                let stored = self
                    .store
                    .upload_media(MediaUpload {
                        owner: author,
                        file_name: file.file_name(),
                        content_type: file.content_type.essence_str(),
                        size: file.size,
                    })
                    .await?;
                (stored.public_url, Some(stored.storage_path))
            }
            Some(MediaReference::Url(url)) => (url.clone(), None),
            None => return Err(ValidationError::MissingMedia.into()),
        };

        let post = CreatePost {
            author,
            title: draft.title().cloned(),
            media_kind: draft.media_kind(),
            media_url,
            storage_path,
            nsfw: draft.nsfw(),
        };
        Ok(self.store.create_post(&post).await?)
    }

    async fn report_progress<F>(&self, on_progress: &mut F)
    where
        F: FnMut(UploadProgress),
    {
        for percent in (0..=100).step_by(usize::from(PROGRESS_STEP)) {
            if percent > 0 {
                tokio::time::sleep(self.config.progress_step_delay).await;
            }
            on_progress(UploadProgress(percent));
        }
    }
}
