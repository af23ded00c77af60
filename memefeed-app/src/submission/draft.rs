use memefeed_common::{
    media::MediaKind,
    model::post::{POST_TITLE_MAX_LEN, PostTitle},
};
use mime::Mime;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use thiserror::Error;
use url::Url;

const MIB: u64 = 1024 * 1024;
pub const MAX_UPLOAD_BYTES: u64 = 20 * MIB;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum ValidationError {
    #[error("File size must be less than {}MB", .max / MIB)]
    FileTooLarge { size: u64, max: u64 },
    #[error("Title must be at most {POST_TITLE_MAX_LEN} characters")]
    TitleTooLong { length: usize },
    #[error("Either media URL or file upload is required")]
    MissingMedia,
    #[error("A meme is already being posted")]
    SubmissionInProgress,
    #[error("Please enter a valid media URL")]
    InvalidUrl(url::ParseError),
}

/// A file picked from the local machine.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LocalFile {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: Mime,
}

impl LocalFile {
    pub fn new(path: impl AsRef<Path>, size: u64, content_type: Mime) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            size,
            content_type,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or("upload")
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum MediaReference {
    File(LocalFile),
    Url(Url),
}

/// What the posting form shows as a preview of the selected media.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum PreviewRef {
    LocalFile(PathBuf),
    Remote(Url),
}

/// A meme post being composed. Holds at most one media reference.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SubmissionDraft {
    title: Option<PostTitle>,
    media: Option<MediaReference>,
    media_kind: MediaKind,
    nsfw: bool,
    preview: Option<PreviewRef>,
}

impl SubmissionDraft {
    #[must_use]
    pub fn title(&self) -> Option<&PostTitle> {
        self.title.as_ref()
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaReference> {
        self.media.as_ref()
    }

    #[must_use]
    pub fn file(&self) -> Option<&LocalFile> {
        match &self.media {
            Some(MediaReference::File(file)) => Some(file),
            Some(MediaReference::Url(_)) | None => None,
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match &self.media {
            Some(MediaReference::Url(url)) => Some(url),
            Some(MediaReference::File(_)) | None => None,
        }
    }

    #[must_use]
    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    #[must_use]
    pub fn nsfw(&self) -> bool {
        self.nsfw
    }

    #[must_use]
    pub fn preview(&self) -> Option<&PreviewRef> {
        self.preview.as_ref()
    }

    /// Replaces any media with `file`.
    pub fn select_file(
        &mut self,
        file: LocalFile,
        max_upload_bytes: u64,
    ) -> Result<MediaKind, ValidationError> {
        let kind = validate_file(&file, max_upload_bytes)?;

        self.media_kind = kind;
        self.preview = Some(PreviewRef::LocalFile(file.path.clone()));
        self.media = Some(MediaReference::File(file));
        Ok(kind)
    }

    /// Replaces any media with the URL in `text`. Blank text leaves the draft
    /// without media.
    pub fn set_url(&mut self, text: &str) -> Result<Option<MediaKind>, ValidationError> {
        let Some(url) = parse_media_url(text)? else {
            self.clear_media();
            return Ok(None);
        };

        let kind = MediaKind::from_url(&url);
        self.media_kind = kind;
        self.preview = Some(PreviewRef::Remote(url.clone()));
        self.media = Some(MediaReference::Url(url));
        Ok(Some(kind))
    }

    pub fn set_title(&mut self, text: &str) -> Result<(), ValidationError> {
        self.title = validate_title(text)?;
        Ok(())
    }

    pub fn toggle_nsfw(&mut self, nsfw: bool) {
        self.nsfw = nsfw;
    }

    pub fn set_media_kind(&mut self, kind: MediaKind) {
        self.media_kind = kind;
    }

    pub fn clear_media(&mut self) {
        self.media = None;
        self.preview = None;
    }

    /// The media to submit, provided the draft may be submitted at all.
    pub fn validate_for_submission(
        &self,
        max_upload_bytes: u64,
    ) -> Result<&MediaReference, ValidationError> {
        let media = self.media.as_ref().ok_or(ValidationError::MissingMedia)?;
        if let MediaReference::File(file) = media {
            validate_file(file, max_upload_bytes)?;
        }

        Ok(media)
    }
}

/// Checks the size limit and infers the media kind from the content type.
pub fn validate_file(file: &LocalFile, max_upload_bytes: u64) -> Result<MediaKind, ValidationError> {
    if file.size > max_upload_bytes {
        return Err(ValidationError::FileTooLarge {
            size: file.size,
            max: max_upload_bytes,
        });
    }

    Ok(MediaKind::from_content_type(&file.content_type))
}

/// `None` for blank input.
pub fn parse_media_url(text: &str) -> Result<Option<Url>, ValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    Url::parse(text)
        .map(Some)
        .map_err(ValidationError::InvalidUrl)
}

/// `None` for blank input. The length limit applies to blank input too.
pub fn validate_title(text: &str) -> Result<Option<PostTitle>, ValidationError> {
    let length = text.chars().count();
    if length > POST_TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong { length });
    }
    if text.trim().is_empty() {
        return Ok(None);
    }

    PostTitle::new(text.to_owned())
        .map(Some)
        .map_err(|err| ValidationError::TitleTooLong {
            length: err.0.chars().count(),
        })
}

#[cfg(test)]
mod tests {
    use crate::submission::draft::{
        LocalFile, MAX_UPLOAD_BYTES, MediaReference, PreviewRef, SubmissionDraft, ValidationError,
        validate_title,
    };
    use memefeed_common::media::MediaKind;
    use pretty_assertions::assert_eq;

    const MIB: u64 = 1024 * 1024;

    fn file(name: &str, size: u64, content_type: &str) -> LocalFile {
        LocalFile::new(name, size, content_type.parse().unwrap())
    }

    #[test]
    fn oversized_files_are_rejected() {
        let mut draft = SubmissionDraft::default();

        let err = draft
            .select_file(file("big.mp4", 21 * MIB, "video/mp4"), MAX_UPLOAD_BYTES)
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: 21 * MIB,
                max: MAX_UPLOAD_BYTES
            }
        );
        assert_eq!(err.to_string(), "File size must be less than 20MB");
        assert_eq!(draft, SubmissionDraft::default());
    }

    #[test]
    fn upload_limit_is_inclusive() {
        let mut draft = SubmissionDraft::default();

        let kind = draft
            .select_file(file("exact.png", 20 * MIB, "image/png"), MAX_UPLOAD_BYTES)
            .unwrap();
        assert_eq!(kind, MediaKind::Image);
        assert!(draft.validate_for_submission(MAX_UPLOAD_BYTES).is_ok());

        let err = draft
            .select_file(file("over.png", 20 * MIB + 1, "image/png"), MAX_UPLOAD_BYTES)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: 20 * MIB + 1,
                max: MAX_UPLOAD_BYTES
            }
        );
        assert_eq!(draft.file().map(LocalFile::file_name), Some("exact.png"));
    }

    #[test]
    fn files_set_kind_and_preview() {
        let mut draft = SubmissionDraft::default();

        let kind = draft
            .select_file(file("clip.mp4", 19 * MIB, "video/mp4"), MAX_UPLOAD_BYTES)
            .unwrap();

        assert_eq!(kind, MediaKind::Video);
        assert_eq!(draft.media_kind(), MediaKind::Video);
        assert_eq!(
            draft.preview(),
            Some(&PreviewRef::LocalFile("clip.mp4".into()))
        );
        assert_eq!(draft.file().unwrap().file_name(), "clip.mp4");

        draft
            .select_file(file("dance.gif", MIB, "image/gif"), MAX_UPLOAD_BYTES)
            .unwrap();
        assert_eq!(draft.media_kind(), MediaKind::Gif);
    }

    #[test]
    fn urls_set_kind_and_blank_clears() {
        let mut draft = SubmissionDraft::default();

        assert_eq!(draft.set_url("https://x.com/a.gif"), Ok(Some(MediaKind::Gif)));
        assert_eq!(draft.media_kind(), MediaKind::Gif);

        assert_eq!(draft.set_url("https://x.com/a.png"), Ok(Some(MediaKind::Image)));
        assert_eq!(draft.media_kind(), MediaKind::Image);

        assert_eq!(draft.set_url(""), Ok(None));
        assert_eq!(draft.media(), None);
        assert_eq!(draft.preview(), None);
    }

    #[test]
    fn invalid_urls_leave_the_draft_alone() {
        let mut draft = SubmissionDraft::default();
        draft.set_url("https://x.com/a.gif").unwrap();
        let before = draft.clone();

        assert!(matches!(
            draft.set_url("definitely not a url"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert_eq!(draft, before);
    }

    #[test]
    fn file_and_url_are_mutually_exclusive() {
        enum Step {
            File,
            Url,
        }

        let sequences = [
            vec![Step::File, Step::Url],
            vec![Step::Url, Step::File],
            vec![Step::File, Step::File, Step::Url, Step::File],
            vec![Step::Url, Step::Url, Step::File, Step::Url],
        ];

        for sequence in sequences {
            let mut draft = SubmissionDraft::default();
            for step in &sequence {
                match step {
                    Step::File => {
                        draft
                            .select_file(file("a.png", MIB, "image/png"), MAX_UPLOAD_BYTES)
                            .unwrap();
                        assert!(matches!(draft.media(), Some(MediaReference::File(_))));
                        assert_eq!(draft.url(), None);
                    }
                    Step::Url => {
                        draft.set_url("https://x.com/b.mp4").unwrap();
                        assert!(matches!(draft.media(), Some(MediaReference::Url(_))));
                        assert_eq!(draft.file(), None);
                    }
                }
            }
        }
    }

    #[test]
    fn titles() {
        assert_eq!(validate_title("   "), Ok(None));
        assert!(validate_title(&"a".repeat(200)).unwrap().is_some());
        assert_eq!(
            validate_title(&"a".repeat(201)),
            Err(ValidationError::TitleTooLong { length: 201 })
        );
        assert_eq!(
            validate_title(&" ".repeat(201)),
            Err(ValidationError::TitleTooLong { length: 201 })
        );
        assert_eq!(validate_title(&" ".repeat(200)), Ok(None));
    }

    #[test]
    fn missing_media_blocks_submission() {
        let mut draft = SubmissionDraft::default();
        draft.set_title("When the test passes on the first try").unwrap();
        draft.toggle_nsfw(true);

        assert_eq!(
            draft.validate_for_submission(MAX_UPLOAD_BYTES),
            Err(ValidationError::MissingMedia)
        );
    }
}
