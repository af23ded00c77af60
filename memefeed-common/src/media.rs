//! Classification of media references into the kinds a meme post can hold.

use mime::Mime;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use url::Url;

const VIDEO_SUFFIXES: [&str; 3] = [".mp4", ".webm", ".mov"];
const GIF_SUFFIX: &str = ".gif";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaKind {
    #[default]
    Image,
    Gif,
    Video,
}

impl MediaKind {
    /// Infers the kind from a declared content type.
    ///
    /// `video/*` is a video, `image/gif` is a GIF and everything else is
    /// treated as a still image.
    #[must_use]
    pub fn from_content_type(content_type: &Mime) -> Self {
        if content_type.type_() == mime::VIDEO {
            Self::Video
        } else if content_type.essence_str() == mime::IMAGE_GIF.essence_str() {
            Self::Gif
        } else {
            Self::Image
        }
    }

    /// Infers the kind from the suffix of the URL's path. Query strings and
    /// fragments do not take part.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let path = url.path().to_ascii_lowercase();

        if VIDEO_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
            Self::Video
        } else if path.ends_with(GIF_SUFFIX) {
            Self::Gif
        } else {
            Self::Image
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "IMAGE",
            MediaKind::Gif => "GIF",
            MediaKind::Video => "VIDEO",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
