/// Declares a `String` newtype that can only be constructed through a
/// validating predicate, together with its error type.
macro_rules! validated_text {
    (
        $(#[$meta:meta])*
        $name:ident, $error:ident = $message:literal;
        |$value:ident| $valid:expr
    ) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, ::thiserror::Error)]
        #[error("{}: {:?}", $message, .0)]
        pub struct $error(pub String);

        impl $name {
            pub fn new(value: String) -> Result<Self, $error> {
                let $value: &str = &value;
                if $valid {
                    Ok(Self(value))
                } else {
                    Err($error(value))
                }
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = $error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $error;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_owned())
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let inner = <String as ::serde::Deserialize<'de>>::deserialize(deserializer)?;
                $name::new(inner).map_err(|err| {
                    <D::Error as ::serde::de::Error>::invalid_value(
                        ::serde::de::Unexpected::Str(&err.0),
                        &stringify!($name),
                    )
                })
            }
        }
    };
}

pub mod article;
pub mod auth;
pub mod comment;
pub mod post;
pub mod user;

use crate::model::{
    article::{InvalidArticleContentError, InvalidArticleTitleError, InvalidSlugError},
    auth::{InvalidEmailError, InvalidPasswordError},
    comment::InvalidCommentBodyError,
    post::InvalidPostTitleError,
    user::{InvalidUsernameError, UnderageError},
};
use derive_where::derive_where;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
    str::FromStr,
};
use thiserror::Error;
use time::{OffsetDateTime, UtcDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    Underage(#[from] UnderageError),
    #[error(transparent)]
    Email(#[from] InvalidEmailError),
    #[error(transparent)]
    Password(#[from] InvalidPasswordError),
    #[error(transparent)]
    PostTitle(#[from] InvalidPostTitleError),
    #[error(transparent)]
    CommentBody(#[from] InvalidCommentBodyError),
    #[error(transparent)]
    ArticleTitle(#[from] InvalidArticleTitleError),
    #[error(transparent)]
    Slug(#[from] InvalidSlugError),
    #[error(transparent)]
    ArticleContent(#[from] InvalidArticleContentError),
    #[error(transparent)]
    Timestamp(#[from] InvalidTimestampError),
    #[error("Invalid media URL: {0}")]
    MediaUrl(#[from] url::ParseError),
}

#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<Marker>(Uuid, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4())
    }

    #[must_use]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<Uuid> for Id<Marker> {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for Uuid {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::new)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("Invalid timestamp {input:?}: {reason}")]
pub struct InvalidTimestampError {
    input: String,
    reason: String,
}

/// An absolute point in time, normalized to UTC.
///
/// Parsed from and rendered as RFC 3339.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Timestamp(UtcDateTime);

impl Timestamp {
    #[must_use]
    pub fn new(date_time: UtcDateTime) -> Self {
        Self(date_time)
    }

    #[must_use]
    pub fn now() -> Self {
        Self(UtcDateTime::now())
    }

    #[must_use]
    pub fn get(self) -> UtcDateTime {
        self.0
    }

    /// Time elapsed from `self` until `later`. Negative when `later` lies
    /// before `self`.
    #[must_use]
    pub fn until(self, later: Timestamp) -> time::Duration {
        later.0 - self.0
    }
}

impl From<UtcDateTime> for Timestamp {
    fn from(value: UtcDateTime) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for UtcDateTime {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl FromStr for Timestamp {
    type Err = InvalidTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OffsetDateTime::parse(s, &Rfc3339)
            .map(|date_time| Self(UtcDateTime::from(date_time)))
            .map_err(|err| InvalidTimestampError {
                input: s.to_owned(),
                reason: err.to_string(),
            })
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let formatted = OffsetDateTime::from(self.0)
            .format(&Rfc3339)
            .map_err(|_| std::fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        inner.parse().map_err(serde::de::Error::custom)
    }
}
