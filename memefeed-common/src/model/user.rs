use crate::model::{Id, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use url::Url;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const MINIMUM_AGE: i32 = 13;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<Url>,
    #[serde(default)]
    pub role: Role,
    pub created_at: Timestamp,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The name shown next to the user's content.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }
}

validated_text! {
    /// 3 to 30 ASCII letters, digits or underscores.
    Username, InvalidUsernameError = "Username must be 3-30 letters, numbers, or underscores";
    |value| (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&value.chars().count())
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("You must be at least 13 years old")]
pub struct UnderageError;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Profile {
    pub id: Id<ProfileMarker>,
    pub user_id: Id<UserMarker>,
    pub username: Username,
    pub date_of_birth: Date,
    pub created_at: Timestamp,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ProfileMarker;

impl Profile {
    /// Age in full years on `today`.
    #[must_use]
    pub fn age_on(&self, today: Date) -> i32 {
        age_on(self.date_of_birth, today)
    }

    pub fn validate_age(&self, today: Date) -> Result<(), UnderageError> {
        if self.age_on(today) >= MINIMUM_AGE {
            Ok(())
        } else {
            Err(UnderageError)
        }
    }
}

fn age_on(date_of_birth: Date, today: Date) -> i32 {
    let years = today.year() - date_of_birth.year();
    let birthday_passed = (u8::from(today.month()), today.day())
        >= (u8::from(date_of_birth.month()), date_of_birth.day());

    if birthday_passed { years } else { years - 1 }
}
