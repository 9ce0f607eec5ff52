use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_common::{Email, UserId, Username};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Visitor,
    Creator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Visitor => "VISITOR",
            Role::Creator => "CREATOR",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VISITOR" => Ok(Role::Visitor),
            "CREATOR" => Ok(Role::Creator),
            other => Err(format!("unknown role {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_creator(&self) -> bool {
        self.role == Role::Creator
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.username.as_ref())
    }
}

/// Input of the registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub name: Option<String>,
    pub role: Role,
}

/// Editable profile fields. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            user.name = Some(name);
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar_url) = self.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
    }
}

/// A user listed on the explore page together with the number of
/// projects visible to everyone
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub user: User,
    pub published_projects: i64,
}
