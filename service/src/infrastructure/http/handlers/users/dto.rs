use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelf_common::UserId;

use crate::domain::{
    accounts::Registration,
    user::{ProfileChanges, Role, User},
};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(value: RegisterRequest) -> Self {
        Self {
            username: value.username,
            email: value.email,
            name: value.name,
            role: value.role,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(value: UpdateProfileRequest) -> Self {
        Self {
            name: value.name,
            bio: value.bio,
            avatar_url: value.avatar_url,
        }
    }
}

/// The caller's own account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    id: UserId,
    username: String,
    email: String,
    name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(value: &User) -> Self {
        Self {
            id: value.id,
            username: value.username.to_string(),
            email: value.email.to_string(),
            name: value.name.clone(),
            bio: value.bio.clone(),
            avatar_url: value.avatar_url.clone(),
            role: value.role,
            created_at: value.created_at,
        }
    }
}
