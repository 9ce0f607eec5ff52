use shelf_common::{Email, UserId, Username};
use tracing::info;

use crate::domain::{
    Clock,
    error::ServiceError,
    repository::UserRepository,
    user::{NewUser, PortfolioSummary, ProfileChanges, Role, User},
};

/// Registration request as received from the boundary
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    /// Only `CREATOR` grants the creator role
    pub role: Option<String>,
}

pub struct Accounts<'a, C, K> {
    content: &'a C,
    clock: &'a K,
}

impl<'a, C, K> Accounts<'a, C, K>
where
    C: UserRepository,
    K: Clock,
{
    pub fn new(content: &'a C, clock: &'a K) -> Self {
        Self { content, clock }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, ServiceError> {
        let username = Username::try_new(registration.username)
            .map_err(|e| ServiceError::Validation(format!("invalid username: {}", e)))?;
        let email = Email::try_new(registration.email)
            .map_err(|e| ServiceError::Validation(format!("invalid email: {}", e)))?;
        let role = match registration.role.as_deref() {
            Some("CREATOR") => Role::Creator,
            _ => Role::Visitor,
        };

        let user = self
            .content
            .create_user(
                NewUser {
                    username,
                    email,
                    name: registration.name.filter(|n| !n.trim().is_empty()),
                    role,
                },
                self.clock.now(),
            )
            .await?;
        info!("Registered user {} as {}", user.username, user.role.as_str());
        Ok(user)
    }

    /// The calling user. An identity that no longer resolves is unauthorized.
    pub async fn me(&self, caller: UserId) -> Result<User, ServiceError> {
        self.content
            .find_user(caller)
            .await?
            .ok_or(ServiceError::Unauthorized)
    }

    pub async fn update_profile(
        &self,
        caller: UserId,
        changes: ProfileChanges,
    ) -> Result<User, ServiceError> {
        let mut user = self.me(caller).await?;
        changes.apply(&mut user);
        user.updated_at = self.clock.now();
        self.content.update_user(&user).await?;
        Ok(user)
    }

    /// VISITOR -> CREATOR. Creators stay creators.
    pub async fn upgrade_to_creator(&self, caller: UserId) -> Result<User, ServiceError> {
        let mut user = self.me(caller).await?;
        if user.is_creator() {
            return Ok(user);
        }
        user.role = Role::Creator;
        user.updated_at = self.clock.now();
        self.content.update_user(&user).await?;
        info!("User {} upgraded to creator", user.username);
        Ok(user)
    }

    /// Users with at least one published project
    pub async fn published_portfolios(&self) -> Result<Vec<PortfolioSummary>, ServiceError> {
        Ok(self.content.published_portfolios().await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::infrastructure::memory::{ManualClock, MemoryStore};

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    fn fixture() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap());
        (MemoryStore::default(), clock)
    }

    #[tokio::test]
    async fn test_register_defaults_to_visitor() {
        let (store, clock) = fixture();
        let accounts = Accounts::new(&store, &clock);

        let user = accounts
            .register(Registration {
                role: Some("ADMIN".to_string()),
                ..registration("Alice", "alice@example.com")
            })
            .await
            .unwrap();

        assert_eq!(user.username.as_ref(), "alice");
        assert_eq!(user.role, Role::Visitor);
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let (store, clock) = fixture();
        let accounts = Accounts::new(&store, &clock);
        accounts
            .register(registration("alice", "alice@example.com"))
            .await
            .unwrap();

        let same_name = accounts
            .register(registration("alice", "other@example.com"))
            .await;
        let same_email = accounts
            .register(registration("alicia", "ALICE@example.com"))
            .await;

        assert!(matches!(same_name, Err(ServiceError::Conflict(_))));
        assert!(matches!(same_email, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_username_is_rejected() {
        let (store, clock) = fixture();
        let accounts = Accounts::new(&store, &clock);

        let result = accounts.register(registration("a b", "ab@example.com")).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_upgrade_is_idempotent() {
        let (store, clock) = fixture();
        let accounts = Accounts::new(&store, &clock);
        let user = accounts
            .register(registration("bob", "bob@example.com"))
            .await
            .unwrap();

        let upgraded = accounts.upgrade_to_creator(user.id).await.unwrap();
        let again = accounts.upgrade_to_creator(user.id).await.unwrap();

        assert_eq!(upgraded.role, Role::Creator);
        assert_eq!(again.role, Role::Creator);
        assert_eq!(accounts.me(user.id).await.unwrap().role, Role::Creator);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_absent_fields() {
        let (store, clock) = fixture();
        let accounts = Accounts::new(&store, &clock);
        let user = accounts
            .register(registration("carol", "carol@example.com"))
            .await
            .unwrap();

        accounts
            .update_profile(
                user.id,
                ProfileChanges {
                    bio: Some("Designer".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let updated = accounts
            .update_profile(
                user.id,
                ProfileChanges {
                    name: Some("Carol".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.bio.as_deref(), Some("Designer"));
        assert_eq!(updated.display_name(), "Carol");
    }

    #[tokio::test]
    async fn test_unknown_caller_is_unauthorized() {
        let (store, clock) = fixture();
        let accounts = Accounts::new(&store, &clock);
        assert_eq!(
            accounts.me(UserId::generate()).await.unwrap_err(),
            ServiceError::Unauthorized
        );
    }
}
