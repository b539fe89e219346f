use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use splitledger_core::UserId;
use splitledger_expenses::{normalize_email, NewUser, User};

use super::r#trait::UserDirectory;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Users {
    last_id: i64,
    by_id: BTreeMap<UserId, User>,
    by_email: HashMap<String, UserId>,
}

/// In-memory user directory (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Users>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::poisoned())?;

        if users.by_email.contains_key(user.email()) {
            return Err(StoreError::Conflict(format!(
                "user with email {} already exists",
                user.email()
            )));
        }

        users.last_id += 1;
        let created = User {
            id: UserId::new(users.last_id),
            name: user.name().to_string(),
            email: user.email().to_string(),
        };
        users.by_email.insert(created.email.clone(), created.id);
        users.by_id.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::poisoned())?;
        users
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {id} not found")))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let email = normalize_email(email);
        let users = self.users.read().map_err(|_| StoreError::poisoned())?;
        users
            .by_email
            .get(&email)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user with email {email} not found")))
    }

    async fn users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::poisoned())?;
        let mut found = emails
            .iter()
            .filter_map(|email| users.by_email.get(&normalize_email(email)))
            .filter_map(|id| users.by_id.get(id))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|user| user.id);
        found.dedup_by_key(|user| user.id);
        Ok(found)
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::poisoned())?;
        let mut found = ids
            .iter()
            .filter_map(|id| users.by_id.get(id))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by_key(|user| user.id);
        found.dedup_by_key(|user| user.id);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser::new(name, email).unwrap()
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let directory = InMemoryUserDirectory::new();
        let alice = directory.create_user(new_user("Alice", "alice@example.com")).await.unwrap();
        let bob = directory.create_user(new_user("Bob", "bob@example.com")).await.unwrap();
        assert!(alice.id < bob.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let directory = InMemoryUserDirectory::new();
        directory.create_user(new_user("Alice", "alice@example.com")).await.unwrap();

        let err = directory
            .create_user(new_user("Other Alice", "ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn lookups_by_email_ignore_case() {
        let directory = InMemoryUserDirectory::new();
        let alice = directory.create_user(new_user("Alice", "alice@example.com")).await.unwrap();

        assert_eq!(directory.get_user_by_email(" Alice@Example.com ").await.unwrap(), alice);
        assert!(matches!(
            directory.get_user_by_email("nobody@example.com").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn batch_lookups_skip_unknown_entries() {
        let directory = InMemoryUserDirectory::new();
        let alice = directory.create_user(new_user("Alice", "alice@example.com")).await.unwrap();
        let bob = directory.create_user(new_user("Bob", "bob@example.com")).await.unwrap();

        let by_email = directory
            .users_by_emails(&[
                "bob@example.com".to_string(),
                "carol@example.com".to_string(),
                "alice@example.com".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(by_email, vec![alice.clone(), bob.clone()]);

        let by_id = directory
            .users_by_ids(&[bob.id, UserId::new(99), bob.id])
            .await
            .unwrap();
        assert_eq!(by_id, vec![bob]);
    }
}
