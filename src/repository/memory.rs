use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{TaskRepository, UserRepository};
use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskUpdate, User, UserId};

/// Map plus id sequence, mimicking a table with a serial primary key.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local credential store with the same uniqueness rule as `users.username`.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    table: Mutex<Table<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let mut table = lock(&self.table);
        if table.rows.values().any(|user| user.username == username) {
            return Err(AppError::DatabaseError(format!(
                "duplicate username: {}",
                username
            )));
        }

        let id = table.allocate_id();
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            refresh_token: None,
            created_at: Utc::now(),
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let table = lock(&self.table);
        Ok(table
            .rows
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn save_refresh_token(&self, user_id: UserId, token: &str) -> Result<(), AppError> {
        let mut table = lock(&self.table);
        if let Some(user) = table.rows.get_mut(&user_id) {
            user.refresh_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<User>, AppError> {
        let table = lock(&self.table);
        Ok(table
            .rows
            .values()
            .find(|user| user.refresh_token.as_deref() == Some(token))
            .cloned())
    }
}

/// Process-local task store.
#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    table: Mutex<Table<Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, user_id: UserId, input: &TaskInput) -> Result<Task, AppError> {
        let mut table = lock(&self.table);
        let id = table.allocate_id();
        let task = Task::new(id, input, user_id);
        table.rows.insert(id, task.clone());
        Ok(task)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Task>, AppError> {
        let table = lock(&self.table);
        Ok(table
            .rows
            .values()
            .rev()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_for_user(&self, id: i64, user_id: UserId) -> Result<Option<Task>, AppError> {
        let table = lock(&self.table);
        Ok(table
            .rows
            .get(&id)
            .filter(|task| task.user_id == user_id)
            .cloned())
    }

    async fn update_for_user(
        &self,
        id: i64,
        user_id: UserId,
        changes: &TaskUpdate,
    ) -> Result<bool, AppError> {
        let mut table = lock(&self.table);
        match table.rows.get_mut(&id) {
            Some(task) if task.user_id == user_id => {
                task.apply(changes);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_for_user(&self, id: i64, user_id: UserId) -> Result<bool, AppError> {
        let mut table = lock(&self.table);
        let owned = table
            .rows
            .get(&id)
            .map_or(false, |task| task.user_id == user_id);
        if owned {
            table.rows.remove(&id);
        }
        Ok(owned)
    }
}
