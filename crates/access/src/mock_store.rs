//! In-memory [`RoleStore`] for unit tests

use chrono::Utc;
use spk_database::{
    CreateRoleRequest, DatabaseError, DatabaseResult, Permission, Role, UpdateRoleRequest,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hierarchy::SYSTEM_ROLES;
use crate::store::RoleStore;

const SEED_KEYS: &[&str] = &[
    "member.view",
    "member.edit",
    "member.delete",
    "blog.view",
    "blog.delete",
    "role.view",
    "role.edit",
];

#[derive(Default)]
struct State {
    roles: BTreeMap<i64, Role>,
    permissions: Vec<Permission>,
    grants: HashMap<i64, BTreeSet<i64>>,
    assignments: BTreeSet<(i64, i64)>,
    users: HashSet<i64>,
    provinces: HashMap<i64, i64>,
    next_role_id: i64,
}

#[derive(Clone, Default)]
pub struct MockRoleStore {
    state: Arc<RwLock<State>>,
}

impl MockRoleStore {
    pub async fn seeded() -> Self {
        let store = Self::default();
        {
            let mut state = store.state.write().await;
            for (title, _) in SYSTEM_ROLES {
                state.next_role_id += 1;
                let id = state.next_role_id;
                state.roles.insert(id, role(id, title));
            }
            state.permissions = SEED_KEYS
                .iter()
                .enumerate()
                .map(|(index, key)| Permission {
                    id: index as i64 + 1,
                    key: key.to_string(),
                    description: None,
                })
                .collect();
        }
        store
    }

    pub async fn role_id(&self, title: &str) -> i64 {
        self.state
            .read()
            .await
            .roles
            .values()
            .find(|role| role.title == title)
            .map(|role| role.id)
            .unwrap_or_default()
    }

    pub async fn add_user(&self, user_id: i64) {
        self.state.write().await.users.insert(user_id);
    }

    pub async fn set_province(&self, user_id: i64, province_id: i64) {
        self.state.write().await.provinces.insert(user_id, province_id);
    }
}

fn role(id: i64, title: &str) -> Role {
    Role {
        id,
        title: title.to_string(),
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        user_count: 0,
    }
}

fn with_count(state: &State, role: &Role) -> Role {
    let mut role = role.clone();
    role.user_count = state
        .assignments
        .iter()
        .filter(|(_, role_id)| *role_id == role.id)
        .count() as i64;
    role
}

impl RoleStore for MockRoleStore {
    async fn roles(&self) -> DatabaseResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.values().map(|role| with_count(&state, role)).collect())
    }

    async fn role(&self, id: i64) -> DatabaseResult<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.get(&id).map(|role| with_count(&state, role)))
    }

    async fn create_role(&self, request: &CreateRoleRequest) -> DatabaseResult<Role> {
        let mut state = self.state.write().await;
        let title = request.title.trim();
        if state.roles.values().any(|role| role.title.eq_ignore_ascii_case(title)) {
            return Err(DatabaseError::Duplicate(format!("roles.title {title}")));
        }
        state.next_role_id += 1;
        let id = state.next_role_id;
        let mut created = role(id, title);
        created.description = request.description.clone();
        state.roles.insert(id, created.clone());
        Ok(created)
    }

    async fn update_role(&self, id: i64, request: &UpdateRoleRequest) -> DatabaseResult<Role> {
        let mut state = self.state.write().await;
        let role = state
            .roles
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found(format!("role {id}")))?;
        if let Some(title) = &request.title {
            role.title = title.trim().to_string();
        }
        if let Some(description) = &request.description {
            role.description = Some(description.clone());
        }
        let role = role.clone();
        Ok(with_count(&state, &role))
    }

    async fn delete_role(&self, id: i64) -> DatabaseResult<bool> {
        let mut state = self.state.write().await;
        state.assignments.retain(|(_, role_id)| *role_id != id);
        state.grants.remove(&id);
        Ok(state.roles.remove(&id).is_some())
    }

    async fn role_permissions(&self, role_id: i64) -> DatabaseResult<Vec<Permission>> {
        let state = self.state.read().await;
        let granted = state.grants.get(&role_id).cloned().unwrap_or_default();
        Ok(state
            .permissions
            .iter()
            .filter(|permission| granted.contains(&permission.id))
            .cloned()
            .collect())
    }

    async fn set_role_permissions(&self, role_id: i64, permission_ids: &[i64]) -> DatabaseResult<()> {
        let mut state = self.state.write().await;
        state
            .grants
            .insert(role_id, permission_ids.iter().copied().collect());
        Ok(())
    }

    async fn permissions(&self) -> DatabaseResult<Vec<Permission>> {
        Ok(self.state.read().await.permissions.clone())
    }

    async fn permission_roles(&self, permission_id: i64) -> DatabaseResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .filter(|role| {
                state
                    .grants
                    .get(&role.id)
                    .is_some_and(|granted| granted.contains(&permission_id))
            })
            .map(|role| with_count(&state, role))
            .collect())
    }

    async fn user_exists(&self, user_id: i64) -> DatabaseResult<bool> {
        Ok(self.state.read().await.users.contains(&user_id))
    }

    async fn user_roles(&self, user_id: i64) -> DatabaseResult<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, role_id)| state.roles.get(role_id))
            .map(|role| with_count(&state, role))
            .collect())
    }

    async fn user_permission_keys(&self, user_id: i64) -> DatabaseResult<Vec<String>> {
        let state = self.state.read().await;
        let mut keys = BTreeSet::new();
        for (_, role_id) in state.assignments.iter().filter(|(user, _)| *user == user_id) {
            for permission in &state.permissions {
                if state
                    .grants
                    .get(role_id)
                    .is_some_and(|granted| granted.contains(&permission.id))
                {
                    keys.insert(permission.key.clone());
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    async fn user_province(&self, user_id: i64) -> DatabaseResult<Option<i64>> {
        Ok(self.state.read().await.provinces.get(&user_id).copied())
    }

    async fn assign_role(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        Ok(self.state.write().await.assignments.insert((user_id, role_id)))
    }

    async fn revoke_role(&self, user_id: i64, role_id: i64) -> DatabaseResult<bool> {
        Ok(self.state.write().await.assignments.remove(&(user_id, role_id)))
    }

    async fn role_user_count(&self, role_id: i64) -> DatabaseResult<i64> {
        Ok(self
            .state
            .read()
            .await
            .assignments
            .iter()
            .filter(|(_, id)| *id == role_id)
            .count() as i64)
    }
}
