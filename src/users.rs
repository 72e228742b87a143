//! Accounts: registration, login, profiles and admin operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{Claims, PasswordHasher, TokenManager};
use crate::config::AuthSettings;
use crate::error::{DatabaseError, HappyFeetError, Result};
use crate::logging::redact_email;
use crate::models::{
    ProfileUpdate, RegistrationRequest, User, UserProfile, UserRole, UserStatus,
};
use crate::store::Store;

/// Token plus the public view of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

/// One row of the admin activity report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub email: String,
    pub last_login: Option<DateTime<Utc>>,
    pub status: UserStatus,
}

#[derive(Debug, Clone)]
pub struct UserService {
    hasher: PasswordHasher,
    tokens: TokenManager,
}

impl UserService {
    pub fn new(hasher: PasswordHasher, tokens: TokenManager) -> Self {
        Self { hasher, tokens }
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        Ok(Self::new(
            PasswordHasher::new(settings.bcrypt_cost),
            TokenManager::from_settings(settings)?,
        ))
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Create an account and sign it in
    pub fn register(&self, store: &mut dyn Store, request: &RegistrationRequest) -> Result<AuthSession> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if store.find_user_by_email(&email)?.is_some() {
            return Err(HappyFeetError::Conflict("Email already exists".to_string()));
        }

        let password_hash = self.hasher.hash(request.password.trim())?;
        let user = User::new(request, password_hash)?;
        store.insert_user(&user).map_err(|e| match e {
            DatabaseError::Duplicate { .. } => {
                HappyFeetError::Conflict("Email already exists".to_string())
            }
            other => other.into(),
        })?;

        info!(user_id = %user.id, email = %redact_email(&user.email), "Registered user");
        self.session(&user)
    }

    /// Check credentials and record the login time
    pub fn login(&self, store: &mut dyn Store, email: &str, password: &str) -> Result<AuthSession> {
        let invalid = || HappyFeetError::Unauthorized("Invalid credentials".to_string());

        let mut user = store
            .find_user_by_email(&email.trim().to_lowercase())?
            .ok_or_else(invalid)?;
        if !self.hasher.verify(password.trim(), &user.password_hash) {
            warn!(email = %redact_email(&user.email), "Failed login attempt");
            return Err(invalid());
        }
        ensure_active(&user)?;

        user.last_login = Some(Utc::now());
        store.update_user(&user)?;

        info!(user_id = %user.id, "User logged in");
        self.session(&user)
    }

    /// Verified claims of a session token
    pub fn authenticate(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token)
    }

    /// User behind a session token
    pub fn current_user(&self, store: &dyn Store, token: &str) -> Result<User> {
        let claims = self.authenticate(token)?;
        let user = store
            .find_user(&claims.sub)?
            .ok_or_else(|| HappyFeetError::Unauthorized("Account no longer exists".to_string()))?;
        // Sessions issued before the account was disabled stop working too
        ensure_active(&user)?;
        Ok(user)
    }

    pub fn profile(&self, store: &dyn Store, user_id: &str) -> Result<UserProfile> {
        Ok(UserProfile::from(&find_user(store, user_id)?))
    }

    pub fn update_profile(
        &self,
        store: &mut dyn Store,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile> {
        let mut user = find_user(store, user_id)?;
        user.apply_update(update)?;
        store.update_user(&user)?;
        info!(user_id = %user.id, "Profile updated");
        Ok(UserProfile::from(&user))
    }

    /// All accounts, in registration order (admin only)
    pub fn list_users(&self, store: &dyn Store, caller_id: &str) -> Result<Vec<UserProfile>> {
        require_admin(store, caller_id)?;
        Ok(store.list_users()?.iter().map(UserProfile::from).collect())
    }

    /// Last login and status of every account (admin only)
    pub fn activity_history(&self, store: &dyn Store, caller_id: &str) -> Result<Vec<ActivityEntry>> {
        require_admin(store, caller_id)?;
        Ok(store
            .list_users()?
            .into_iter()
            .map(|u| ActivityEntry {
                email: u.email,
                last_login: u.last_login,
                status: u.status,
            })
            .collect())
    }

    /// Change another account's role (admin only)
    pub fn set_role(
        &self,
        store: &mut dyn Store,
        caller_id: &str,
        target_email: &str,
        role: &str,
    ) -> Result<UserProfile> {
        require_admin(store, caller_id)?;
        let role: UserRole = role.parse()?;
        let user = change_role(store, target_email, role)?;
        info!(caller = %caller_id, target = %user.id, role = %role, "Role changed");
        Ok(UserProfile::from(&user))
    }

    /// Grant admin without a signed-in caller. Only reachable from the local CLI.
    pub fn promote_to_admin(&self, store: &mut dyn Store, email: &str) -> Result<UserProfile> {
        let user = change_role(store, email, UserRole::Admin)?;
        warn!(target = %user.id, "Admin role granted by local operator");
        Ok(UserProfile::from(&user))
    }

    fn session(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession {
            token: self.tokens.issue(user)?,
            user: UserProfile::from(user),
        })
    }
}

fn find_user(store: &dyn Store, user_id: &str) -> Result<User> {
    store
        .find_user(user_id)?
        .ok_or_else(|| HappyFeetError::NotFound("User".to_string()))
}

fn require_admin(store: &dyn Store, caller_id: &str) -> Result<User> {
    match store.find_user(caller_id)? {
        Some(user) if user.is_admin() => Ok(user),
        _ => Err(HappyFeetError::Forbidden("Admin access required".to_string())),
    }
}

fn change_role(store: &mut dyn Store, email: &str, role: UserRole) -> Result<User> {
    let mut user = store
        .find_user_by_email(&email.trim().to_lowercase())?
        .ok_or_else(|| HappyFeetError::NotFound("User".to_string()))?;
    user.role = role;
    user.updated_at = Utc::now();
    store.update_user(&user)?;
    Ok(user)
}

fn ensure_active(user: &User) -> Result<()> {
    if user.status == UserStatus::Disabled {
        return Err(HappyFeetError::Forbidden("Account is disabled".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use rust_decimal_macros::dec;

    fn service() -> UserService {
        UserService::new(
            PasswordHasher::new(4),
            TokenManager::new("unit-test-secret", 24).unwrap(),
        )
    }

    fn request(email: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: "Runner".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            username: "runner".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_and_login() {
        let service = service();
        let mut store = MemoryStore::new();

        let session = service.register(&mut store, &request("Runner@Example.com")).unwrap();
        assert_eq!(session.user.email, "runner@example.com");
        assert_eq!(service.authenticate(&session.token).unwrap().sub, session.user.id);

        let login = service.login(&mut store, "runner@example.com", "password123").unwrap();
        assert!(login.user.last_login.is_some());

        let err = service.login(&mut store, "runner@example.com", "wrong-pass").unwrap_err();
        assert_eq!(err.status_code(), 401);
        let err = service.login(&mut store, "nobody@example.com", "password123").unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
    }

    #[test]
    fn test_disabled_account_loses_existing_session() {
        let service = service();
        let mut store = MemoryStore::new();
        let session = service.register(&mut store, &request("paused@example.com")).unwrap();
        assert!(service.current_user(&store, &session.token).is_ok());

        let mut user = store.find_user(&session.user.id).unwrap().unwrap();
        user.status = UserStatus::Disabled;
        store.update_user(&user).unwrap();

        let err = service.current_user(&store, &session.token).unwrap_err();
        assert_eq!(err.status_code(), 403);
        let err = service.login(&mut store, "paused@example.com", "password123").unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_duplicate_registration_conflicts() {
        let service = service();
        let mut store = MemoryStore::new();
        service.register(&mut store, &request("dup@example.com")).unwrap();

        let err = service.register(&mut store, &request("DUP@example.com")).unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(store.count_users().unwrap(), 1);
    }

    #[test]
    fn test_invalid_registration_rejected() {
        let service = service();
        let mut store = MemoryStore::new();
        let mut bad = request("runner@example.com");
        bad.password = "short".to_string();

        let err = service.register(&mut store, &bad).unwrap_err();
        assert_eq!(err.status_code(), 422);
        assert_eq!(store.count_users().unwrap(), 0);
    }

    #[test]
    fn test_update_profile_keeps_identity() {
        let service = service();
        let mut store = MemoryStore::new();
        let session = service.register(&mut store, &request("me@example.com")).unwrap();

        let update = ProfileUpdate {
            username: Some("speedy".to_string()),
            longest_recent_run: Some(dec!(21.1)),
            ..Default::default()
        };
        let profile = service.update_profile(&mut store, &session.user.id, &update).unwrap();
        assert_eq!(profile.username, "speedy");
        assert_eq!(profile.email, "me@example.com");
        assert_eq!(profile.longest_recent_run, dec!(21.1));

        assert!(service.profile(&store, "missing").is_err());
    }

    #[test]
    fn test_admin_operations() {
        let service = service();
        let mut store = MemoryStore::new();
        let admin = service.register(&mut store, &request("admin@example.com")).unwrap();
        let runner = service.register(&mut store, &request("runner@example.com")).unwrap();

        let err = service.list_users(&store, &admin.user.id).unwrap_err();
        assert_eq!(err.status_code(), 403);

        service.promote_to_admin(&mut store, "admin@example.com").unwrap();
        assert_eq!(service.list_users(&store, &admin.user.id).unwrap().len(), 2);

        let activity = service.activity_history(&store, &admin.user.id).unwrap();
        assert_eq!(activity[1].email, "runner@example.com");

        let err = service
            .set_role(&mut store, &admin.user.id, "runner@example.com", "superuser")
            .unwrap_err();
        assert_eq!(err.status_code(), 422);

        let promoted = service
            .set_role(&mut store, &admin.user.id, "runner@example.com", "admin")
            .unwrap();
        assert_eq!(promoted.role, UserRole::Admin);

        let err = service
            .set_role(&mut store, &runner.user.id, "ghost@example.com", "user")
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
