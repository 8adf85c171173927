use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "USER" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Payload segment of an access token as issued by the identity provider.
///
/// The decoded object is kept as-is so every claim, known or not, survives
/// a decode and re-encode unchanged. Typed accessors read the claims the
/// session layer cares about and treat a claim of the wrong type as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JwtClaims(Map<String, Value>);

impl From<Map<String, Value>> for JwtClaims {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

impl JwtClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Subject identifier. Some issuers send it as a number.
    pub fn sub(&self) -> Option<String> {
        match self.0.get("sub")? {
            Value::String(sub) => Some(sub.clone()),
            Value::Number(sub) => Some(sub.to_string()),
            _ => None,
        }
    }

    pub fn preferred_username(&self) -> Option<&str> {
        self.text("preferred_username")
    }

    pub fn given_name(&self) -> Option<&str> {
        self.text("given_name")
    }

    pub fn family_name(&self) -> Option<&str> {
        self.text("family_name")
    }

    pub fn email(&self) -> Option<&str> {
        self.text("email")
    }

    fn seconds(&self, name: &str) -> Option<i64> {
        let value = self.0.get(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|secs| secs.trunc() as i64))
    }

    /// Expiry in seconds since the epoch, fractional parts dropped.
    pub fn exp(&self) -> Option<i64> {
        self.seconds("exp")
    }

    pub fn iat(&self) -> Option<i64> {
        self.seconds("iat")
    }

    /// Role names under `realm_access.roles`. Non-string entries are skipped.
    pub fn realm_roles(&self) -> Vec<&str> {
        role_names(self.0.get("realm_access"))
    }

    /// Role names under `resource_access.<client_id>.roles`.
    pub fn client_roles(&self, client_id: &str) -> Vec<&str> {
        role_names(
            self.0
                .get("resource_access")
                .and_then(|clients| clients.get(client_id)),
        )
    }

    /// Realm roles unioned with the roles granted to `client_id`.
    /// Names outside the closed role set are dropped.
    pub fn roles(&self, client_id: &str) -> BTreeSet<Role> {
        self.realm_roles()
            .into_iter()
            .chain(self.client_roles(client_id))
            .filter_map(|name| match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    trace!("Ignoring role {}", name);
                    None
                }
            })
            .collect()
    }

    pub fn has_role(&self, client_id: &str, role: Role) -> bool {
        self.roles(client_id).contains(&role)
    }
}

fn role_names(access: Option<&Value>) -> Vec<&str> {
    access
        .and_then(|access| access.get("roles"))
        .and_then(Value::as_array)
        .map(|roles| roles.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default)]
    pub name: String,
}

/// Profile as returned by `/users/my-profile` and the user directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub keycloak_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub department: Option<Department>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub keycloak_id: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub department: Department,
}

impl CurrentUser {
    /// Minimal record derived from the token alone; server-side profile
    /// fields stay empty until the profile is fetched.
    pub fn from_claims(claims: &JwtClaims, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            keycloak_id: claims.sub().unwrap_or_default(),
            username: claims.preferred_username().unwrap_or_default().to_string(),
            firstname: claims.given_name().unwrap_or_default().to_string(),
            lastname: claims.family_name().unwrap_or_default().to_string(),
            email: claims.email().unwrap_or_default().to_string(),
            roles: roles.into_iter().collect(),
            user_id: 0,
            dob: None,
            department: Department::default(),
        }
    }

    pub fn from_profile(profile: UserResponse, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            keycloak_id: profile.keycloak_id,
            username: profile.username,
            firstname: profile.firstname,
            lastname: profile.lastname,
            email: profile.email,
            roles: roles.into_iter().collect(),
            user_id: profile.user_id,
            dob: profile.dob,
            department: profile.department.unwrap_or_default(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname).trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
