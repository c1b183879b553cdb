use serde::{Deserialize, Serialize};

/// Numeric user types stored in `employee.user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    AppAdmin,
    HQ,
    OrgAdmin,
    OrgExecutive,
    OrgCaseworker,
    ImamUser,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::AppAdmin,
        Role::HQ,
        Role::OrgAdmin,
        Role::OrgExecutive,
        Role::OrgCaseworker,
        Role::ImamUser,
    ];

    pub fn id(self) -> i64 {
        match self {
            Role::AppAdmin => 1,
            Role::HQ => 2,
            Role::OrgAdmin => 3,
            Role::OrgExecutive => 4,
            Role::OrgCaseworker => 5,
            Role::ImamUser => 6,
        }
    }

    pub fn from_id(id: i64) -> Option<Role> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    /// Key used by the role matrix and accepted in `role` claims
    pub fn key(self) -> &'static str {
        match self {
            Role::AppAdmin => "AppAdmin",
            Role::HQ => "HQ",
            Role::OrgAdmin => "OrgAdmin",
            Role::OrgExecutive => "OrgExecutive",
            Role::OrgCaseworker => "OrgCaseworker",
            Role::ImamUser => "ImamUser",
        }
    }

    pub fn from_key(key: &str) -> Option<Role> {
        Self::ALL.into_iter().find(|r| r.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::AppAdmin => "App Admin",
            Role::HQ => "HQ",
            Role::OrgAdmin => "Org Admin",
            Role::OrgExecutive => "Org Executive",
            Role::OrgCaseworker => "Org Caseworker",
            Role::ImamUser => "Imam User",
        }
    }

    /// AppAdmin and HQ see every center.
    pub fn is_global_admin(self) -> bool {
        matches!(self, Role::AppAdmin | Role::HQ)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A role reference as it appears in token claims: either a numeric id
/// (`3`, `"3"`) or a role key (`"OrgAdmin"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Id(i64),
    Name(String),
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        RoleRef::Id(role.id())
    }
}

/// Resolve the role id from the first present claim candidate.
///
/// Role keys resolve to their id; anything else is parsed as an integer the
/// way a lenient form value would be (`" 4 "` and `"4x"` both give 4).
/// Returns the raw id, which may not correspond to a known [`Role`].
pub fn parse_role_id<'a, I>(candidates: I) -> Option<i64>
where
    I: IntoIterator<Item = Option<&'a RoleRef>>,
{
    for candidate in candidates.into_iter().flatten() {
        match candidate {
            RoleRef::Id(id) => return Some(*id),
            RoleRef::Name(name) => {
                if let Some(role) = Role::from_key(name).or_else(|| Role::from_key(name.trim())) {
                    return Some(role.id());
                }
                if let Some(id) = parse_int_like(name) {
                    return Some(id);
                }
            }
        }
    }
    None
}

/// Lenient integer parsing: optional surrounding whitespace, optional sign,
/// then leading digits. Trailing garbage is ignored.
pub fn parse_int_like(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|n| n * sign)
}
