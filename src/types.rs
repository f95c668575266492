use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const ROLE_NAME_PREFIX: &str = "ROLE_";
const ROLE_NAME_MIN_LEN: usize = 10;
const PERMISSION_NAME_MIN_LEN: usize = 7;
const NAME_MAX_LEN: usize = 75;
const EMAIL_MAX_LEN: usize = 100;

macro_rules! define_entity_id {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(Uuid);

        impl $name {
            /// Draws a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self::from_uuid(value)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(value: &str) -> Result<Self> {
                Uuid::parse_str(value.trim()).map(Self).map_err(|_| {
                    Error::InvalidInput(format!("{} must be a valid UUID", $kind))
                })
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                value.parse()
            }
        }
    };
}

define_entity_id!(
    /// Public identifier of a user.
    UserId,
    "user id"
);
define_entity_id!(
    /// Public identifier of a role.
    RoleId,
    "role id"
);
define_entity_id!(
    /// Public identifier of a permission.
    PermissionId,
    "permission id"
);

macro_rules! define_name_type {
    ($(#[$doc:meta])* $name:ident, $validate:path) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            /// Creates a validated value.
            pub fn new(value: impl AsRef<str>) -> Result<Self> {
                $validate(value.as_ref()).map(Self)
            }

            /// Creates a value from a trusted string without validation.
            pub fn from_string(value: String) -> Self {
                Self(value)
            }

            /// Returns the underlying string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<&str> for $name {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::new(value)
            }
        }
    };
}

define_name_type!(
    /// Namespaced role name (`ROLE_` prefix, uppercase words joined by
    /// underscores, e.g. `ROLE_SYSTEM_ADMIN`).
    RoleName,
    validate_role_name
);
define_name_type!(
    /// Namespaced permission name (uppercase `WORD_WORD` form, e.g.
    /// `USER_READ`).
    PermissionName,
    validate_permission_name
);
define_name_type!(
    /// User email address, unique across the directory.
    EmailAddress,
    validate_email
);

fn is_upper_word(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_uppercase())
}

fn validate_role_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.len() < ROLE_NAME_MIN_LEN || trimmed.len() > NAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "role name length must be between {ROLE_NAME_MIN_LEN} and {NAME_MAX_LEN}"
        )));
    }
    let Some(rest) = trimmed.strip_prefix(ROLE_NAME_PREFIX) else {
        return Err(Error::InvalidInput(format!(
            "role name must start with '{ROLE_NAME_PREFIX}'"
        )));
    };
    if !rest.split('_').all(is_upper_word) {
        return Err(Error::InvalidInput(
            "role name must contain only uppercase words joined by single underscores".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_permission_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.len() < PERMISSION_NAME_MIN_LEN || trimmed.len() > NAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "permission name length must be between {PERMISSION_NAME_MIN_LEN} and {NAME_MAX_LEN}"
        )));
    }
    let mut segments = 0usize;
    for segment in trimmed.split('_') {
        if !is_upper_word(segment) {
            return Err(Error::InvalidInput(
                "permission name must contain only uppercase words joined by single underscores"
                    .to_string(),
            ));
        }
        segments += 1;
    }
    if segments < 2 {
        return Err(Error::InvalidInput(
            "permission name must have at least two words, e.g. USER_READ".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_email(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("email must not be empty".to_string()));
    }
    if trimmed.len() > EMAIL_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "email length must be <= {EMAIL_MAX_LEN}"
        )));
    }
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !trimmed.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(Error::InvalidInput(format!(
            "email has an invalid format: {trimmed}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_should_be_unique_and_round_trip() {
        let id = UserId::generate();
        assert_ne!(id, UserId::generate());

        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn id_parse_should_reject_garbage() {
        let result = RoleId::try_from("not-a-uuid");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn role_name_should_require_namespace_prefix() {
        assert!(RoleName::new("ROLE_SYSTEM_ADMIN").is_ok());
        assert!(RoleName::new("ROLE_AUDITOR").is_ok());

        assert!(RoleName::new("SYSTEM_ADMIN").is_err());
        assert!(RoleName::new("ROLE_admin_x").is_err());
        assert!(RoleName::new("ROLE__ADMIN").is_err());
        assert!(RoleName::new("ROLE_A").is_err());
    }

    #[test]
    fn permission_name_should_require_two_uppercase_words() {
        assert!(PermissionName::new("USER_READ").is_ok());
        assert!(PermissionName::new("ROLE_CREATE_ADMIN").is_ok());

        assert!(PermissionName::new("READALLS").is_err());
        assert!(PermissionName::new("user_read").is_err());
        assert!(PermissionName::new("USER_").is_err());
    }

    #[test]
    fn email_should_require_local_and_dotted_domain() {
        assert!(EmailAddress::new("ada@example.com").is_ok());
        assert_eq!(
            EmailAddress::new("  ada@example.com ").unwrap().as_str(),
            "ada@example.com"
        );

        assert!(EmailAddress::new("").is_err());
        assert!(EmailAddress::new("ada.example.com").is_err());
        assert!(EmailAddress::new("@example.com").is_err());
        assert!(EmailAddress::new("ada@example").is_err());
        assert!(EmailAddress::new("ada smith@example.com").is_err());
    }
}
