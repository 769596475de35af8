use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Role of an authenticated user.
///
/// The identity provider verifies the role before requests reach this
/// subsystem; everything here trusts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// A buyer.
    Client,
    /// A seller with products in the marketplace.
    Seller,
}

impl Role {
    /// Returns the role name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Seller => "SELLER",
        }
    }

    /// Parses a role from its wire form.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "CLIENT" => Some(Role::Client),
            "SELLER" => Some(Role::Seller),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The verified identity of the user making a request.
///
/// Passed explicitly to every operation that needs it; there is no ambient
/// security context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,

    /// Display name, when the identity provider forwarded one.
    pub name: Option<String>,
}

impl Caller {
    /// Creates a caller identity.
    pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            name: None,
        }
    }

    /// Attaches a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The name to show for this caller, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Returns true if the caller is a seller.
    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_form() {
        assert_eq!(Role::Client.as_str(), "CLIENT");
        assert_eq!(Role::Seller.as_str(), "SELLER");
        assert_eq!(Role::parse("SELLER"), Some(Role::Seller));
        assert_eq!(Role::parse("ADMIN"), None);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Client).unwrap();
        assert_eq!(json, "\"CLIENT\"");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let anonymous = Caller::new(UserId::new(), "b@example.com", Role::Client);
        assert_eq!(anonymous.display_name(), "b@example.com");

        let named = anonymous.clone().with_name("Jane Doe");
        assert_eq!(named.display_name(), "Jane Doe");
    }

    #[test]
    fn test_caller_is_seller() {
        let seller = Caller::new(UserId::new(), "s@example.com", Role::Seller);
        let buyer = Caller::new(UserId::new(), "b@example.com", Role::Client);
        assert!(seller.is_seller());
        assert!(!buyer.is_seller());
    }
}
