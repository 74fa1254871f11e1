//! Permission gate carried by every entity.
//!
//! The gate maps each [`Category`] to the set of [`Role`]s granted it. Deciding
//! which roles an actor holds is the caller's business; see
//! [`Namespace::permits`](crate::world::namespace::Namespace::permits).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Permission categories. What each one means depends on the entity kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    General,
    Read,
    Write,
    Use,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Read,
        Category::Write,
        Category::Use,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// The most powerful wizard role in a universe.
    Thaumaturge,
    Adept,
    /// The least powerful wizard role.
    Bard,
    Denizen,
    Guest,
    /// Not assignable; granted to the owner of an entity when checking its gate.
    Owner,
}

impl Role {
    pub const WIZARD_ROLES: [Role; 3] = [Role::Thaumaturge, Role::Adept, Role::Bard];
    pub const NON_GUEST_ROLES: [Role; 4] =
        [Role::Thaumaturge, Role::Adept, Role::Bard, Role::Denizen];

    pub fn is_wizard(&self) -> bool {
        Self::WIZARD_ROLES.contains(self)
    }

    /// Parse a role name, case-insensitively. `OWNER` is not assignable.
    pub fn parse_assignable(text: &str) -> Option<Role> {
        match text.trim().to_ascii_uppercase().as_str() {
            "THAUMATURGE" => Some(Role::Thaumaturge),
            "ADEPT" => Some(Role::Adept),
            "BARD" => Some(Role::Bard),
            "DENIZEN" => Some(Role::Denizen),
            "GUEST" => Some(Role::Guest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Policy {
    #[serde(default)]
    permissions: BTreeMap<Category, BTreeSet<Role>>,
}

impl Policy {
    /// A policy granting nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// GENERAL, READ and USE for non-guests; WRITE for wizards and the owner.
    pub fn default_policy() -> Self {
        let mut policy = Self::empty();
        policy.set_roles(Category::General, Role::NON_GUEST_ROLES);
        policy.set_roles(Category::Read, Role::NON_GUEST_ROLES);
        policy.set_roles(
            Category::Write,
            Role::WIZARD_ROLES.into_iter().chain([Role::Owner]),
        );
        policy.set_roles(Category::Use, Role::NON_GUEST_ROLES);
        policy
    }

    /// Every category granted to non-guests.
    pub fn open() -> Self {
        let mut policy = Self::empty();
        for category in Category::ALL {
            policy.set_roles(category, Role::NON_GUEST_ROLES);
        }
        policy
    }

    pub fn roles_for(&self, category: Category) -> BTreeSet<Role> {
        self.permissions.get(&category).cloned().unwrap_or_default()
    }

    pub fn set_roles(&mut self, category: Category, roles: impl IntoIterator<Item = Role>) {
        self.permissions.insert(category, roles.into_iter().collect());
    }

    /// Categories in which `role` is granted.
    pub fn categories_for(&self, role: Role) -> BTreeSet<Category> {
        self.permissions
            .iter()
            .filter(|(_, roles)| roles.contains(&role))
            .map(|(category, _)| *category)
            .collect()
    }

    /// True if any of `roles` is granted `category`.
    pub fn passes(&self, category: Category, roles: &BTreeSet<Role>) -> bool {
        self.permissions
            .get(&category)
            .is_some_and(|granted| !granted.is_disjoint(roles))
    }
}
