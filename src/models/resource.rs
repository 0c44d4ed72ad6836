//! References to ownable resources, used by authorization rules

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Book,
    Order,
    Checkout,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Book => "book",
            ResourceKind::Order => "order",
            ResourceKind::Checkout => "checkout",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: i32,
}

impl ResourceRef {
    pub fn book(id: i32) -> Self {
        Self { kind: ResourceKind::Book, id }
    }

    pub fn order(id: i32) -> Self {
        Self { kind: ResourceKind::Order, id }
    }

    pub fn checkout(id: i32) -> Self {
        Self { kind: ResourceKind::Checkout, id }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
