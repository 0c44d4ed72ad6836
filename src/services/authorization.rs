//! Authorization evaluator
//!
//! Each action is bound to one [`Rule`] at startup. Rules are evaluated
//! per call with no decision caching; an ownership rule does exactly one
//! store read and never writes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Principal, ResourceKind, ResourceRef},
    repository::DynStore,
};

/// Actions gated by the evaluator, named as exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Me,
    UpdateProfile,
    CheckPassword,
    UpdatePassword,
    FilterBooks,
    GetAvailableBooks,
    GetBook,
    GetAuthors,
    GetLanguages,
    GetCategories,
    AddAuthor,
    GetOrder,
    GetUserOrders,
    AddBook,
    UpdateBook,
    DeleteBook,
    CreateOrder,
    CancelOrder,
    CreateCheckout,
    UpdateCheckout,
    ReturnCheckout,
}

impl Action {
    pub const ALL: [Action; 21] = [
        Action::Me,
        Action::UpdateProfile,
        Action::CheckPassword,
        Action::UpdatePassword,
        Action::FilterBooks,
        Action::GetAvailableBooks,
        Action::GetBook,
        Action::GetAuthors,
        Action::GetLanguages,
        Action::GetCategories,
        Action::AddAuthor,
        Action::GetOrder,
        Action::GetUserOrders,
        Action::AddBook,
        Action::UpdateBook,
        Action::DeleteBook,
        Action::CreateOrder,
        Action::CancelOrder,
        Action::CreateCheckout,
        Action::UpdateCheckout,
        Action::ReturnCheckout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Me => "me",
            Action::UpdateProfile => "updateProfile",
            Action::CheckPassword => "checkPassword",
            Action::UpdatePassword => "updatePassword",
            Action::FilterBooks => "filterBooks",
            Action::GetAvailableBooks => "getAvailableBooks",
            Action::GetBook => "getBook",
            Action::GetAuthors => "getAuthors",
            Action::GetLanguages => "getLanguages",
            Action::GetCategories => "getCategories",
            Action::AddAuthor => "addAuthor",
            Action::GetOrder => "getOrder",
            Action::GetUserOrders => "getUserOrders",
            Action::AddBook => "addBook",
            Action::UpdateBook => "updateBook",
            Action::DeleteBook => "deleteBook",
            Action::CreateOrder => "createOrder",
            Action::CancelOrder => "cancelOrder",
            Action::CreateCheckout => "createCheckout",
            Action::UpdateCheckout => "updateCheckout",
            Action::ReturnCheckout => "returnCheckout",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AppError::validation("action", format!("Unknown action: {}", s)))
    }
}

/// Rule predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    AuthenticatedOnly,
    IsOwner(ResourceKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Action → rule table, immutable once built
#[derive(Debug, Clone)]
pub struct RuleBindings {
    rules: HashMap<Action, Rule>,
}

impl RuleBindings {
    pub fn empty() -> Self {
        Self { rules: HashMap::new() }
    }

    pub fn bind(mut self, action: Action, rule: Rule) -> Self {
        self.rules.insert(action, rule);
        self
    }

    pub fn rule_for(&self, action: Action) -> Option<Rule> {
        self.rules.get(&action).copied()
    }
}

impl Default for RuleBindings {
    fn default() -> Self {
        use Action::*;
        use Rule::*;

        Self::empty()
            .bind(Me, AuthenticatedOnly)
            .bind(UpdateProfile, AuthenticatedOnly)
            .bind(CheckPassword, AuthenticatedOnly)
            .bind(UpdatePassword, AuthenticatedOnly)
            .bind(FilterBooks, AuthenticatedOnly)
            .bind(GetAvailableBooks, AuthenticatedOnly)
            .bind(GetBook, AuthenticatedOnly)
            .bind(GetAuthors, AuthenticatedOnly)
            .bind(GetLanguages, AuthenticatedOnly)
            .bind(GetCategories, AuthenticatedOnly)
            .bind(AddAuthor, AuthenticatedOnly)
            .bind(GetOrder, AuthenticatedOnly)
            .bind(GetUserOrders, AuthenticatedOnly)
            .bind(AddBook, AuthenticatedOnly)
            .bind(CreateOrder, AuthenticatedOnly)
            .bind(UpdateBook, IsOwner(ResourceKind::Book))
            .bind(DeleteBook, IsOwner(ResourceKind::Book))
            .bind(CancelOrder, IsOwner(ResourceKind::Order))
            .bind(CreateCheckout, IsOwner(ResourceKind::Order))
            .bind(UpdateCheckout, IsOwner(ResourceKind::Checkout))
            .bind(ReturnCheckout, IsOwner(ResourceKind::Checkout))
    }
}

#[derive(Clone)]
pub struct Authorizer {
    store: DynStore,
    bindings: Arc<RuleBindings>,
}

impl Authorizer {
    pub fn new(store: DynStore, bindings: Arc<RuleBindings>) -> Self {
        Self { store, bindings }
    }

    /// Decide whether `principal` may perform `action` on `resource`.
    ///
    /// Errors are `Unauthenticated` (no principal, checked before anything
    /// else) and `AuthorizationIndeterminate` (the ownership read failed).
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: Option<ResourceRef>,
    ) -> AppResult<Decision> {
        let Some(principal) = principal else {
            return Err(AppError::Unauthenticated(format!("{} requires authentication", action)));
        };

        let Some(rule) = self.bindings.rule_for(action) else {
            return Ok(Decision::Deny(format!("no rule bound for {}", action)));
        };

        match rule {
            Rule::AuthenticatedOnly => Ok(Decision::Allow),
            Rule::IsOwner(kind) => {
                let not_owner = || Decision::Deny(format!("{} is limited to the {} owner", action, kind));

                let Some(resource) = resource.filter(|r| r.kind == kind) else {
                    return Ok(not_owner());
                };

                let owner = self.store.owner_of(resource).await.map_err(|e| {
                    AppError::AuthorizationIndeterminate(format!("ownership of {}: {}", resource, e))
                })?;

                // Absent and foreign resources get the same answer
                match owner {
                    Some(owner_id) if owner_id == principal.user_id => Ok(Decision::Allow),
                    _ => Ok(not_owner()),
                }
            }
        }
    }

    /// `authorize`, with a denial turned into `AppError::Denied`
    pub async fn require(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: Option<ResourceRef>,
    ) -> AppResult<()> {
        match self.authorize(principal, action, resource).await? {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                tracing::warn!(
                    "Denied {} for user {:?}: {}",
                    action,
                    principal.map(|p| p.user_id),
                    reason
                );
                Err(AppError::Denied(reason))
            }
        }
    }
}
