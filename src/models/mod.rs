//! Data models for Bookshare

pub mod book;
pub mod checkout;
pub mod enums;
pub mod order;
pub mod reference;
pub mod resource;
pub mod user;

// Re-export commonly used types
pub use book::{Book, CreateBook, UpdateBook};
pub use checkout::{Checkout, CreateCheckout, NewCheckout, UpdateCheckout};
pub use enums::{BookStatus, OrderStatus};
pub use order::Order;
pub use reference::{Author, Category, CreateAuthor, Language};
pub use resource::{ResourceKind, ResourceRef};
pub use user::{ChangePassword, CreateAccount, PasswordCheck, Principal, UpdateProfile, User, UserClaims};
