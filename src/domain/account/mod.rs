//! Accounts of the demo login application

mod entity;
mod repository;

pub use entity::{
    Account, ACCOUNT_ID_CLAIM, ACCOUNT_NAME_CLAIM, ACCOUNT_ROLES_CLAIM, ACCOUNT_USERNAME_CLAIM,
};
pub use repository::AccountStore;
