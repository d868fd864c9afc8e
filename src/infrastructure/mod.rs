//! Infrastructure layer - key stores, token signing and verification, accounts

pub mod account;
pub mod auth;
pub mod keygen;
pub mod keystore;
pub mod logging;
