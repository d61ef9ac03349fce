// src/network/mod.rs
pub mod contact;

pub use contact::{ContactCredentials, RemoteContact, ReqwestContactClient};
