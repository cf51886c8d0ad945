//! State management module
//! 
//! This module handles login sessions

pub mod session;
pub mod storage;

pub use session::Session;
pub use storage::SessionStorage;
