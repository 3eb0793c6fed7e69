//! # Route Modules
//!
//! | Prefix                          | Module       | Backend           |
//! |---------------------------------|--------------|-------------------|
//! | `/user-management/company/*`    | [`company`]  | directory         |
//! | `/user-management/user/*`       | [`user`]     | directory, incident-query |
//! | `/user-management`, `/health`, `/db-test`, `/metrics` | [`ops`] | none |

pub mod company;
pub mod ops;
pub mod user;
