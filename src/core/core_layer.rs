// The core module contains the auth and document logic.
// It defines ports (traits) for everything that touches the network, the
// console or the disk; the infra layer plugs real implementations in.

#[path = "auth/mod.rs"]
pub mod auth;

#[path = "docs/mod.rs"]
pub mod docs;
