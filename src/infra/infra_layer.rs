// The infra module contains implementations of core traits.
// Everything that touches HTTP, the console or the file system lives here.

#[path = "google/mod.rs"]
pub mod google;
