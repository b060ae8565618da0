//! SMS Portal - client for the Student Management System backend
//!
//! Keeps the signed-in session, attaches bearer tokens to every backend call
//! and renews an expired access token once before giving up and asking the
//! user to sign in again. Builds natively (reqwest, file-backed session) or
//! for the browser (gloo-net, localStorage) via the `native` / `web` features.

pub mod app;
pub mod core;
