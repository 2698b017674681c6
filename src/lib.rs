//! Orbit Admin - content management and administration backend
//!
//! Blocks, menus, pages, reference data, users/roles/permissions and a
//! real-time chat, served as a JSON API to the admin SPA.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
