//! Channel Gate
//!
//! Restricts storefront catalog requests to the sales channels a caller may
//! use. Customer groups bind to at most one sales channel; channels no group
//! binds stay open to everyone.

pub mod access;
pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
