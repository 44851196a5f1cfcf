//! Core shopdash library: session store, API gateway, analytics endpoints,
//! page models and the routing shell.

pub mod api;
pub mod config;
pub mod gateway;
pub mod pages;
pub mod session;
pub mod shell;
pub mod storage;
