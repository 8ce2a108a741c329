//! Core data types for the Custody ledger

pub mod action;
pub mod event;
pub mod principal;
