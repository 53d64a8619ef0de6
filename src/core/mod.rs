//! Core business logic - framework-agnostic ledger operations.
//!
//! `deposit` and `withdrawal` own every change to a customer balance;
//! `assignment` decides which collector may make them.

pub mod assignment;
pub mod collector;
pub mod customer;
pub mod deposit;
pub mod feedback;
pub mod plan;
pub mod report;
pub mod schedule;
pub mod withdrawal;
