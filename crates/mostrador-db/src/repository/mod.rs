//! # Repository Module
//!
//! One repository per aggregate. Each holds a cloned pool handle and is
//! cheap to create from [`Database`](crate::pool::Database) accessors.

pub mod audit;
pub mod cash_count;
pub mod employee;
pub mod expense;
pub mod product;
pub mod report;
pub mod sale;
pub mod shift;
pub mod stock;
