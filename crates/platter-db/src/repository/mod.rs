//! # Repository Module
//!
//! Database repository implementations for Platter.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two ways into every repository                                         │
//! │                                                                         │
//! │  db.coupons().find_by_code("SPRING20")      ← methods on the pool       │
//! │                                                                         │
//! │  CouponRepository::decrement(&mut tx, ..)   ← associated fns taking a   │
//! │  WarehouseRepository::fetch(&mut *tx, ..)     connection, so they run   │
//! │                                               inside the checkout       │
//! │                                               transaction               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - Users and addresses
//! - [`CatalogRepository`](catalog::CatalogRepository) - Dishes, options, offers, recipes
//! - [`WarehouseRepository`](warehouse::WarehouseRepository) - Versioned stock rows
//! - [`CouponRepository`](coupon::CouponRepository) - Coupons and usages
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, options

pub mod catalog;
pub mod coupon;
pub mod customer;
pub mod order;
pub mod warehouse;
