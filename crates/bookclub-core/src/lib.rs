//! Core types and derived-state components for the book club platform.
//!
//! This crate is free of HTTP and database dependencies. It owns the domain
//! model, the [`store::ClubStore`] trait, and the four components that keep
//! denormalised state correct under concurrent writers:
//!
//! - [`rating::RatingAggregator`]: book rating aggregates
//! - [`likes::LikeToggler`]: review like-sets and their counts
//! - [`attendance::AttendanceManager`]: meeting seats and status
//! - [`feed::ActivityComposer`]: the merged activity feed

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod activity;
pub mod attendance;
pub mod book;
pub mod error;
pub mod feed;
pub mod likes;
pub mod meeting;
pub mod member;
pub mod rating;
pub mod reading;
pub mod review;
pub mod store;

pub use error::{Error, ErrorKind, Result};
