//! servoscale-recommend — client for the remote recommendation service.
//!
//! Wraps the three remote operations the reconciliation engine depends on:
//! initial-config recommendation, anomaly detection, and anomaly recovery.
//! The [`Recommender`] trait is the seam; [`HttpRecommender`] is the
//! production implementation.

pub mod client;
pub mod error;

pub use client::{DetectParams, Envelope, HttpRecommender, Recommender};
pub use error::{RecommendError, RecommendResult};
