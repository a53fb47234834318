//! Review Desk Common Library
//!
//! CLIとレビューUIで共有される型とユーティリティ

pub mod config;
pub mod error;
pub mod flagged;
pub mod review;
pub mod types;
pub mod user;

pub use config::SystemConfig;
pub use error::{Error, Result};
pub use flagged::{FlagRecord, FlaggedFilters, FlaggedItem, FlaggedPage};
pub use review::{FlagReason, FlagRequest, ReviewAction, ReviewOutcome, ReviewSubmission};
pub use types::{
    coerce_edit_value, Content, DatasetTypeSchema, FieldSchema, Modality, NextItemResponse,
    ReviewState, ReviewStatus, ReviewWidget, WorkItem,
};
pub use user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, PayoutRequest, RegisterRequest,
    ReviewerStats, UserProfile,
};
