//! Dashboard state and card rendering for Skyboard.

pub mod dashboard;
pub mod error_mapping;
pub mod presenter;
pub mod services;
pub mod view;

pub use dashboard::DashboardController;
pub use presenter::{CardHandle, CardViewState, DashboardAction, StatusClass};
pub use view::{CandidateList, DashboardView, TextView};
