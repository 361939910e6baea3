pub mod accounts;
pub mod checkout;
pub mod console;
pub mod dashboard;
pub mod gst;
pub mod pagination;
pub mod requests;
pub mod section;
pub mod services;

pub use crate::domain::model;
pub use crate::domain::ports::{ConfigProvider, Screen, Storage, View};
pub use crate::utils::error::Result;
