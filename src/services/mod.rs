pub mod dashboard;
pub mod data_loader;
pub mod navigation;
pub mod notifications;
pub mod permissions;
pub mod validation;
