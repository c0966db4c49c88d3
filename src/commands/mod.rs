pub mod compress;
pub mod info;
pub mod remove;
pub mod unlock;
