//! Intent batch model and the validation pipeline

pub mod record;
pub mod validate;
