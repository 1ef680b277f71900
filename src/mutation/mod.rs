//! Mutation infrastructure: sparse patches, writers, step-local ledgers

pub mod ledger;
pub mod patch;
pub mod writer;
