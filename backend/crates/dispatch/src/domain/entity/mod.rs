//! Entity Module

pub mod audit_record;
