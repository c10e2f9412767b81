#![deny(dead_code)]
#![deny(unused_imports)]

pub mod advice;
pub mod applicant;
pub mod batch;
pub mod dashboard;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod rates;
pub mod report;
pub mod settings;
pub mod states;
