mod batch;
mod common;
mod constraints;
mod ranking;
