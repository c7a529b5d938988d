//! Persistence layer for the batch tracker

mod repository;

pub use repository::BatchRepository;
