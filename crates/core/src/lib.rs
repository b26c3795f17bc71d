//! # PMS Core
//!
//! Core business logic for the patient management service.
//!
//! This crate contains pure data operations:
//! - The patient record model with derived BMI and verdict ([`patient`])
//! - Partial updates ([`update`])
//! - Whole-collection persistence ([`store`])
//! - The record service tying them together ([`service`])
//!
//! **No API concerns**: HTTP routing, status codes and wire DTOs belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod service;
pub mod sort;
pub mod store;
pub mod update;
pub mod validation;

pub use config::{data_file_from_env_value, CoreConfig};
pub use constants::DEFAULT_DATA_FILE;
pub use error::{PatientError, PatientResult};
pub use patient::{NewPatient, Patient, PatientFields, PatientView, StoredRecord};
pub use pms_types::{Gender, NonEmptyText, TextError, Verdict};
pub use service::RecordService;
pub use sort::{SortField, SortOrder};
pub use store::{Collection, JsonFileStore, MemoryStore, PatientStore};
pub use update::PatientUpdate;
