//! HR module: employee records and the record store that owns them.

pub mod employee;
pub mod store;

use thiserror::Error;

pub use employee::{
    DeletedEmployee, Employee, EmployeeFields, EmployeeId, EmployeeInput, SalaryInput,
};
pub use store::EmployeeStore;

pub const FIELDS_REQUIRED: &str = "All fields are required";
pub const EMPLOYEE_NOT_FOUND: &str = "Employee not found";
pub const EMPLOYEE_DELETED: &str = "Employee deleted successfully";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HrError {
    #[error("{0}")]
    Validation(String),
    #[error("Employee not found")]
    NotFound(EmployeeId),
}

impl HrError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type HrResult<T> = Result<T, HrError>;
