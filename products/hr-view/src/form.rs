use chrono::NaiveDate;
use once_cell::sync::Lazy;
use products_hr::{Employee, EmployeeInput, SalaryInput};
use regex::Regex;
use thiserror::Error;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Raw text of the add/edit form, exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmployeeForm {
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub salary: String,
    pub hire_date: String,
}

impl EmployeeForm {
    /// Empty add form with the hire date preset to `today`.
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            hire_date: today.to_string(),
            ..Self::default()
        }
    }

    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            name: employee.name.clone(),
            email: employee.email.clone(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            salary: employee.salary.to_string(),
            hire_date: employee.hire_date.to_string(),
        }
    }

    /// Client-side checks run before anything is sent. The salary goes out
    /// as text, the way a browser form posts it.
    pub fn validate(&self) -> Result<EmployeeInput, FormError> {
        let fields = [
            &self.name,
            &self.email,
            &self.position,
            &self.department,
            &self.salary,
            &self.hire_date,
        ]
        .map(|value| value.trim().to_string());
        if fields.iter().any(String::is_empty) {
            return Err(FormError::MissingFields);
        }
        let [name, email, position, department, salary, hire_date] = fields;
        if !is_valid_email(&email) {
            return Err(FormError::InvalidEmail);
        }
        Ok(EmployeeInput {
            name: Some(name),
            email: Some(email),
            position: Some(position),
            department: Some(department),
            salary: Some(SalaryInput::Text(salary)),
            hire_date: Some(hire_date),
        })
    }
}
