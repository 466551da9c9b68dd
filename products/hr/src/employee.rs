use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{FIELDS_REQUIRED, HrError, HrResult};

pub type EmployeeId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub salary: u64,
    pub hire_date: NaiveDate,
}

impl Employee {
    pub fn from_fields(id: EmployeeId, fields: EmployeeFields) -> Self {
        let EmployeeFields {
            name,
            email,
            position,
            department,
            salary,
            hire_date,
        } = fields;
        Self {
            id,
            name,
            email,
            position,
            department,
            salary,
            hire_date,
        }
    }

    /// Overwrites every field except the identifier.
    pub fn apply(&mut self, fields: EmployeeFields) {
        let id = self.id;
        *self = Self::from_fields(id, fields);
    }
}

/// Body of a successful delete: confirmation text plus the removed record.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeletedEmployee {
    pub message: String,
    pub employee: Employee,
}

/// Salary as it arrives over the wire. Browsers post form values as strings,
/// API clients usually send numbers.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SalaryInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SalaryInput {
    fn is_blank(&self) -> bool {
        matches!(self, SalaryInput::Text(text) if text.trim().is_empty())
    }

    /// Integer coercion: floats truncate, strings use their leading integer
    /// prefix (`"60000.50"` and `"60000 USD"` both give 60000).
    pub fn coerce(&self) -> HrResult<u64> {
        let value = match self {
            SalaryInput::Integer(value) => *value,
            SalaryInput::Float(value) if value.is_finite() => value.trunc() as i64,
            SalaryInput::Float(_) => return Err(HrError::validation("salary must be a number")),
            SalaryInput::Text(text) => leading_integer(text)
                .ok_or_else(|| HrError::validation("salary must be a number"))?,
        };
        u64::try_from(value).map_err(|_| HrError::validation("salary must not be negative"))
    }
}

impl From<u64> for SalaryInput {
    fn from(value: u64) -> Self {
        SalaryInput::Integer(value as i64)
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Write payload for create and update. Every field is optional here so a
/// missing one is reported as a validation failure rather than a parse error.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub salary: Option<SalaryInput>,
    pub hire_date: Option<String>,
}

/// The six mutable fields after boundary validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeFields {
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub salary: u64,
    pub hire_date: NaiveDate,
}

impl EmployeeInput {
    pub fn validate(self) -> HrResult<EmployeeFields> {
        let EmployeeInput {
            name: Some(name),
            email: Some(email),
            position: Some(position),
            department: Some(department),
            salary: Some(salary),
            hire_date: Some(hire_date),
        } = self
        else {
            return Err(HrError::validation(FIELDS_REQUIRED));
        };
        let texts = [&name, &email, &position, &department, &hire_date];
        if texts.iter().any(|text| text.trim().is_empty()) || salary.is_blank() {
            return Err(HrError::validation(FIELDS_REQUIRED));
        }

        let salary = salary.coerce()?;
        let hire_date = hire_date
            .trim()
            .parse::<NaiveDate>()
            .map_err(|_| HrError::validation("hireDate must be a YYYY-MM-DD date"))?;

        Ok(EmployeeFields {
            name,
            email,
            position,
            department,
            salary,
            hire_date,
        })
    }
}

impl From<&Employee> for EmployeeInput {
    fn from(employee: &Employee) -> Self {
        Self {
            name: Some(employee.name.clone()),
            email: Some(employee.email.clone()),
            position: Some(employee.position.clone()),
            department: Some(employee.department.clone()),
            salary: Some(employee.salary.into()),
            hire_date: Some(employee.hire_date.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ann() -> EmployeeInput {
        serde_json::from_value(json!({
            "name": "Ann Lee",
            "email": "ann@x.com",
            "position": "QA",
            "department": "Eng",
            "salary": 60000,
            "hireDate": "2024-01-01"
        }))
        .unwrap()
    }

    #[test]
    fn complete_input_validates() {
        let fields = ann().validate().unwrap();
        assert_eq!(fields.name, "Ann Lee");
        assert_eq!(fields.salary, 60_000);
        assert_eq!(fields.hire_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn any_missing_or_blank_field_is_rejected() {
        let cases: [fn(&mut EmployeeInput); 7] = [
            |i| i.name = None,
            |i| i.email = Some("   ".into()),
            |i| i.position = None,
            |i| i.department = Some(String::new()),
            |i| i.salary = None,
            |i| i.salary = Some(SalaryInput::Text(" ".into())),
            |i| i.hire_date = None,
        ];
        for mutate in cases {
            let mut input = ann();
            mutate(&mut input);
            assert_eq!(
                input.validate(),
                Err(HrError::Validation(FIELDS_REQUIRED.into()))
            );
        }
    }

    #[test]
    fn salary_is_coerced_to_an_integer() {
        assert_eq!(SalaryInput::Text("60000".into()).coerce(), Ok(60_000));
        assert_eq!(SalaryInput::Text(" 72000.99".into()).coerce(), Ok(72_000));
        assert_eq!(SalaryInput::Text("55000 USD".into()).coerce(), Ok(55_000));
        assert_eq!(SalaryInput::Float(41_000.7).coerce(), Ok(41_000));
        assert_eq!(SalaryInput::Integer(0).coerce(), Ok(0));
        assert!(SalaryInput::Text("lots".into()).coerce().is_err());
        assert!(SalaryInput::Integer(-1).coerce().is_err());
        assert!(SalaryInput::Text("-500".into()).coerce().is_err());
    }

    #[test]
    fn string_salary_from_a_form_post_deserializes() {
        let input: EmployeeInput = serde_json::from_value(json!({ "salary": "64000" })).unwrap();
        assert_eq!(input.salary, Some(SalaryInput::Text("64000".into())));
    }

    #[test]
    fn malformed_hire_date_is_a_validation_error() {
        let mut input = ann();
        input.hire_date = Some("01/01/2024".into());
        assert!(matches!(input.validate(), Err(HrError::Validation(_))));
    }

    #[test]
    fn wire_format_uses_camel_case_and_iso_dates() {
        let employee = Employee::from_fields(4, ann().validate().unwrap());
        let value = serde_json::to_value(&employee).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 4,
                "name": "Ann Lee",
                "email": "ann@x.com",
                "position": "QA",
                "department": "Eng",
                "salary": 60000,
                "hireDate": "2024-01-01"
            })
        );
    }

    #[test]
    fn apply_keeps_the_identifier() {
        let mut employee = Employee::from_fields(9, ann().validate().unwrap());
        let mut input = ann();
        input.name = Some("Ann Lee-Park".into());
        employee.apply(input.validate().unwrap());
        assert_eq!(employee.id, 9);
        assert_eq!(employee.name, "Ann Lee-Park");
    }
}
