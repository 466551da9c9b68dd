use chrono::NaiveDate;

use crate::{Employee, EmployeeFields, EmployeeId, EmployeeInput, HrError, HrResult};

/// Authoritative, ordered collection of employee records.
///
/// Identifiers come from a counter that only moves forward, so an id freed by
/// [`EmployeeStore::delete`] is never handed out again.
#[derive(Clone, Debug)]
pub struct EmployeeStore {
    employees: Vec<Employee>,
    next_id: EmployeeId,
}

impl Default for EmployeeStore {
    fn default() -> Self {
        Self::with_fixtures()
    }
}

impl EmployeeStore {
    pub fn empty() -> Self {
        Self {
            employees: Vec::new(),
            next_id: 1,
        }
    }

    /// Store seeded with the three demo employees (ids 1 to 3).
    pub fn with_fixtures() -> Self {
        let employees = fixtures();
        let next_id = employees.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        Self { employees, next_id }
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn next_id(&self) -> EmployeeId {
        self.next_id
    }

    pub fn list(&self) -> &[Employee] {
        &self.employees
    }

    pub fn get(&self, id: EmployeeId) -> HrResult<&Employee> {
        self.employees
            .iter()
            .find(|employee| employee.id == id)
            .ok_or(HrError::NotFound(id))
    }

    pub fn create(&mut self, input: EmployeeInput) -> HrResult<Employee> {
        let fields = input.validate()?;
        Ok(self.insert(fields))
    }

    pub fn update(&mut self, id: EmployeeId, input: EmployeeInput) -> HrResult<Employee> {
        let index = self.position(id)?;
        let fields = input.validate()?;
        let employee = &mut self.employees[index];
        employee.apply(fields);
        tracing::debug!(id, "employee updated");
        Ok(employee.clone())
    }

    pub fn delete(&mut self, id: EmployeeId) -> HrResult<Employee> {
        let index = self.position(id)?;
        let removed = self.employees.remove(index);
        tracing::debug!(id, remaining = self.employees.len(), "employee deleted");
        Ok(removed)
    }

    fn insert(&mut self, fields: EmployeeFields) -> Employee {
        let employee = Employee::from_fields(self.next_id, fields);
        self.next_id += 1;
        self.employees.push(employee.clone());
        tracing::debug!(id = employee.id, "employee created");
        employee
    }

    fn position(&self, id: EmployeeId) -> HrResult<usize> {
        self.employees
            .iter()
            .position(|employee| employee.id == id)
            .ok_or(HrError::NotFound(id))
    }
}

fn fixtures() -> Vec<Employee> {
    let seed = |id: EmployeeId,
                name: &str,
                email: &str,
                position: &str,
                department: &str,
                salary: u64,
                date: NaiveDate| {
        Employee {
            id,
            name: name.into(),
            email: email.into(),
            position: position.into(),
            department: department.into(),
            salary,
            hire_date: date,
        }
    };
    vec![
        seed(
            1,
            "John Doe",
            "john.doe@company.com",
            "Software Engineer",
            "Engineering",
            75_000,
            ymd(2023, 1, 15),
        ),
        seed(
            2,
            "Jane Smith",
            "jane.smith@company.com",
            "Product Manager",
            "Product",
            85_000,
            ymd(2022, 8, 20),
        ),
        seed(
            3,
            "Mike Johnson",
            "mike.johnson@company.com",
            "UX Designer",
            "Design",
            70_000,
            ymd(2023, 3, 10),
        ),
    ]
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
