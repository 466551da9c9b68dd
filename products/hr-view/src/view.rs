use chrono::NaiveDate;
use products_hr::{Employee, EmployeeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    pub id: EmployeeId,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyState {
    /// The mirror itself is empty.
    FirstRun,
    /// The mirror has records but the search hides all of them.
    NoMatches,
}

impl EmptyState {
    pub fn title(self) -> &'static str {
        "No employees found"
    }

    pub fn hint(self) -> &'static str {
        match self {
            EmptyState::FirstRun => "Get started by adding your first employee!",
            EmptyState::NoMatches => "No employees match your search criteria.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListView {
    Cards(Vec<Card>),
    Empty(EmptyState),
}

impl ListView {
    pub fn render(mirror: &[Employee], visible: &[&Employee]) -> Self {
        if visible.is_empty() {
            let state = if mirror.is_empty() {
                EmptyState::FirstRun
            } else {
                EmptyState::NoMatches
            };
            return ListView::Empty(state);
        }
        ListView::Cards(
            visible
                .iter()
                .map(|employee| Card {
                    id: employee.id,
                    name: employee.name.clone(),
                })
                .collect(),
        )
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            ListView::Cards(cards) => cards,
            ListView::Empty(_) => &[],
        }
    }
}

/// Every field of one record, formatted for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailsView {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub salary: String,
    pub hire_date: String,
}

impl From<&Employee> for DetailsView {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            salary: format_salary(employee.salary),
            hire_date: format_date(employee.hire_date),
        }
    }
}

/// `75000` -> `$75,000`.
pub fn format_salary(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    grouped.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `2023-01-15` -> `January 15, 2023`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
