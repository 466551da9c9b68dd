use products_hr::Employee;

/// Case-insensitive substring filter over name, email, position and
/// department. A blank query keeps every record, in mirror order.
pub fn filter<'a>(employees: &'a [Employee], query: &str) -> Vec<&'a Employee> {
    let needle = query.trim().to_lowercase();
    employees
        .iter()
        .filter(|employee| needle.is_empty() || matches(employee, &needle))
        .collect()
}

/// `needle` must already be lowercased.
fn matches(employee: &Employee, needle: &str) -> bool {
    [
        &employee.name,
        &employee.email,
        &employee.position,
        &employee.department,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}
