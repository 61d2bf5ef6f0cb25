//! Input predicates shared by all services.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use model::{CATEGORY_COUNT, OrderStatus, OrderedTask, Task, WorkerRole};
use regex::Regex;
use uuid::Uuid;

pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
}

pub fn valid_price(price: f64) -> bool {
    price > 0.0
}

pub fn valid_category(category: i32) -> bool {
    (1..=CATEGORY_COUNT).contains(&category)
}

/// Accepts `local@domain` with an optional display name, e.g. `Ivan <ivan@mail.ru>`.
pub fn valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let email = email.trim();
    let address = match email.rsplit_once('<') {
        Some((_, rest)) => match rest.strip_suffix('>') {
            Some(address) => address,
            None => return false,
        },
        None => email,
    };
    let regex = EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@<>]+@[^\s@<>]+$").expect("email pattern"));
    regex.is_match(address)
}

pub fn valid_address(address: &str) -> bool {
    !address.is_empty()
}

/// `+` followed by a 1-3 digit country code and a 10 digit number.
pub fn valid_phone_number(phone_number: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| Regex::new(r"^\+\d{1,3}\d{10}$").expect("phone pattern"));
    regex.is_match(phone_number)
}

/// At least 8 characters with at least one Latin letter and one digit.
pub fn valid_password(password: &str) -> bool {
    static LETTER_REGEX: OnceLock<Regex> = OnceLock::new();
    static DIGIT_REGEX: OnceLock<Regex> = OnceLock::new();
    let letter = LETTER_REGEX.get_or_init(|| Regex::new("[a-zA-Z]").expect("letter pattern"));
    let digit = DIGIT_REGEX.get_or_init(|| Regex::new("[0-9]").expect("digit pattern"));
    password.len() >= 8 && letter.is_match(password) && digit.is_match(password)
}

pub fn valid_role(role: i32) -> bool {
    WorkerRole::from_code(role).is_some()
}

pub fn valid_deadline(deadline: DateTime<Utc>) -> bool {
    deadline > Utc::now()
}

pub fn valid_tasks_number(tasks: &[OrderedTask]) -> bool {
    !tasks.is_empty()
}

pub fn valid_status(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::New | OrderStatus::InProgress | OrderStatus::Completed | OrderStatus::Cancelled
    )
}

pub fn valid_rate(rate: i32) -> bool {
    (0..=5).contains(&rate)
}

pub fn task_is_attached_to_order(task_id: Uuid, tasks: &[Task]) -> bool {
    tasks.iter().any(|t| t.id == task_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_phone_number() {
        assert!(valid_phone_number("+79991234567"));
        assert!(valid_phone_number("+3801234567890"));
        assert!(!valid_phone_number("89991234567"));
        assert!(!valid_phone_number("+7999123456"));
        assert!(!valid_phone_number("+7999123456a"));
    }

    #[test]
    fn test_password() {
        assert!(valid_password("admin123"));
        assert!(!valid_password("admin12"));
        assert!(!valid_password("12345678"));
        assert!(!valid_password("abcdefgh"));
        assert!(!valid_password("пароль123"));
    }

    #[test]
    fn test_email() {
        assert!(valid_email("default@admin.com"));
        assert!(valid_email("Ivan Ivanov <ivan@mail.ru>"));
        assert!(!valid_email("ivan.mail.ru"));
        assert!(!valid_email("ivan@"));
        assert!(!valid_email(""));
        // Quoted local parts are outside the accepted syntax.
        assert!(!valid_email("\"a b\"@c"));
    }

    #[test]
    fn test_ranges() {
        assert!(valid_category(1) && valid_category(8));
        assert!(!valid_category(0) && !valid_category(9));
        assert!(valid_role(1) && valid_role(2) && !valid_role(3));
        assert!(valid_rate(0) && valid_rate(5));
        assert!(!valid_rate(-1) && !valid_rate(6));
        assert!(valid_price(0.01) && !valid_price(0.0));
    }

    #[test]
    fn test_status() {
        assert!(!valid_status(OrderStatus::NoStatus));
        assert!(OrderStatus::ALL.iter().skip(1).all(|s| valid_status(*s)));
    }

    #[test]
    fn test_deadline() {
        assert!(valid_deadline(Utc::now() + Duration::hours(1)));
        assert!(!valid_deadline(Utc::now() - Duration::seconds(1)));
    }

    #[test]
    fn test_task_is_attached() {
        let task = Task::new("Windows", 10.0, 3);
        let other = Task::new("Floors", 10.0, 7);
        assert!(task_is_attached_to_order(task.id, std::slice::from_ref(&task)));
        assert!(!task_is_attached_to_order(other.id, &[task]));
        assert!(!valid_tasks_number(&[]));
    }
}
