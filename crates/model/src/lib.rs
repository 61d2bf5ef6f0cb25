use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// OrderStatus — стадия жизненного цикла заказа.
///
/// `NoStatus < New < InProgress < Completed`; `Cancelled` is terminal and does
/// not take part in that order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    NoStatus,
    New,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::NoStatus,
        OrderStatus::New,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Numeric code as stored in the `orders.status` column.
    pub fn code(self) -> i32 {
        match self {
            OrderStatus::NoStatus => 0,
            OrderStatus::New => 1,
            OrderStatus::InProgress => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::NoStatus => "Undefined",
            OrderStatus::New => "New",
            OrderStatus::InProgress => "In progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Completed and cancelled orders are the only ones that may carry a rate.
    pub fn is_finished(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// True when moving from `current` to `self` goes backwards in the natural
    /// order. Transitions involving `Cancelled` are never regressions, except
    /// leaving it.
    pub fn is_regression_from(self, current: OrderStatus) -> bool {
        match (current, self) {
            (OrderStatus::Cancelled, next) => next != OrderStatus::Cancelled,
            _ => matches!(self.partial_cmp(&current), Some(Ordering::Less)),
        }
    }
}

impl PartialOrd for OrderStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (a, b) if a == b => Some(Ordering::Equal),
            (OrderStatus::Cancelled, _) | (_, OrderStatus::Cancelled) => None,
            (a, b) => a.code().partial_cmp(&b.code()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order — заказ клиента на одну или несколько услуг уборки.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    /// `None` while no worker is assigned.
    pub worker_id: Option<Uuid>,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub address: String,
    pub creation_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub rate: i32,
}

impl Order {
    /// A fresh order as the service builds it before persisting.
    pub fn new(user_id: Uuid, address: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            worker_id: None,
            user_id,
            status: OrderStatus::New,
            address: address.into(),
            creation_date: Utc::now(),
            deadline,
            rate: 0,
        }
    }
}

/// Number of task categories; valid category codes are `1..=CATEGORY_COUNT`.
pub const CATEGORY_COUNT: i32 = 8;

const TASK_CATEGORIES: [&str; CATEGORY_COUNT as usize] = [
    "General cleaning",
    "Post-construction cleaning",
    "Window washing",
    "Daily office cleaning",
    "Maintenance cleaning",
    "Carpet and furniture dry cleaning",
    "Hard floor care",
    "Deep eco cleaning",
];

/// Human label of a task category code.
pub fn category_name(category: i32) -> &'static str {
    usize::try_from(category - 1)
        .ok()
        .and_then(|idx| TASK_CATEGORIES.get(idx))
        .copied()
        .unwrap_or("Unknown category")
}

/// Task — позиция прайс-листа.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub price_per_single: f64,
    pub category: i32,
}

impl Task {
    pub fn new(name: impl Into<String>, price_per_single: f64, category: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price_per_single,
            category,
        }
    }

    pub fn category_name(&self) -> &'static str {
        category_name(self.category)
    }
}

/// OrderedTask — задача в составе заказа с количеством.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderedTask {
    pub task: Task,
    pub quantity: i32,
}

/// Quantity given to a task attached to an existing order.
pub const DEFAULT_TASK_QUANTITY: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// User — клиент.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    /// Password hash, never the plaintext.
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkerRole {
    Manager,
    Master,
}

impl WorkerRole {
    pub fn code(self) -> i32 {
        match self {
            WorkerRole::Manager => 1,
            WorkerRole::Master => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(WorkerRole::Manager),
            2 => Some(WorkerRole::Master),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkerRole::Manager => "Manager",
            WorkerRole::Master => "Master",
        }
    }
}

/// Worker — сотрудник (менеджер или мастер).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    pub role: i32,
    #[serde(skip_serializing)]
    pub password: String,
}

impl Worker {
    pub fn role(&self) -> Option<WorkerRole> {
        WorkerRole::from_code(self.role)
    }

    pub fn display_role(&self) -> &'static str {
        self.role().map(WorkerRole::label).unwrap_or("")
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

/// Condition on a nullable order reference (`worker_id` / `user_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefFilter {
    Null,
    NotNull,
    /// Equal to one of `ids`, or unset when `or_null` is true.
    AnyOf { ids: Vec<Uuid>, or_null: bool },
}

impl RefFilter {
    pub fn matches(&self, value: Option<Uuid>) -> bool {
        match self {
            RefFilter::Null => value.is_none(),
            RefFilter::NotNull => value.is_some(),
            RefFilter::AnyOf { ids, or_null } => match value {
                Some(id) => ids.contains(&id),
                None => *or_null,
            },
        }
    }

    fn parse(raw: &str) -> Result<Self, FilterParseError> {
        match raw.trim() {
            "null" => return Ok(RefFilter::Null),
            "not null" => return Ok(RefFilter::NotNull),
            _ => {}
        }
        let mut ids = Vec::new();
        let mut or_null = false;
        for part in raw.split(',').map(str::trim) {
            if part == "null" {
                or_null = true;
            } else {
                let id = Uuid::parse_str(part)
                    .map_err(|_| FilterParseError::InvalidValue(part.to_string()))?;
                ids.push(id);
            }
        }
        Ok(RefFilter::AnyOf { ids, or_null })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("unknown filter key '{0}'")]
    UnknownKey(String),
    #[error("invalid filter value '{0}'")]
    InvalidValue(String),
}

/// OrderFilter — типизированные условия выборки заказов.
///
/// Empty conditions match everything; all set conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Any of these statuses; empty means any status.
    pub statuses: Vec<OrderStatus>,
    pub worker: Option<RefFilter>,
    pub user: Option<RefFilter>,
}

impl OrderFilter {
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = OrderStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_worker(mut self, worker: RefFilter) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_user(mut self, user: RefFilter) -> Self {
        self.user = Some(user);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && self.worker.as_ref().is_none_or(|f| f.matches(order.worker_id))
            && self
                .user
                .as_ref()
                .is_none_or(|f| f.matches(Some(order.user_id)))
    }

    /// Builds a filter from the string parameters used by web forms:
    /// `status` takes a comma-separated list of codes, `worker_id` and
    /// `user_id` take `null`, `not null` or a comma-separated list of ids that
    /// may include `null`.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FilterParseError> {
        let mut filter = OrderFilter::default();
        for (key, value) in params {
            match key.as_str() {
                "status" => {
                    for part in value.split(',').map(str::trim) {
                        let status = part
                            .parse::<i32>()
                            .ok()
                            .and_then(OrderStatus::from_code)
                            .ok_or_else(|| FilterParseError::InvalidValue(part.to_string()))?;
                        filter.statuses.push(status);
                    }
                }
                "worker_id" => filter.worker = Some(RefFilter::parse(value)?),
                "user_id" => filter.user = Some(RefFilter::parse(value)?),
                other => return Err(FilterParseError::UnknownKey(other.to_string())),
            }
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_order() -> Order {
        Order::new(Uuid::new_v4(), "123 Main St", Utc::now() + Duration::days(1))
    }

    #[test]
    fn test_deserialize_task_from_json() {
        let json = r#"
        {
           "id": "6a2f41a3-c54c-fce8-32d2-0324e1c32e22",
           "name": "Window washing, per window",
           "price_per_single": 150.5,
           "category": 3
        }
        "#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.name, "Window washing, per window");
        assert_eq!(task.price_per_single, 150.5);
        assert_eq!(task.category_name(), "Window washing");
    }

    #[test]
    fn test_order_json_keeps_dates() {
        let mut order = sample_order();
        order.deadline = Utc.with_ymd_and_hms(2030, 1, 2, 10, 0, 0).unwrap();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back.deadline.to_rfc3339(), "2030-01-02T10:00:00+00:00");
        assert_eq!(back.status, OrderStatus::New);
    }

    #[test]
    fn test_new_order_defaults() {
        let order = sample_order();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.rate, 0);
        assert!(order.worker_id.is_none());
    }

    #[test]
    fn test_status_codes() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code(5), None);
        assert_eq!(OrderStatus::from_code(-1), None);
    }

    #[test]
    fn test_status_ordering() {
        assert!(OrderStatus::NoStatus < OrderStatus::New);
        assert!(OrderStatus::New < OrderStatus::InProgress);
        assert!(OrderStatus::InProgress < OrderStatus::Completed);
        assert_eq!(OrderStatus::Cancelled.partial_cmp(&OrderStatus::New), None);
        assert_eq!(OrderStatus::Completed.partial_cmp(&OrderStatus::Cancelled), None);
        assert_eq!(
            OrderStatus::Cancelled.partial_cmp(&OrderStatus::Cancelled),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_status_regression() {
        assert!(OrderStatus::New.is_regression_from(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.is_regression_from(OrderStatus::New));
        assert!(!OrderStatus::Cancelled.is_regression_from(OrderStatus::InProgress));
        assert!(OrderStatus::New.is_regression_from(OrderStatus::Cancelled));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(category_name(1), "General cleaning");
        assert_eq!(category_name(8), "Deep eco cleaning");
        assert_eq!(category_name(0), "Unknown category");
        assert_eq!(category_name(9), "Unknown category");
    }

    #[test]
    fn test_worker_role_helpers() {
        let worker = Worker {
            id: Uuid::new_v4(),
            name: "Anna".into(),
            surname: "Petrova".into(),
            address: "Lenina 1".into(),
            phone_number: "+79990001122".into(),
            email: "anna@example.com".into(),
            role: 2,
            password: String::new(),
        };
        assert_eq!(worker.role(), Some(WorkerRole::Master));
        assert_eq!(worker.display_role(), "Master");
        assert_eq!(worker.full_name(), "Anna Petrova");
    }

    #[test]
    fn test_filter_matches() {
        let worker = Uuid::new_v4();
        let mut order = sample_order();

        let unassigned = OrderFilter::default().with_worker(RefFilter::Null);
        assert!(unassigned.matches(&order));

        order.worker_id = Some(worker);
        assert!(!unassigned.matches(&order));

        let active = OrderFilter::default()
            .with_statuses([OrderStatus::New, OrderStatus::InProgress])
            .with_worker(RefFilter::AnyOf { ids: vec![worker], or_null: true });
        assert!(active.matches(&order));

        order.status = OrderStatus::Completed;
        assert!(!active.matches(&order));
    }

    #[test]
    fn test_filter_from_params() {
        let worker = Uuid::new_v4();
        let params = HashMap::from([
            ("status".to_string(), "1,2".to_string()),
            ("worker_id".to_string(), format!("null,{worker}")),
            ("user_id".to_string(), "not null".to_string()),
        ]);
        let filter = OrderFilter::from_params(&params).unwrap();
        assert_eq!(filter.statuses, vec![OrderStatus::New, OrderStatus::InProgress]);
        assert_eq!(
            filter.worker,
            Some(RefFilter::AnyOf { ids: vec![worker], or_null: true })
        );
        assert_eq!(filter.user, Some(RefFilter::NotNull));
    }

    #[test]
    fn test_filter_from_params_rejects_garbage() {
        let params = HashMap::from([("status".to_string(), "7".to_string())]);
        assert!(matches!(
            OrderFilter::from_params(&params),
            Err(FilterParseError::InvalidValue(_))
        ));

        let params = HashMap::from([("address".to_string(), "x".to_string())]);
        assert!(matches!(
            OrderFilter::from_params(&params),
            Err(FilterParseError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_filter_parse_error_display() {
        assert_eq!(
            FilterParseError::UnknownKey("address".into()).to_string(),
            "unknown filter key 'address'"
        );
        assert_eq!(
            FilterParseError::InvalidValue("7".into()).to_string(),
            "invalid filter value '7'"
        );
    }
}
