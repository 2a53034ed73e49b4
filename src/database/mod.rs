mod memory;
mod mysql_store;
mod table;

pub use memory::MemoryStore;
pub use mysql_store::MysqlStore;

use crate::{
    errors::Result,
    pages::func::{
        customer::{activity::Activity, Customer, CustomerContact, CustomerNote},
        estimation::Estimation,
        job::JobEvent,
        order::Order,
        tracking::TrackedOrder,
    },
};

pub struct Database;
impl Database {
    /// MySQL error code for a primary key clash.
    pub const DUPLICATE_KEY_ERROR_CODE: u16 = 1062;
}

/// Persistence used by every page. Lists come back in display order:
/// customers and orders newest first, activities by start time descending,
/// notes and job events newest first.
///
/// Writes are last-write-wins; nothing is versioned.
pub trait Store: Send + Sync {
    fn insert_customer(&self, customer: &Customer) -> Result<()>;
    fn insert_contacts(&self, contacts: &[CustomerContact]) -> Result<()>;
    fn customers(&self) -> Result<Vec<Customer>>;
    fn customer(&self, id: &str) -> Result<Option<Customer>>;
    fn update_customer(&self, customer: &Customer) -> Result<()>;
    fn contacts(&self, customer_id: &str) -> Result<Vec<CustomerContact>>;

    fn activities(&self, customer_id: &str) -> Result<Vec<Activity>>;
    fn activity(&self, id: &str) -> Result<Option<Activity>>;
    fn insert_activity(&self, activity: &Activity) -> Result<()>;
    fn update_activity(&self, activity: &Activity) -> Result<()>;
    /// `false` when no activity had this id.
    fn delete_activity(&self, id: &str) -> Result<bool>;

    fn notes(&self, customer_id: &str) -> Result<Vec<CustomerNote>>;
    fn insert_note(&self, note: &CustomerNote) -> Result<()>;

    /// Stores the order with its products and bumps the customer's totals.
    fn insert_order(&self, order: &Order) -> Result<()>;
    fn orders(&self) -> Result<Vec<Order>>;
    fn customer_orders(&self, customer_id: &str) -> Result<Vec<Order>>;

    fn tracked_orders(&self) -> Result<Vec<TrackedOrder>>;

    fn estimations(&self) -> Result<Vec<Estimation>>;
    fn insert_estimation(&self, estimation: &Estimation) -> Result<()>;

    fn insert_job_event(&self, event: &JobEvent) -> Result<()>;
    fn job_events(&self, job_id: &str) -> Result<Vec<JobEvent>>;
}

/// Runs `$fn(conn, params)` between `begin` and `commit`, rolling back when it
/// returns an error.
#[macro_export]
macro_rules! commit_or_rollback {
    ($fn:expr, $conn:expr, $params:expr) => {{
        mysql::prelude::Queryable::query_drop($conn, "begin")?;
        match $fn($conn, $params) {
            Ok(ok) => {
                mysql::prelude::Queryable::query_drop($conn, "commit")?;
                Ok(ok)
            }
            Err(e) => {
                mysql::prelude::Queryable::query_drop($conn, "rollback")?;
                Err(e)
            }
        }
    }};
}
