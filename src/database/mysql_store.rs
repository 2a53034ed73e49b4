use std::collections::HashMap;

use mysql::{params, prelude::Queryable, Pool, PooledConn};
use mysql_common::prelude::FromRow;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    commit_or_rollback,
    errors::{Error, Result},
    pages::func::{
        customer::{activity::Activity, Customer, CustomerContact, CustomerNote},
        estimation::Estimation,
        job::JobEvent,
        order::{Order, StagedProduct},
        tracking::TrackedOrder,
    },
};

use super::{table::Table, Database, Store};

/// Reads an enum stored under its serde name.
fn from_text<T: DeserializeOwned>(text: String) -> Result<T> {
    serde_json::from_value(Value::String(text))
        .map_err(|e| Error::Row(format!("unexpected stored value: {e}")))
}

#[derive(FromRow)]
struct CustomerRecord {
    id: String,
    company_name: String,
    contact_name: String,
    phone_numbers: String,
    emails: String,
    line_id: Option<String>,
    customer_type: Option<String>,
    business_type: Option<String>,
    province: Option<String>,
    address: Option<String>,
    tax_id: Option<String>,
    presentation_status: Option<String>,
    contact_count: u32,
    last_contact_date: Option<String>,
    interested_products: Option<String>,
    responsible_person: Option<String>,
    customer_status: String,
    how_found_us: Option<String>,
    other_channel: Option<String>,
    notes: Option<String>,
    total_orders: u32,
    total_value: f64,
    created_at: String,
}

impl TryFrom<CustomerRecord> for Customer {
    type Error = Error;

    fn try_from(r: CustomerRecord) -> Result<Self> {
        Ok(Customer {
            id: r.id,
            company_name: r.company_name,
            contact_name: r.contact_name,
            phone_numbers: serde_json::from_str(&r.phone_numbers)?,
            emails: serde_json::from_str(&r.emails)?,
            line_id: r.line_id,
            customer_type: r.customer_type,
            business_type: r.business_type,
            province: r.province,
            address: r.address,
            tax_id: r.tax_id,
            presentation_status: r.presentation_status,
            contact_count: r.contact_count,
            last_contact_date: r.last_contact_date,
            interested_products: r.interested_products,
            responsible_person: r.responsible_person,
            customer_status: r.customer_status.parse()?,
            how_found_us: r.how_found_us,
            other_channel: r.other_channel,
            notes: r.notes,
            total_orders: r.total_orders,
            total_value: r.total_value,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct OrderRecord {
    id: String,
    draft_id: String,
    created_at: String,
    customer_id: Option<String>,
    fields: String,
    delivery: String,
    action: String,
}

#[derive(FromRow)]
struct ProductRecord {
    order_id: String,
    id: u64,
    product_type: String,
    material: Option<String>,
    details: String,
}

impl TryFrom<ProductRecord> for StagedProduct {
    type Error = Error;

    fn try_from(r: ProductRecord) -> Result<Self> {
        Ok(StagedProduct {
            id: r.id,
            product_type: r.product_type.parse()?,
            material: r.material,
            details: serde_json::from_str(&r.details)?,
        })
    }
}

#[derive(FromRow)]
struct TrackedRecord {
    id: String,
    customer: String,
    items: String,
    order_date: String,
    due_date: String,
    status: String,
    value: f64,
    progress: u8,
    kind: String,
    location: String,
    department: Option<String>,
}

impl TryFrom<TrackedRecord> for TrackedOrder {
    type Error = Error;

    fn try_from(r: TrackedRecord) -> Result<Self> {
        Ok(TrackedOrder {
            id: r.id,
            customer: r.customer,
            items: r.items,
            order_date: r.order_date,
            due_date: r.due_date,
            status: r.status,
            value: r.value,
            progress: r.progress,
            kind: from_text(r.kind)?,
            location: from_text(r.location)?,
            department: r.department.map(|d| d.parse()).transpose()?,
        })
    }
}

#[derive(FromRow)]
struct BodyRecord {
    body: String,
}

#[derive(FromRow)]
struct EventRecord {
    id: String,
    job_id: String,
    kind: String,
    body: String,
    created_at: String,
}

pub struct MysqlStore {
    pool: Pool,
}

impl MysqlStore {
    /// Connects and creates any missing table.
    pub fn new(url: &str) -> Result<Self> {
        let pool = Pool::new(url)?;
        let store = Self { pool };
        let mut conn = store.conn()?;
        for sql in Table::ALL {
            conn.query_drop(sql)?;
        }
        info!("MySQL tables ready");
        Ok(store)
    }

    fn conn(&self) -> Result<PooledConn> {
        Ok(self.pool.get_conn()?)
    }

    fn load_orders(&self, customer_id: Option<&str>) -> Result<Vec<Order>> {
        let mut conn = self.conn()?;
        let (filter, params) = match customer_id {
            Some(id) => ("WHERE customer_id = :customer_id", params! { "customer_id" => id }),
            None => ("", mysql::Params::Empty),
        };
        let orders: Vec<OrderRecord> = conn.exec(
            format!("SELECT id, draft_id, created_at, customer_id, fields, delivery, action FROM orders {filter} ORDER BY created_at DESC"),
            params.clone(),
        )?;
        let products: Vec<ProductRecord> = conn.exec(
            format!("SELECT order_id, id, product_type, material, details FROM order_products WHERE order_id IN (SELECT id FROM orders {filter}) ORDER BY order_id, position"),
            params,
        )?;
        let mut by_order: HashMap<String, Vec<StagedProduct>> = HashMap::new();
        for p in products {
            by_order
                .entry(p.order_id.clone())
                .or_default()
                .push(p.try_into()?);
        }
        orders
            .into_iter()
            .map(|o| -> Result<Order> {
                Ok(Order {
                    products: by_order.remove(&o.id).unwrap_or_default(),
                    id: o.id,
                    draft_id: o.draft_id,
                    created_at: o.created_at,
                    customer_id: o.customer_id,
                    fields: serde_json::from_str(&o.fields)?,
                    delivery: serde_json::from_str(&o.delivery)?,
                    action: o.action.parse()?,
                })
            })
            .collect()
    }
}

fn customer_params(c: &Customer) -> Result<mysql::Params> {
    Ok(params! {
        "id" => &c.id,
        "company_name" => &c.company_name,
        "contact_name" => &c.contact_name,
        "phone_numbers" => serde_json::to_string(&c.phone_numbers)?,
        "emails" => serde_json::to_string(&c.emails)?,
        "line_id" => &c.line_id,
        "customer_type" => &c.customer_type,
        "business_type" => &c.business_type,
        "province" => &c.province,
        "address" => &c.address,
        "tax_id" => &c.tax_id,
        "presentation_status" => &c.presentation_status,
        "contact_count" => c.contact_count,
        "last_contact_date" => &c.last_contact_date,
        "interested_products" => &c.interested_products,
        "responsible_person" => &c.responsible_person,
        "customer_status" => c.customer_status.as_str(),
        "how_found_us" => &c.how_found_us,
        "other_channel" => &c.other_channel,
        "notes" => &c.notes,
        "total_orders" => c.total_orders,
        "total_value" => c.total_value,
        "created_at" => &c.created_at,
    })
}

fn activity_params(a: &Activity) -> mysql::Params {
    params! {
        "id" => &a.id,
        "customer_id" => &a.customer_id,
        "activity_type" => &a.activity_type,
        "title" => &a.title,
        "description" => &a.description,
        "start_datetime" => &a.start_datetime,
        "end_datetime" => &a.end_datetime,
        "priority" => &a.priority,
        "status" => &a.status,
        "contact_person" => &a.contact_person,
        "responsible_person" => &a.responsible_person,
        "reminder_type" => &a.reminder_type,
        "created_at" => &a.created_at,
    }
}

fn insert_order_rows(conn: &mut PooledConn, order: &Order) -> Result<()> {
    conn.exec_drop(
        "INSERT INTO orders (id, draft_id, created_at, customer_id, fields, delivery, action)
        VALUES (:id, :draft_id, :created_at, :customer_id, :fields, :delivery, :action)",
        params! {
            "id" => &order.id,
            "draft_id" => &order.draft_id,
            "created_at" => &order.created_at,
            "customer_id" => &order.customer_id,
            "fields" => serde_json::to_string(&order.fields)?,
            "delivery" => serde_json::to_string(&order.delivery)?,
            "action" => order.action.as_str(),
        },
    )?;
    let rows = order
        .products
        .iter()
        .enumerate()
        .map(|(position, p)| -> Result<mysql::Params> {
            Ok(params! {
                "order_id" => &order.id,
                "position" => position as u32,
                "id" => p.id,
                "product_type" => p.product_type.as_str(),
                "material" => &p.material,
                "details" => serde_json::to_string(&p.details)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    conn.exec_batch(
        "INSERT INTO order_products (order_id, position, id, product_type, material, details)
        VALUES (:order_id, :position, :id, :product_type, :material, :details)",
        rows,
    )?;
    if let Some(customer_id) = &order.customer_id {
        conn.exec_drop(
            "UPDATE customers SET total_orders = total_orders + 1,
            total_value = total_value + :value WHERE id = :id",
            params! { "value" => order.value(), "id" => customer_id },
        )?;
    }
    Ok(())
}

impl Store for MysqlStore {
    fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.conn()?.exec_drop(
            "INSERT INTO customers (id, company_name, contact_name, phone_numbers, emails, line_id,
            customer_type, business_type, province, address, tax_id, presentation_status,
            contact_count, last_contact_date, interested_products, responsible_person,
            customer_status, how_found_us, other_channel, notes, total_orders, total_value, created_at)
            VALUES (:id, :company_name, :contact_name, :phone_numbers, :emails, :line_id,
            :customer_type, :business_type, :province, :address, :tax_id, :presentation_status,
            :contact_count, :last_contact_date, :interested_products, :responsible_person,
            :customer_status, :how_found_us, :other_channel, :notes, :total_orders, :total_value, :created_at)",
            customer_params(customer)?,
        )
        .map_err(|e| match e {
            mysql::Error::MySqlError(ref err) if err.code == Database::DUPLICATE_KEY_ERROR_CODE => {
                Error::InvalidValue(format!("รหัสลูกค้า {} ซ้ำ", customer.id))
            }
            e => e.into(),
        })
    }

    fn insert_contacts(&self, contacts: &[CustomerContact]) -> Result<()> {
        self.conn()?.exec_batch(
            "INSERT INTO customer_contacts (id, customer_id, contact_name, line_id, phone_number, email)
            VALUES (:id, :customer_id, :contact_name, :line_id, :phone_number, :email)",
            contacts.iter().map(|c| {
                params! {
                    "id" => &c.id,
                    "customer_id" => &c.customer_id,
                    "contact_name" => &c.contact_name,
                    "line_id" => &c.line_id,
                    "phone_number" => &c.phone_number,
                    "email" => &c.email,
                }
            }),
        )?;
        Ok(())
    }

    fn customers(&self) -> Result<Vec<Customer>> {
        let rows: Vec<CustomerRecord> = self
            .conn()?
            .query("SELECT * FROM customers ORDER BY created_at DESC")?;
        rows.into_iter().map(Customer::try_from).collect()
    }

    fn customer(&self, id: &str) -> Result<Option<Customer>> {
        let row: Option<CustomerRecord> = self
            .conn()?
            .exec_first("SELECT * FROM customers WHERE id = ? LIMIT 1", (id,))?;
        row.map(Customer::try_from).transpose()
    }

    fn update_customer(&self, customer: &Customer) -> Result<()> {
        self.conn()?.exec_drop(
            "UPDATE customers SET company_name = :company_name, contact_name = :contact_name,
            phone_numbers = :phone_numbers, emails = :emails, line_id = :line_id,
            customer_type = :customer_type, business_type = :business_type, province = :province,
            address = :address, tax_id = :tax_id, presentation_status = :presentation_status,
            contact_count = :contact_count, last_contact_date = :last_contact_date,
            interested_products = :interested_products, responsible_person = :responsible_person,
            customer_status = :customer_status, how_found_us = :how_found_us,
            other_channel = :other_channel, notes = :notes, total_orders = :total_orders,
            total_value = :total_value, created_at = :created_at
            WHERE id = :id LIMIT 1",
            customer_params(customer)?,
        )?;
        Ok(())
    }

    fn contacts(&self, customer_id: &str) -> Result<Vec<CustomerContact>> {
        Ok(self.conn()?.exec(
            "SELECT * FROM customer_contacts WHERE customer_id = ? ORDER BY id",
            (customer_id,),
        )?)
    }

    fn activities(&self, customer_id: &str) -> Result<Vec<Activity>> {
        Ok(self.conn()?.exec(
            "SELECT * FROM customer_activities WHERE customer_id = ? ORDER BY start_datetime DESC",
            (customer_id,),
        )?)
    }

    fn activity(&self, id: &str) -> Result<Option<Activity>> {
        Ok(self
            .conn()?
            .exec_first("SELECT * FROM customer_activities WHERE id = ? LIMIT 1", (id,))?)
    }

    fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.conn()?.exec_drop(
            "INSERT INTO customer_activities (id, customer_id, activity_type, title, description,
            start_datetime, end_datetime, priority, status, contact_person, responsible_person,
            reminder_type, created_at)
            VALUES (:id, :customer_id, :activity_type, :title, :description, :start_datetime,
            :end_datetime, :priority, :status, :contact_person, :responsible_person,
            :reminder_type, :created_at)",
            activity_params(activity),
        )?;
        Ok(())
    }

    fn update_activity(&self, activity: &Activity) -> Result<()> {
        self.conn()?.exec_drop(
            "UPDATE customer_activities SET customer_id = :customer_id,
            activity_type = :activity_type, title = :title, description = :description,
            start_datetime = :start_datetime, end_datetime = :end_datetime, priority = :priority,
            status = :status, contact_person = :contact_person,
            responsible_person = :responsible_person, reminder_type = :reminder_type,
            created_at = :created_at
            WHERE id = :id LIMIT 1",
            activity_params(activity),
        )?;
        Ok(())
    }

    fn delete_activity(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        conn.exec_drop("DELETE FROM customer_activities WHERE id = ? LIMIT 1", (id,))?;
        Ok(conn.affected_rows() > 0)
    }

    fn notes(&self, customer_id: &str) -> Result<Vec<CustomerNote>> {
        Ok(self.conn()?.exec(
            "SELECT * FROM customer_notes WHERE customer_id = ? ORDER BY created_at DESC",
            (customer_id,),
        )?)
    }

    fn insert_note(&self, note: &CustomerNote) -> Result<()> {
        self.conn()?.exec_drop(
            "INSERT INTO customer_notes (id, customer_id, content, author, created_at)
            VALUES (:id, :customer_id, :content, :author, :created_at)",
            params! {
                "id" => &note.id,
                "customer_id" => &note.customer_id,
                "content" => &note.content,
                "author" => &note.author,
                "created_at" => &note.created_at,
            },
        )?;
        Ok(())
    }

    fn insert_order(&self, order: &Order) -> Result<()> {
        let mut conn = self.conn()?;
        commit_or_rollback!(insert_order_rows, &mut conn, order)
    }

    fn orders(&self) -> Result<Vec<Order>> {
        self.load_orders(None)
    }

    fn customer_orders(&self, customer_id: &str) -> Result<Vec<Order>> {
        self.load_orders(Some(customer_id))
    }

    fn tracked_orders(&self) -> Result<Vec<TrackedOrder>> {
        let rows: Vec<TrackedRecord> = self
            .conn()?
            .query("SELECT * FROM tracked_orders ORDER BY order_date DESC")?;
        rows.into_iter().map(TrackedOrder::try_from).collect()
    }

    fn estimations(&self) -> Result<Vec<Estimation>> {
        let rows: Vec<BodyRecord> = self
            .conn()?
            .query("SELECT body FROM price_estimations ORDER BY created_at DESC")?;
        rows.into_iter()
            .map(|r| -> Result<Estimation> { Ok(serde_json::from_str(&r.body)?) })
            .collect()
    }

    fn insert_estimation(&self, estimation: &Estimation) -> Result<()> {
        self.conn()?.exec_drop(
            "INSERT INTO price_estimations (id, created_at, body) VALUES (:id, :created_at, :body)",
            params! {
                "id" => &estimation.id,
                "created_at" => &estimation.created_at,
                "body" => serde_json::to_string(estimation)?,
            },
        )?;
        Ok(())
    }

    fn insert_job_event(&self, event: &JobEvent) -> Result<()> {
        self.conn()?.exec_drop(
            "INSERT INTO job_updates (id, job_id, kind, body, created_at)
            VALUES (:id, :job_id, :kind, :body, :created_at)",
            params! {
                "id" => &event.id,
                "job_id" => &event.job_id,
                "kind" => &event.kind,
                "body" => serde_json::to_string(&event.body)?,
                "created_at" => &event.created_at,
            },
        )?;
        debug!("Stored {} event for job {}", event.kind, event.job_id);
        Ok(())
    }

    fn job_events(&self, job_id: &str) -> Result<Vec<JobEvent>> {
        let rows: Vec<EventRecord> = self.conn()?.exec(
            "SELECT * FROM job_updates WHERE job_id = ? ORDER BY created_at DESC, id DESC",
            (job_id,),
        )?;
        rows.into_iter()
            .map(|r| -> Result<JobEvent> {
                Ok(JobEvent {
                    id: r.id,
                    job_id: r.job_id,
                    kind: r.kind,
                    body: serde_json::from_str(&r.body)?,
                    created_at: r.created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::func::tracking::{Location, OrderKind};

    #[test]
    fn enums_are_read_by_serde_name() {
        let kind: OrderKind = from_text("external".to_owned()).unwrap();
        assert_eq!(kind, OrderKind::External);
        let back: Location = from_text("international".to_owned()).unwrap();
        assert_eq!(back, Location::International);
        assert!(from_text::<Location>("mars".to_owned()).is_err());
    }
}
