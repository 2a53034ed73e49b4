use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

use crate::{
    errors::Result,
    pages::func::{
        customer::{
            activity::{sort_timeline, Activity},
            Customer, CustomerContact, CustomerNote, CustomerStatus,
        },
        estimation::{demo_estimations, Estimation},
        job::JobEvent,
        order::Order,
        tracking::{demo_orders, TrackedOrder},
    },
};

use super::Store;

/// A row plus its insertion sequence; ties on timestamps fall back to it.
struct Entry<T> {
    seq: u64,
    value: T,
}

/// `Store` kept in memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    seq: AtomicU64,
    customers: DashMap<String, Entry<Customer>>,
    contacts: DashMap<String, Entry<CustomerContact>>,
    activities: DashMap<String, Entry<Activity>>,
    notes: DashMap<String, Entry<CustomerNote>>,
    orders: DashMap<String, Entry<Order>>,
    tracked: DashMap<String, Entry<TrackedOrder>>,
    estimations: DashMap<String, Entry<Estimation>>,
    job_events: DashMap<String, Entry<JobEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the demo tracking board, estimations and a few customers.
    pub fn seeded() -> Self {
        let store = Self::new();
        for order in demo_orders() {
            store.put(&store.tracked, order.id.clone(), order);
        }
        for estimation in demo_estimations() {
            store.put(&store.estimations, estimation.id.clone(), estimation);
        }
        for customer in demo_customers() {
            store.put(&store.customers, customer.id.clone(), customer);
        }
        debug!("Seeded in-memory store");
        store
    }

    fn put<T>(&self, map: &DashMap<String, Entry<T>>, key: String, value: T) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        map.insert(key, Entry { seq, value });
    }

    /// Replaces the value and keeps the original sequence.
    fn replace<T>(&self, map: &DashMap<String, Entry<T>>, key: &str, value: T) {
        match map.get_mut(key) {
            Some(mut entry) => entry.value = value,
            None => self.put(map, key.to_owned(), value),
        }
    }
}

/// Values matching `keep`, newest first by `stamp` then by insertion.
fn newest_first<T: Clone>(
    map: &DashMap<String, Entry<T>>,
    keep: impl Fn(&T) -> bool,
    stamp: impl Fn(&T) -> &str,
) -> Vec<T> {
    let mut rows: Vec<(String, u64, T)> = map
        .iter()
        .filter(|e| keep(&e.value))
        .map(|e| (stamp(&e.value).to_owned(), e.seq, e.value.clone()))
        .collect();
    rows.sort_by(|a, b| (&b.0, b.1).cmp(&(&a.0, a.1)));
    rows.into_iter().map(|(_, _, v)| v).collect()
}

impl Store for MemoryStore {
    fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.put(&self.customers, customer.id.clone(), customer.clone());
        Ok(())
    }

    fn insert_contacts(&self, contacts: &[CustomerContact]) -> Result<()> {
        for contact in contacts {
            self.put(&self.contacts, contact.id.clone(), contact.clone());
        }
        Ok(())
    }

    fn customers(&self) -> Result<Vec<Customer>> {
        Ok(newest_first(&self.customers, |_| true, |c| c.created_at.as_str()))
    }

    fn customer(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.customers.get(id).map(|e| e.value.clone()))
    }

    fn update_customer(&self, customer: &Customer) -> Result<()> {
        self.replace(&self.customers, &customer.id, customer.clone());
        Ok(())
    }

    fn contacts(&self, customer_id: &str) -> Result<Vec<CustomerContact>> {
        let mut list: Vec<(u64, CustomerContact)> = self
            .contacts
            .iter()
            .filter(|e| e.value.customer_id == customer_id)
            .map(|e| (e.seq, e.value.clone()))
            .collect();
        list.sort_by_key(|(seq, _)| *seq);
        Ok(list.into_iter().map(|(_, c)| c).collect())
    }

    fn activities(&self, customer_id: &str) -> Result<Vec<Activity>> {
        let mut list = newest_first(
            &self.activities,
            |a| a.customer_id == customer_id,
            |a| a.created_at.as_str(),
        );
        sort_timeline(&mut list);
        Ok(list)
    }

    fn activity(&self, id: &str) -> Result<Option<Activity>> {
        Ok(self.activities.get(id).map(|e| e.value.clone()))
    }

    fn insert_activity(&self, activity: &Activity) -> Result<()> {
        self.put(&self.activities, activity.id.clone(), activity.clone());
        Ok(())
    }

    fn update_activity(&self, activity: &Activity) -> Result<()> {
        self.replace(&self.activities, &activity.id, activity.clone());
        Ok(())
    }

    fn delete_activity(&self, id: &str) -> Result<bool> {
        Ok(self.activities.remove(id).is_some())
    }

    fn notes(&self, customer_id: &str) -> Result<Vec<CustomerNote>> {
        Ok(newest_first(
            &self.notes,
            |n| n.customer_id == customer_id,
            |n| n.created_at.as_str(),
        ))
    }

    fn insert_note(&self, note: &CustomerNote) -> Result<()> {
        self.put(&self.notes, note.id.clone(), note.clone());
        Ok(())
    }

    fn insert_order(&self, order: &Order) -> Result<()> {
        if let Some(mut customer) = order
            .customer_id
            .as_deref()
            .and_then(|id| self.customers.get_mut(id))
        {
            customer.value.total_orders += 1;
            customer.value.total_value += order.value();
        }
        self.put(&self.orders, order.id.clone(), order.clone());
        Ok(())
    }

    fn orders(&self) -> Result<Vec<Order>> {
        Ok(newest_first(&self.orders, |_| true, |o| o.created_at.as_str()))
    }

    fn customer_orders(&self, customer_id: &str) -> Result<Vec<Order>> {
        Ok(newest_first(
            &self.orders,
            |o| o.customer_id.as_deref() == Some(customer_id),
            |o| o.created_at.as_str(),
        ))
    }

    fn tracked_orders(&self) -> Result<Vec<TrackedOrder>> {
        let mut list: Vec<(u64, TrackedOrder)> = self
            .tracked
            .iter()
            .map(|e| (e.seq, e.value.clone()))
            .collect();
        list.sort_by_key(|(seq, _)| *seq);
        Ok(list.into_iter().map(|(_, o)| o).collect())
    }

    fn estimations(&self) -> Result<Vec<Estimation>> {
        Ok(newest_first(&self.estimations, |_| true, |e| e.created_at.as_str()))
    }

    fn insert_estimation(&self, estimation: &Estimation) -> Result<()> {
        self.put(&self.estimations, estimation.id.clone(), estimation.clone());
        Ok(())
    }

    fn insert_job_event(&self, event: &JobEvent) -> Result<()> {
        self.put(&self.job_events, event.id.clone(), event.clone());
        Ok(())
    }

    fn job_events(&self, job_id: &str) -> Result<Vec<JobEvent>> {
        Ok(newest_first(
            &self.job_events,
            |e| e.job_id == job_id,
            |e| e.created_at.as_str(),
        ))
    }
}

fn demo_customers() -> Vec<Customer> {
    let customer = |id: &str,
                    company: &str,
                    contact: &str,
                    phone: &str,
                    email: &str,
                    province: &str,
                    status: CustomerStatus,
                    last_contact: &str| Customer {
        id: id.to_owned(),
        company_name: company.to_owned(),
        contact_name: contact.to_owned(),
        phone_numbers: vec![phone.to_owned()],
        emails: vec![email.to_owned()],
        customer_type: Some("เจ้าของงาน".to_owned()),
        business_type: Some("องค์กร".to_owned()),
        province: Some(province.to_owned()),
        presentation_status: Some("ติดตาม".to_owned()),
        contact_count: 1,
        last_contact_date: Some(last_contact.to_owned()),
        responsible_person: Some("พนักงานขายปัจจุบัน".to_owned()),
        customer_status: status,
        how_found_us: Some("Facebook".to_owned()),
        created_at: "2024-01-01 09:00:00".to_owned(),
        ..Default::default()
    };
    vec![
        customer("CUS001", "บริษัท เอบีซี จำกัด", "คุณสมชาย ใจดี", "081-234-5678", "somchai@abc.co.th", "กรุงเทพมหานคร", CustomerStatus::Vip, "2024-01-15 10:00:00"),
        customer("CUS002", "โรงเรียนสายรุ้ง", "คุณครูมาลี", "089-876-5432", "malee@rainbow.ac.th", "เชียงใหม่", CustomerStatus::Regular, "2024-01-10 14:00:00"),
        customer("CUS003", "สมาคมนักกีฬา", "คุณวิชัย", "02-555-1234", "contact@sports.or.th", "ภูเก็ต", CustomerStatus::New, "2024-01-05 09:30:00"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, customer: &str, at: &str) -> CustomerNote {
        CustomerNote {
            id: id.into(),
            customer_id: customer.into(),
            content: format!("note {id}"),
            author: "ทดสอบ".into(),
            created_at: at.into(),
        }
    }

    #[test]
    fn seeded_store_has_demo_data() {
        let store = MemoryStore::seeded();
        let ids: Vec<String> = store.tracked_orders().unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, ["ORD001", "ORD002", "ORD003", "ORD004", "ORD005"]);
        assert_eq!(store.estimations().unwrap().len(), 3);
        assert_eq!(store.customers().unwrap().len(), 3);
    }

    #[test]
    fn notes_are_newest_first_with_insertion_tiebreak() {
        let store = MemoryStore::new();
        store.insert_note(&note("1", "CUS1", "2024-01-01 10:00:00")).unwrap();
        store.insert_note(&note("2", "CUS1", "2024-01-02 10:00:00")).unwrap();
        store.insert_note(&note("3", "CUS1", "2024-01-02 10:00:00")).unwrap();
        store.insert_note(&note("4", "CUS2", "2024-01-03 10:00:00")).unwrap();
        let ids: Vec<String> = store.notes("CUS1").unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, ["3", "2", "1"]);
    }

    #[test]
    fn activity_delete_reports_missing_rows() {
        let store = MemoryStore::new();
        let activity = Activity {
            id: "ACT1".into(),
            customer_id: "CUS1".into(),
            ..Default::default()
        };
        store.insert_activity(&activity).unwrap();
        assert!(store.delete_activity("ACT1").unwrap());
        assert!(!store.delete_activity("ACT1").unwrap());
    }

    #[test]
    fn update_keeps_list_position() {
        let store = MemoryStore::seeded();
        let mut first = store.customer("CUS001").unwrap().unwrap();
        first.notes = Some("ลูกค้าสำคัญ".into());
        store.update_customer(&first).unwrap();
        let list = store.customers().unwrap();
        assert_eq!(list[0].id, "CUS003");
        assert_eq!(list[2].notes.as_deref(), Some("ลูกค้าสำคัญ"));
    }
}
