use serde::Serialize;

use crate::{
    errors::{Error, Result},
    pages::func::customer::Customer,
};

/// Searches start once the query is longer than this many characters.
pub const MIN_QUERY_CHARS: usize = 2;

/// Customer search box of the order form. The customer list is loaded once
/// when the draft is opened and filtered locally on every keystroke.
#[derive(Debug, Clone, Default)]
pub struct CustomerLookup {
    customers: Vec<Customer>,
    query: String,
    results: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHit {
    pub id: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub line_id: String,
}

/// The four form fields written by a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCustomer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub line: String,
    pub email: String,
}

impl CustomerLookup {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers,
            ..Default::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    fn matches(customer: &Customer, needle: &str) -> bool {
        customer.contact_name.to_lowercase().contains(needle)
            || customer.company_name.to_lowercase().contains(needle)
            || customer
                .line_id
                .as_deref()
                .is_some_and(|line| line.to_lowercase().contains(needle))
            || customer
                .phone_numbers
                .iter()
                .any(|phone| phone.to_lowercase().contains(needle))
    }

    /// Updates the query and returns the matches in list order.
    pub fn search(&mut self, query: &str) -> Vec<CustomerHit> {
        self.query = query.to_owned();
        self.results = if query.chars().count() > MIN_QUERY_CHARS {
            let needle = query.to_lowercase();
            self.customers
                .iter()
                .enumerate()
                .filter(|(_, c)| Self::matches(c, &needle))
                .map(|(i, _)| i)
                .collect()
        } else {
            Vec::new()
        };
        self.results()
    }

    pub fn results(&self) -> Vec<CustomerHit> {
        self.results
            .iter()
            .map(|&i| {
                let c = &self.customers[i];
                CustomerHit {
                    id: c.id.clone(),
                    company_name: c.company_name.clone(),
                    contact_name: c.contact_name.clone(),
                    phone: c.phone_numbers.first().cloned().unwrap_or_default(),
                    line_id: c.line_id.clone().unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Picks a customer and clears the search box and its results.
    pub fn select(&mut self, id: &str) -> Result<SelectedCustomer> {
        let customer = self
            .customers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("ลูกค้า {id}")))?;
        let selected = SelectedCustomer {
            id: customer.id.clone(),
            name: customer.contact_name.clone(),
            phone: customer.phone_numbers.first().cloned().unwrap_or_default(),
            line: customer.line_id.clone().unwrap_or_default(),
            email: customer.emails.first().cloned().unwrap_or_default(),
        };
        self.query.clear();
        self.results.clear();
        Ok(selected)
    }
}
