use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{Error, FieldError, Result},
    libs::{
        dser::{deser_empty_to_none, deser_empty_to_none_of},
        merge_patch,
        time::{format_datetime, now, now_millis},
    },
    pages::func::customer::Customer,
};

use super::{
    delivery::{DeliveryBranch, DeliveryField, DeliveryInfo, DeliveryType},
    lookup::{CustomerHit, CustomerLookup},
    product::{DetailField, JobDetails, ProductType, SubmitAction},
    staged::{ProductAccumulator, StagedProduct, StagedRow},
    Order,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// เร่งด่วน 3-5 ชั่วโมง
    Emergency,
    #[serde(rename = "urgent_1day")]
    Urgent1Day,
    #[serde(rename = "urgent_2days")]
    Urgent2Days,
    Normal,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Self::Emergency,
        Self::Urgent1Day,
        Self::Urgent2Days,
        Self::Normal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Urgent1Day => "urgent_1day",
            Self::Urgent2Days => "urgent_2days",
            Self::Normal => "normal",
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Self::Emergency => "เร่งด่วน 3-5 ชั่วโมง",
            Self::Urgent1Day => "ด่วน 1 วัน",
            Self::Urgent2Days => "ด่วน 2 วัน",
            Self::Normal => "ปกติ",
        }
    }
}

impl FromStr for Urgency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| Error::InvalidValue(format!("ไม่รู้จักความเร่งด่วน {s}")))
    }
}

/// Top-level fields of the order form (sections 1-3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderFields {
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub responsible_person: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub customer_phone: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub customer_line: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub customer_email: Option<String>,
    pub require_tax_invoice: bool,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub tax_payer_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub tax_id: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub tax_address: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub job_id: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub quotation_number: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none_of")]
    pub urgency_level: Option<Urgency>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub job_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub usage_date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub delivery_date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub budget: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub deposit_slip: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub full_payment_slip: Option<String>,
}

impl OrderFields {
    fn check_required(&self, errors: &mut Vec<FieldError>) {
        let required = [
            (self.responsible_person.is_some(), "responsiblePerson", "กรุณาระบุพนักงานที่รับผิดชอบ"),
            (self.customer_name.is_some(), "customerName", "กรุณาระบุชื่อลูกค้า"),
            (self.customer_phone.is_some(), "customerPhone", "กรุณาระบุเบอร์โทรศัพท์"),
            (self.urgency_level.is_some(), "urgencyLevel", "กรุณาเลือกความเร่งด่วน"),
            (self.job_name.is_some(), "jobName", "กรุณาระบุชื่องาน"),
        ];
        for (present, field, message) in required {
            if !present {
                errors.push(FieldError::new(field, message));
            }
        }
    }

    /// Tax invoice values are dropped while no invoice is requested.
    fn without_hidden_tax(mut self) -> Self {
        if !self.require_tax_invoice {
            self.tax_payer_name = None;
            self.tax_id = None;
            self.tax_address = None;
        }
        self
    }
}

/// Body of `POST /order/draft/:id/product`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    /// Absent keeps the current type, `""`/`null` clears it.
    #[serde(default, deserialize_with = "some_selector")]
    pub product_type: Option<Option<ProductType>>,
    #[serde(default, deserialize_with = "some_text")]
    pub material: Option<Option<String>>,
    pub job_details: Option<Value>,
}

/// Body of `POST /order/draft/:id/delivery`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPatch {
    #[serde(default, deserialize_with = "some_selector")]
    pub delivery_type: Option<Option<DeliveryType>>,
    pub delivery_info: Option<Value>,
}

fn some_selector<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    deser_empty_to_none_of(de).map(Some)
}

fn some_text<'de, D>(de: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deser_empty_to_none(de).map(Some)
}

/// The customer picked through the lookup and the contact values it filled in.
#[derive(Debug, Clone, PartialEq)]
struct LinkedCustomer {
    id: String,
    name: Option<String>,
    phone: Option<String>,
}

/// Server-side controller of one order-intake form.
///
/// Every section's visibility is computed from the current values; there is
/// no stored "show" flag.
#[derive(Debug, Clone)]
pub struct OrderForm {
    id: String,
    created_at: String,
    fields: OrderFields,
    linked: Option<LinkedCustomer>,
    /// Last access in epoch milliseconds; stale drafts are evicted.
    touched_at: u64,
    product_type: Option<ProductType>,
    material: Option<String>,
    job_details: JobDetails,
    staged: ProductAccumulator,
    delivery: DeliveryBranch,
    lookup: CustomerLookup,
}

impl OrderForm {
    pub fn new(id: String, customers: Vec<Customer>) -> Self {
        Self {
            id,
            created_at: format_datetime(&now()),
            fields: OrderFields::default(),
            linked: None,
            touched_at: now_millis(),
            product_type: None,
            material: None,
            job_details: JobDetails::default(),
            staged: ProductAccumulator::new(),
            delivery: DeliveryBranch::default(),
            lookup: CustomerLookup::new(customers),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn fields(&self) -> &OrderFields {
        &self.fields
    }
    pub fn product_type(&self) -> Option<ProductType> {
        self.product_type
    }
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }
    pub fn job_details(&self) -> &JobDetails {
        &self.job_details
    }
    pub fn staged(&self) -> &ProductAccumulator {
        &self.staged
    }
    pub fn delivery(&self) -> &DeliveryBranch {
        &self.delivery
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.linked.as_ref().map(|c| c.id.as_str())
    }

    pub fn touched_at(&self) -> u64 {
        self.touched_at
    }

    pub fn touch(&mut self, at: u64) {
        self.touched_at = at;
    }

    /// Editing the name or phone the lookup filled in unlinks the customer.
    pub fn patch_fields(&mut self, patch: Value) -> Result<()> {
        self.fields = merge_patch(&self.fields, patch)?;
        if self.linked.as_ref().is_some_and(|c| {
            c.name != self.fields.customer_name || c.phone != self.fields.customer_phone
        }) {
            self.linked = None;
        }
        Ok(())
    }

    /// A different type starts from an empty material and detail bag.
    pub fn set_product_type(&mut self, product_type: Option<ProductType>) {
        if self.product_type != product_type {
            self.product_type = product_type;
            self.material = None;
            self.job_details = JobDetails::default();
        }
    }

    pub fn set_material(&mut self, material: Option<String>) -> Result<()> {
        let Some(material) = material else {
            self.material = None;
            self.job_details = JobDetails::default();
            return Ok(());
        };
        let Some(product_type) = self.product_type else {
            return Err(Error::InvalidValue("กรุณาเลือกประเภทสินค้าก่อน".to_owned()));
        };
        if !product_type.materials().contains(&material.as_str()) {
            return Err(Error::InvalidValue(format!(
                "วัสดุ {material} ใช้กับ {product_type} ไม่ได้"
            )));
        }
        self.material = Some(material);
        Ok(())
    }

    /// Merges `patch` into the detail bag. Values of hidden fields are
    /// discarded.
    pub fn patch_details(&mut self, patch: Value) -> Result<()> {
        let Some(product_type) = self.product_type.filter(|_| self.details_visible()) else {
            return Err(Error::InvalidValue(
                "กรุณาเลือกประเภทสินค้าและวัสดุก่อน".to_owned(),
            ));
        };
        let mut details: JobDetails = merge_patch(&self.job_details, patch)?;
        details.check_options()?;
        details.prune(&product_type.visible_fields(&details));
        self.job_details = details;
        Ok(())
    }

    pub fn apply_product(&mut self, patch: ProductPatch) -> Result<()> {
        if let Some(product_type) = patch.product_type {
            self.set_product_type(product_type);
        }
        if let Some(material) = patch.material {
            self.set_material(material)?;
        }
        if let Some(details) = patch.job_details {
            self.patch_details(details)?;
        }
        Ok(())
    }

    /// Section 4 shows once a type is chosen and, for types that have
    /// materials, a material too.
    pub fn details_visible(&self) -> bool {
        match self.product_type {
            Some(t) if t.has_materials() => self.material.is_some(),
            Some(_) => true,
            None => false,
        }
    }

    pub fn visible_detail_fields(&self) -> Vec<DetailField> {
        match self.product_type {
            Some(t) if self.details_visible() => t.visible_fields(&self.job_details),
            _ => Vec::new(),
        }
    }

    pub fn material_visible(&self) -> bool {
        self.product_type.is_some()
    }

    pub fn delivery_visible(&self) -> bool {
        self.details_visible() || !self.staged.is_empty()
    }

    pub fn tax_fields_visible(&self) -> bool {
        self.fields.require_tax_invoice
    }

    /// "บันทึกสินค้า": stages the current product and clears the selection.
    pub fn save_product(&mut self) -> Result<&StagedProduct> {
        let Some(product_type) = self.product_type.filter(|_| self.details_visible()) else {
            return Err(Error::InvalidValue(
                "กรุณาเลือกประเภทสินค้าและวัสดุก่อนบันทึกสินค้า".to_owned(),
            ));
        };
        let material = self.material.take();
        let details = std::mem::take(&mut self.job_details);
        self.product_type = None;
        Ok(self.staged.push(product_type, material, details))
    }

    pub fn remove_product(&mut self, id: u64) -> Result<StagedProduct> {
        self.staged
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("สินค้า {id}")))
    }

    pub fn select_delivery(&mut self, ty: Option<DeliveryType>) {
        self.delivery.select(ty);
    }

    pub fn patch_delivery(&mut self, patch: Value) -> Result<()> {
        self.delivery.patch(patch)
    }

    pub fn apply_delivery(&mut self, patch: DeliveryPatch) -> Result<()> {
        if let Some(ty) = patch.delivery_type {
            self.select_delivery(ty);
        }
        if let Some(info) = patch.delivery_info {
            self.patch_delivery(info)?;
        }
        Ok(())
    }

    pub fn copy_recipient(&mut self) -> Result<()> {
        self.delivery.copy_recipient(
            self.fields.customer_name.as_deref(),
            self.fields.customer_phone.as_deref(),
        )
    }

    pub fn search(&mut self, query: &str) -> Vec<CustomerHit> {
        self.lookup.search(query)
    }

    pub fn select_customer(&mut self, customer_id: &str) -> Result<()> {
        let picked = self.lookup.select(customer_id)?;
        let non_empty = |v: String| op::ternary!(v.is_empty() => None; Some(v));
        self.fields.customer_name = non_empty(picked.name);
        self.fields.customer_phone = non_empty(picked.phone);
        self.fields.customer_line = non_empty(picked.line);
        self.fields.customer_email = non_empty(picked.email);
        self.linked = Some(LinkedCustomer {
            id: picked.id,
            name: self.fields.customer_name.clone(),
            phone: self.fields.customer_phone.clone(),
        });
        Ok(())
    }

    /// Products that go into the order: everything staged plus the current
    /// selection when its detail section is open.
    fn products(&self) -> Vec<StagedProduct> {
        let mut products = self.staged.items().to_vec();
        if let Some(product_type) = self.product_type.filter(|_| self.details_visible()) {
            let mut list = self.staged.clone();
            let current = list.push(product_type, self.material.clone(), self.job_details.clone());
            products.push(current.clone());
        }
        products
    }

    pub fn submit_action(&self) -> Option<SubmitAction> {
        self.product_type
            .or_else(|| self.staged.last().map(|p| p.product_type))
            .map(|t| t.action())
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        self.fields.check_required(&mut errors);
        match self.product_type {
            Some(t) if t.has_materials() && self.material.is_none() && self.staged.is_empty() => {
                errors.push(FieldError::new("material", "กรุณาเลือกวัสดุ"))
            }
            None if self.staged.is_empty() => {
                errors.push(FieldError::new("productType", "กรุณาเลือกประเภทสินค้า"))
            }
            _ => {}
        }
        self.delivery.check(&mut errors);
        op::ternary!(errors.is_empty() => Ok(()); Err(Error::Validation(errors)))
    }

    /// Validates the form and builds the order to persist.
    pub fn submit(&self, order_id: String) -> Result<Order> {
        self.validate()?;
        let (Some(delivery), Some(action)) = (self.delivery.info(), self.submit_action()) else {
            return Err(Error::field("productType", "กรุณาเลือกประเภทสินค้า"));
        };
        Ok(Order {
            id: order_id,
            draft_id: self.id.clone(),
            created_at: format_datetime(&now()),
            customer_id: self.customer_id().map(str::to_owned),
            fields: self.fields.clone().without_hidden_tax(),
            products: self.products(),
            delivery: delivery.clone(),
            action,
        })
    }

    pub fn view(&self) -> FormView<'_> {
        FormView {
            id: &self.id,
            created_at: &self.created_at,
            fields: &self.fields,
            customer_id: self.customer_id(),
            customer_search: self.lookup.query(),
            search_results: self.lookup.results(),
            tax_fields_visible: self.tax_fields_visible(),
            product_type: self.product_type,
            material_visible: self.material_visible(),
            material_options: self.product_type.map(|t| t.materials()).unwrap_or_default(),
            material: self.material.as_deref(),
            details_visible: self.details_visible(),
            details_title: self
                .product_type
                .filter(|_| self.details_visible())
                .map(|t| t.section_title()),
            detail_fields: self.visible_detail_fields(),
            job_details: &self.job_details,
            saved_products: self.staged.rows(),
            delivery_visible: self.delivery_visible(),
            delivery_type: self.delivery.delivery_type(),
            delivery_fields: self.delivery.visible_fields(),
            delivery_info: self.delivery.info(),
            submit_action: self.submit_action(),
        }
    }
}

/// What the client renders for a draft.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView<'a> {
    pub id: &'a str,
    pub created_at: &'a str,
    pub fields: &'a OrderFields,
    pub customer_id: Option<&'a str>,
    pub customer_search: &'a str,
    pub search_results: Vec<CustomerHit>,
    pub tax_fields_visible: bool,
    pub product_type: Option<ProductType>,
    pub material_visible: bool,
    pub material_options: &'static [&'static str],
    pub material: Option<&'a str>,
    pub details_visible: bool,
    pub details_title: Option<String>,
    pub detail_fields: Vec<DetailField>,
    pub job_details: &'a JobDetails,
    pub saved_products: Vec<StagedRow>,
    pub delivery_visible: bool,
    pub delivery_type: Option<DeliveryType>,
    pub delivery_fields: &'static [DeliveryField],
    pub delivery_info: Option<&'a DeliveryInfo>,
    pub submit_action: Option<SubmitAction>,
}
