use serde::{Deserialize, Serialize};

use crate::libs::time;

use super::product::{JobDetails, ProductType};

/// One line item saved with "บันทึกสินค้า".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedProduct {
    pub id: u64,
    pub product_type: ProductType,
    pub material: Option<String>,
    pub details: JobDetails,
}

impl StagedProduct {
    pub fn quantity(&self) -> Option<&str> {
        self.details.quantity.as_deref()
    }
}

/// Append-only list of staged products. Ids come from the clock in
/// milliseconds and never repeat within one list.
#[derive(Debug, Clone, Default)]
pub struct ProductAccumulator {
    items: Vec<StagedProduct>,
    last_id: u64,
}

impl ProductAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.last_id = time::now_millis().max(self.last_id + 1);
        self.last_id
    }

    pub fn push(
        &mut self,
        product_type: ProductType,
        material: Option<String>,
        details: JobDetails,
    ) -> &StagedProduct {
        let id = self.next_id();
        self.items.push(StagedProduct {
            id,
            product_type,
            material,
            details,
        });
        &self.items[self.items.len() - 1]
    }

    /// Removes the entry with `id`, keeping the others in order.
    pub fn remove(&mut self, id: u64) -> Option<StagedProduct> {
        let index = self.items.iter().position(|p| p.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn items(&self) -> &[StagedProduct] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn last(&self) -> Option<&StagedProduct> {
        self.items.last()
    }

    /// Rows for the "สินค้าที่บันทึกแล้ว" card.
    pub fn rows(&self) -> Vec<StagedRow> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, p)| StagedRow {
                id: p.id,
                index: i + 1,
                product_type: p.product_type,
                material: p.material.clone(),
                quantity: p.quantity().map(str::to_owned),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRow {
    pub id: u64,
    pub index: usize,
    pub product_type: ProductType,
    pub material: Option<String>,
    pub quantity: Option<String>,
}
