use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::{Error, FieldError, Result},
    libs::{dser::deser_empty_to_none, merge_patch},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    /// จัดส่งพัสดุ
    Parcel,
    /// รับที่ร้าน
    Pickup,
}

impl FromStr for DeliveryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "parcel" => Ok(Self::Parcel),
            "pickup" => Ok(Self::Pickup),
            _ => Err(Error::InvalidValue(format!("ไม่รู้จักรูปแบบการรับสินค้า {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryField {
    RecipientName,
    RecipientPhone,
    Address,
    Province,
    District,
    Subdistrict,
    PostalCode,
    DeliveryMethod,
    PreferredDeliveryDate,
    PaymentMethod,
    ShippingPaymentProof,
    DeliveryInstructions,
    PickupTime,
}

const PARCEL_FIELDS: &[DeliveryField] = &[
    DeliveryField::RecipientName,
    DeliveryField::RecipientPhone,
    DeliveryField::Address,
    DeliveryField::Province,
    DeliveryField::District,
    DeliveryField::Subdistrict,
    DeliveryField::PostalCode,
    DeliveryField::DeliveryMethod,
    DeliveryField::PreferredDeliveryDate,
    DeliveryField::PaymentMethod,
    DeliveryField::ShippingPaymentProof,
    DeliveryField::DeliveryInstructions,
];
const PICKUP_FIELDS: &[DeliveryField] = &[DeliveryField::PickupTime];

// Flat option lists; there is no province -> district hierarchy.
pub static PROVINCES: [(&str, &str); 3] = [
    ("bangkok", "กรุงเทพมหานคร"),
    ("chiangmai", "เชียงใหม่"),
    ("phuket", "ภูเก็ต"),
];
pub static DISTRICTS: [(&str, &str); 2] = [("district1", "เขต/อำเภอ 1"), ("district2", "เขต/อำเภอ 2")];
pub static SUBDISTRICTS: [(&str, &str); 2] = [
    ("subdistrict1", "แขวง/ตำบล 1"),
    ("subdistrict2", "แขวง/ตำบล 2"),
];
pub static DELIVERY_METHODS: [(&str, &str); 5] = [
    ("ems", "EMS"),
    ("kerry", "Kerry"),
    ("flash", "Flash"),
    ("private_transport", "ขนส่งเอกชน"),
    ("pickup", "นัดรับ"),
];
pub static PAYMENT_METHODS: [(&str, &str); 2] = [("source", "ต้นทาง"), ("destination", "ปลายทาง")];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParcelInfo {
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub recipient_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub recipient_phone: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub address: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub province: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub district: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub subdistrict: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub delivery_method: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub preferred_delivery_date: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub payment_method: Option<String>,
    /// File name only, uploads are not stored.
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub shipping_payment_proof: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub delivery_instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PickupInfo {
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub pickup_time: Option<String>,
}

/// The delivery subtree of an order. The variant is the only source of
/// which fields exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "deliveryType", rename_all = "lowercase")]
pub enum DeliveryInfo {
    Parcel(ParcelInfo),
    Pickup(PickupInfo),
}

impl DeliveryInfo {
    pub fn empty(ty: DeliveryType) -> Self {
        match ty {
            DeliveryType::Parcel => Self::Parcel(ParcelInfo::default()),
            DeliveryType::Pickup => Self::Pickup(PickupInfo::default()),
        }
    }

    pub fn delivery_type(&self) -> DeliveryType {
        match self {
            Self::Parcel(_) => DeliveryType::Parcel,
            Self::Pickup(_) => DeliveryType::Pickup,
        }
    }

    fn check(&self, errors: &mut Vec<FieldError>) {
        match self {
            Self::Parcel(info) => {
                let required = [
                    (&info.province, &PROVINCES[..], "province", "กรุณาเลือกจังหวัด"),
                    (&info.district, &DISTRICTS[..], "district", "กรุณาเลือกเขต/อำเภอ"),
                    (&info.subdistrict, &SUBDISTRICTS[..], "subdistrict", "กรุณาเลือกแขวง/ตำบล"),
                ];
                for (value, options, field, message) in required {
                    match value {
                        Some(v) if in_options(options, v) => {}
                        _ => errors.push(FieldError::new(format!("deliveryInfo.{field}"), message)),
                    }
                }
                match &info.postal_code {
                    None => errors.push(FieldError::new(
                        "deliveryInfo.postalCode",
                        "กรุณาระบุรหัสไปรษณีย์",
                    )),
                    Some(code) if !is_postal_code(code) => errors.push(FieldError::new(
                        "deliveryInfo.postalCode",
                        "รหัสไปรษณีย์ต้องเป็นตัวเลข 5 หลัก",
                    )),
                    _ => {}
                }
            }
            Self::Pickup(info) => {
                if info.pickup_time.is_none() {
                    errors.push(FieldError::new(
                        "deliveryInfo.pickupTime",
                        "กรุณาระบุเวลารับสินค้า",
                    ));
                }
            }
        }
    }
}

fn in_options(options: &[(&str, &str)], value: &str) -> bool {
    options.iter().any(|(k, _)| *k == value)
}

fn is_postal_code(code: &str) -> bool {
    code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit())
}

fn check_option(value: &Option<String>, options: &[(&str, &str)], what: &str) -> Result<()> {
    match value {
        Some(v) if !in_options(options, v) => {
            Err(Error::InvalidValue(format!("{what} {v} ไม่ถูกต้อง")))
        }
        _ => Ok(()),
    }
}

/// Parcel/pickup switch of the order form. Nothing is selected until the
/// user picks a branch.
#[derive(Debug, Clone, Default)]
pub struct DeliveryBranch(Option<DeliveryInfo>);

impl DeliveryBranch {
    pub fn delivery_type(&self) -> Option<DeliveryType> {
        self.0.as_ref().map(DeliveryInfo::delivery_type)
    }

    pub fn info(&self) -> Option<&DeliveryInfo> {
        self.0.as_ref()
    }

    /// Switching to the other branch drops whatever the old branch held.
    pub fn select(&mut self, ty: Option<DeliveryType>) {
        if self.delivery_type() != ty {
            self.0 = ty.map(DeliveryInfo::empty);
        }
    }

    pub fn visible_fields(&self) -> &'static [DeliveryField] {
        match self.delivery_type() {
            Some(DeliveryType::Parcel) => PARCEL_FIELDS,
            Some(DeliveryType::Pickup) => PICKUP_FIELDS,
            None => &[],
        }
    }

    /// Merges `patch` into the selected branch. Keys of the other branch
    /// are ignored.
    pub fn patch(&mut self, patch: Value) -> Result<()> {
        match &mut self.0 {
            Some(DeliveryInfo::Parcel(info)) => {
                let next: ParcelInfo = merge_patch(info, patch)?;
                check_option(&next.province, &PROVINCES, "จังหวัด")?;
                check_option(&next.district, &DISTRICTS, "เขต/อำเภอ")?;
                check_option(&next.subdistrict, &SUBDISTRICTS, "แขวง/ตำบล")?;
                check_option(&next.delivery_method, &DELIVERY_METHODS, "วิธีการจัดส่ง")?;
                check_option(&next.payment_method, &PAYMENT_METHODS, "วิธีชำระเงิน")?;
                *info = next;
            }
            Some(DeliveryInfo::Pickup(info)) => *info = merge_patch(info, patch)?,
            None => {
                return Err(Error::InvalidValue(
                    "กรุณาเลือกรูปแบบการรับสินค้าก่อน".to_owned(),
                ))
            }
        }
        Ok(())
    }

    /// "ใช้ข้อมูลลูกค้า": one-off copy, later edits of the customer fields
    /// are not followed.
    pub fn copy_recipient(&mut self, name: Option<&str>, phone: Option<&str>) -> Result<()> {
        match &mut self.0 {
            Some(DeliveryInfo::Parcel(info)) => {
                info.recipient_name = name.map(str::to_owned);
                info.recipient_phone = phone.map(str::to_owned);
                Ok(())
            }
            _ => Err(Error::InvalidValue(
                "ข้อมูลผู้รับใช้ได้เฉพาะการจัดส่งพัสดุ".to_owned(),
            )),
        }
    }

    pub fn check(&self, errors: &mut Vec<FieldError>) {
        match &self.0 {
            Some(info) => info.check(errors),
            None => errors.push(FieldError::new(
                "deliveryType",
                "กรุณาเลือกรูปแบบการรับสินค้า",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn toggling_twice_restores_the_field_set_but_not_the_values() {
        let mut branch = DeliveryBranch::default();
        assert!(branch.visible_fields().is_empty());
        branch.select(Some(DeliveryType::Parcel));
        let parcel = branch.visible_fields();
        branch.patch(json!({"province": "phuket", "address": "1/2"})).unwrap();

        branch.select(Some(DeliveryType::Pickup));
        assert_eq!(branch.visible_fields(), &[DeliveryField::PickupTime]);
        branch.select(Some(DeliveryType::Parcel));
        assert_eq!(branch.visible_fields(), parcel);
        assert_eq!(
            branch.info(),
            Some(&DeliveryInfo::Parcel(ParcelInfo::default()))
        );
    }

    #[test]
    fn selecting_the_same_branch_keeps_values() {
        let mut branch = DeliveryBranch::default();
        branch.select(Some(DeliveryType::Pickup));
        branch.patch(json!({"pickupTime": "14:00"})).unwrap();
        branch.select(Some(DeliveryType::Pickup));
        assert_eq!(
            branch.info(),
            Some(&DeliveryInfo::Pickup(PickupInfo {
                pickup_time: Some("14:00".into())
            }))
        );
    }

    #[test]
    fn parcel_requires_address_parts() {
        let mut branch = DeliveryBranch::default();
        branch.select(Some(DeliveryType::Parcel));
        branch.patch(json!({"province": "bangkok", "postalCode": "10"})).unwrap();
        let mut errors = Vec::new();
        branch.check(&mut errors);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "deliveryInfo.district",
                "deliveryInfo.subdistrict",
                "deliveryInfo.postalCode"
            ]
        );
    }

    #[test]
    fn pickup_requires_only_a_time() {
        let mut branch = DeliveryBranch::default();
        branch.select(Some(DeliveryType::Pickup));
        let mut errors = Vec::new();
        branch.check(&mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "กรุณาระบุเวลารับสินค้า");
    }

    #[test]
    fn unknown_option_values_are_rejected() {
        let mut branch = DeliveryBranch::default();
        assert!(branch.patch(json!({"pickupTime": "10:00"})).is_err());
        branch.select(Some(DeliveryType::Parcel));
        assert!(matches!(
            branch.patch(json!({"deliveryMethod": "drone"})),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn recipient_copy_needs_parcel() {
        let mut branch = DeliveryBranch::default();
        branch.select(Some(DeliveryType::Pickup));
        assert!(branch.copy_recipient(Some("สมชาย"), Some("0812345678")).is_err());
        branch.select(Some(DeliveryType::Parcel));
        branch.copy_recipient(Some("สมชาย"), Some("0812345678")).unwrap();
        let Some(DeliveryInfo::Parcel(info)) = branch.info() else {
            panic!("parcel expected");
        };
        assert_eq!(info.recipient_phone.as_deref(), Some("0812345678"));
    }

    #[test]
    fn stored_shape_is_tagged_by_delivery_type() {
        let info = DeliveryInfo::Pickup(PickupInfo {
            pickup_time: Some("09:30".into()),
        });
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"deliveryType": "pickup", "pickupTime": "09:30"})
        );
    }
}
