use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    libs::dser::deser_empty_to_none,
};

/// Material entry that asks the user to type the material themselves.
pub const OTHER_MATERIAL: &str = "อื่นๆ (โปรดระบุ)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Medal,
    Trophy,
    Award,
    Shirt,
    Bib,
    Keychain,
    Doll,
    Lanyard,
    #[serde(rename = "Box packaging")]
    BoxPackaging,
    Bag,
    Bottle,
    #[serde(rename = "อื่นๆ")]
    Other,
}

/// What the final button of the order form does for a product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    EstimatePrice,
    OrderProduction,
}

impl SubmitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EstimatePrice => "estimate_price",
            Self::OrderProduction => "order_production",
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Self::EstimatePrice => "ประเมินราคา",
            Self::OrderProduction => "สั่งผลิต",
        }
    }
}

impl FromStr for SubmitAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "estimate_price" => Ok(Self::EstimatePrice),
            "order_production" => Ok(Self::OrderProduction),
            _ => Err(Error::InvalidValue(format!("ไม่รู้จักการดำเนินการ {s}"))),
        }
    }
}

/// Every field the job-details section can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailField {
    CustomerReferenceImages,
    ReferenceImages,
    FileName,
    FileChannel,
    Size,
    /// Free text size, only while `size` is "other".
    CustomSize,
    Thickness,
    Quantity,
    Shape,
    Colors,
    FrontDetails,
    BackDetails,
    LanyardSize,
    LanyardQuantity,
    MoldCost,
    Notes,
    Model,
    Engraving,
    /// Only while engraving is accepted.
    EngravingDetails,
    /// Only while engraving is accepted.
    EngravingFiles,
    AttachedFiles,
    CustomType,
}

impl DetailField {
    pub const ALL: [DetailField; 22] = [
        Self::CustomerReferenceImages,
        Self::ReferenceImages,
        Self::FileName,
        Self::FileChannel,
        Self::Size,
        Self::CustomSize,
        Self::Thickness,
        Self::Quantity,
        Self::Shape,
        Self::Colors,
        Self::FrontDetails,
        Self::BackDetails,
        Self::LanyardSize,
        Self::LanyardQuantity,
        Self::MoldCost,
        Self::Notes,
        Self::Model,
        Self::Engraving,
        Self::EngravingDetails,
        Self::EngravingFiles,
        Self::AttachedFiles,
        Self::CustomType,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomerReferenceImages => "รูปอ้างอิงจากลูกค้า",
            Self::ReferenceImages => "ไฟล์ภาพอ้างอิง",
            Self::FileName => "ชื่อไฟล์งาน",
            Self::FileChannel => "ช่องทางของไฟล์งาน",
            Self::Size => "ขนาด",
            Self::CustomSize => "ระบุขนาด",
            Self::Thickness => "ความหนา",
            Self::Quantity => "จำนวน",
            Self::Shape => "รูปภาพ",
            Self::Colors => "สี",
            Self::FrontDetails => "รายละเอียดด้านหน้า",
            Self::BackDetails => "รายละเอียดด้านหลัง",
            Self::LanyardSize => "ขนาดสายคล้อง",
            Self::LanyardQuantity => "จำนวนแบบสายคล้อง",
            Self::MoldCost => "ค่าโมล เพิ่มเติม",
            Self::Notes => "หมายเหตุ",
            Self::Model => "รุ่นโมเดล",
            Self::Engraving => "ป้ายจารึก",
            Self::EngravingDetails => "รายละเอียดจารึก",
            Self::EngravingFiles => "แนบไฟล์ป้ายจารึก",
            Self::AttachedFiles => "ไฟล์แนบ",
            Self::CustomType => "ระบุประเภทสินค้า",
        }
    }

    /// Whether the field depends on another field's value.
    fn is_shown(&self, details: &JobDetails) -> bool {
        match self {
            Self::CustomSize => details.size.as_deref() == Some(SIZE_OTHER),
            Self::EngravingDetails | Self::EngravingFiles => {
                details.engraving == Some(Engraving::Accept)
            }
            _ => true,
        }
    }
}

use DetailField as F;

const MEDAL_FIELDS: &[DetailField] = &[
    F::CustomerReferenceImages,
    F::ReferenceImages,
    F::FileName,
    F::FileChannel,
    F::Size,
    F::CustomSize,
    F::Thickness,
    F::Quantity,
    F::Shape,
    F::Colors,
    F::FrontDetails,
    F::BackDetails,
    F::LanyardSize,
    F::LanyardQuantity,
    F::MoldCost,
    F::Notes,
];
const TROPHY_FIELDS: &[DetailField] = &[
    F::Model,
    F::Engraving,
    F::EngravingDetails,
    F::EngravingFiles,
    F::Quantity,
    F::Notes,
];
const SIMPLE_FIELDS: &[DetailField] = &[F::Quantity, F::AttachedFiles];
const OTHER_FIELDS: &[DetailField] = &[F::CustomType, F::Quantity, F::AttachedFiles];

impl ProductType {
    pub const ALL: [ProductType; 12] = [
        Self::Medal,
        Self::Trophy,
        Self::Award,
        Self::Shirt,
        Self::Bib,
        Self::Keychain,
        Self::Doll,
        Self::Lanyard,
        Self::BoxPackaging,
        Self::Bag,
        Self::Bottle,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medal => "Medal",
            Self::Trophy => "Trophy",
            Self::Award => "Award",
            Self::Shirt => "Shirt",
            Self::Bib => "Bib",
            Self::Keychain => "Keychain",
            Self::Doll => "Doll",
            Self::Lanyard => "Lanyard",
            Self::BoxPackaging => "Box packaging",
            Self::Bag => "Bag",
            Self::Bottle => "Bottle",
            Self::Other => "อื่นๆ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Medal => "Medal (เหรียญรางวัล)",
            Self::Trophy => "Trophy (ถ้วยรางวัล)",
            Self::Award => "Award (โล่)",
            Self::Shirt => "Shirt (เสื้อ)",
            Self::Bib => "Bib (ป้ายบิบ)",
            Self::Keychain => "Keychain (พวงกุญแจ)",
            Self::Doll => "Doll (ตุ๊กตา)",
            Self::Lanyard => "Lanyard (สายคล้อง)",
            Self::BoxPackaging => "Box packaging (บรรจุภัณฑ์)",
            Self::Bag => "Bag (กระเป๋า)",
            Self::Bottle => "Bottle (ขวดน้ำ)",
            Self::Other => "อื่นๆ",
        }
    }

    /// Heading of the job-details section.
    pub fn section_title(&self) -> String {
        match self {
            Self::Medal => "รายละเอียดเหรียญสั่งผลิต".to_owned(),
            Self::Trophy => "รายละเอียดถ้วยรางวัล".to_owned(),
            Self::Award => "รายละเอียดโล่".to_owned(),
            Self::Shirt => "รายละเอียดเสื้อ".to_owned(),
            Self::Bib => "รายละเอียดป้ายบิบ".to_owned(),
            other => format!("รายละเอียด{}", other.as_str()),
        }
    }

    pub fn materials(&self) -> &'static [&'static str] {
        match self {
            Self::Medal => &["ซิงค์อัลลอย", "อะคริลิค", "คริสตัล", "PVC", "ไม้", OTHER_MATERIAL],
            Self::Award => &["อะคริลิค", "คริสตัล", "ซิงค์อัลลอย", OTHER_MATERIAL],
            Self::Trophy => &[
                "ถ้วยดีบุก",
                "ถ้วยเบญจรงค์",
                "เรซิน",
                "อลูมิเนียม",
                "ตะกั่ว",
                OTHER_MATERIAL,
            ],
            Self::Lanyard => &[
                "โพลีสกรีน",
                "ยาง (ริสแบรน)",
                "กระดาษ (ริสแบรน)",
                "ผ้าไมโครเรียบ",
                "ผ้าดาวกระจาย",
                "ผ้าเม็ดข้าวสาร",
                "โฟม",
                OTHER_MATERIAL,
            ],
            _ => &[],
        }
    }

    pub fn has_materials(&self) -> bool {
        !self.materials().is_empty()
    }

    /// The detail fields this type can show, in render order.
    pub fn detail_fields(&self) -> &'static [DetailField] {
        match self {
            Self::Medal => MEDAL_FIELDS,
            Self::Trophy | Self::Award => TROPHY_FIELDS,
            Self::Other => OTHER_FIELDS,
            _ => SIMPLE_FIELDS,
        }
    }

    /// Fields shown right now, given the values already entered.
    pub fn visible_fields(&self, details: &JobDetails) -> Vec<DetailField> {
        self.detail_fields()
            .iter()
            .filter(|f| f.is_shown(details))
            .copied()
            .collect()
    }

    pub fn action(&self) -> SubmitAction {
        match self {
            Self::Trophy | Self::Shirt | Self::Bib => SubmitAction::OrderProduction,
            _ => SubmitAction::EstimatePrice,
        }
    }
}

impl Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidValue(format!("ไม่รู้จักประเภทสินค้า {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engraving {
    Accept,
    Decline,
}

pub const SIZE_OTHER: &str = "other";

pub static MEDAL_SIZES: [(&str, &str); 5] = [
    ("6", "6 ซม"),
    ("6.5", "6.5 ซม"),
    ("7", "7 ซม"),
    ("7.5", "7.5 ซม"),
    (SIZE_OTHER, "อื่นๆ"),
];

pub static MEDAL_COLORS: [(&str, &str); 9] = [
    ("shinny_gold", "สีทองเงา"),
    ("shinny_silver", "สีเงินเงา"),
    ("shinny_copper", "สีทองแดงเงา"),
    ("antique_gold", "สีทองรมดำ"),
    ("antique_silver", "สีเงินรมดำ"),
    ("antique_copper", "สีทองแดงรมดำ"),
    ("misty_gold", "สีทองด้าน"),
    ("misty_silver", "สีเงินด้าน"),
    ("misty_copper", "สีทองแดงด้าน"),
];

pub static LANYARD_SIZES: [(&str, &str); 6] = [
    ("1.5x90", "1.5 × 90 ซม"),
    ("2x90", "2 × 90 ซม"),
    ("2.5x90", "2.5 × 90 ซม"),
    ("3x90", "3 × 90 ซม"),
    ("3.5x90", "3.5 × 90 ซม"),
    ("no_lanyard", "ไม่รับสาย"),
];

/// Front/back decoration choices.
pub static DETAIL_OPTIONS: [&str; 8] = [
    "พิมพ์โลโก้",
    "แกะสลักข้อความ",
    "ลงสีสเปรย์",
    "ขัดเงา",
    "ลงน้ำยาป้องกันสนิม",
    "แกะลึก",
    "พิมพ์ซิลค์สกรีน",
    "ปั๊มลาย",
];

fn has_key(options: &[(&str, &str)], value: &str) -> bool {
    options.iter().any(|(k, _)| *k == value)
}

/// The per-product detail bag. File inputs only keep file names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobDetails {
    pub customer_reference_images: Vec<String>,
    pub reference_images: Vec<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub file_name: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub file_channel: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub size: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub custom_size: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub thickness: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub quantity: Option<String>,
    pub shape: Vec<String>,
    pub colors: Vec<String>,
    pub front_details: Vec<String>,
    pub back_details: Vec<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub lanyard_size: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub lanyard_quantity: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub mold_cost: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub model: Option<String>,
    pub engraving: Option<Engraving>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub engraving_details: Option<String>,
    pub engraving_files: Vec<String>,
    pub attached_files: Vec<String>,
    #[serde(deserialize_with = "deser_empty_to_none")]
    pub custom_type: Option<String>,
}

impl JobDetails {
    fn clear(&mut self, field: DetailField) {
        match field {
            F::CustomerReferenceImages => self.customer_reference_images.clear(),
            F::ReferenceImages => self.reference_images.clear(),
            F::FileName => self.file_name = None,
            F::FileChannel => self.file_channel = None,
            F::Size => self.size = None,
            F::CustomSize => self.custom_size = None,
            F::Thickness => self.thickness = None,
            F::Quantity => self.quantity = None,
            F::Shape => self.shape.clear(),
            F::Colors => self.colors.clear(),
            F::FrontDetails => self.front_details.clear(),
            F::BackDetails => self.back_details.clear(),
            F::LanyardSize => self.lanyard_size = None,
            F::LanyardQuantity => self.lanyard_quantity = None,
            F::MoldCost => self.mold_cost = None,
            F::Notes => self.notes = None,
            F::Model => self.model = None,
            F::Engraving => self.engraving = None,
            F::EngravingDetails => self.engraving_details = None,
            F::EngravingFiles => self.engraving_files.clear(),
            F::AttachedFiles => self.attached_files.clear(),
            F::CustomType => self.custom_type = None,
        }
    }

    /// Drops every value whose field is not currently visible.
    pub fn prune(&mut self, visible: &[DetailField]) {
        for field in DetailField::ALL {
            if !visible.contains(&field) {
                self.clear(field);
            }
        }
    }

    /// Checks values that must come from a fixed option list.
    pub fn check_options(&self) -> Result<()> {
        if let Some(size) = &self.size {
            if !has_key(&MEDAL_SIZES, size) {
                return Err(Error::InvalidValue(format!("ขนาด {size} ไม่ถูกต้อง")));
            }
        }
        if let Some(color) = self.colors.iter().find(|c| !has_key(&MEDAL_COLORS, c)) {
            return Err(Error::InvalidValue(format!("สี {color} ไม่ถูกต้อง")));
        }
        if let Some(size) = &self.lanyard_size {
            if !has_key(&LANYARD_SIZES, size) {
                return Err(Error::InvalidValue(format!("ขนาดสายคล้อง {size} ไม่ถูกต้อง")));
            }
        }
        if let Some(detail) = self
            .front_details
            .iter()
            .chain(&self.back_details)
            .find(|d| !DETAIL_OPTIONS.contains(&d.as_str()))
        {
            return Err(Error::InvalidValue(format!("รายละเอียด {detail} ไม่ถูกต้อง")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DetailField as F, *};

    #[test]
    fn every_type_shows_only_its_own_fields() {
        for ty in ProductType::ALL {
            let all = JobDetails {
                size: Some(SIZE_OTHER.into()),
                engraving: Some(Engraving::Accept),
                ..Default::default()
            };
            let visible = ty.visible_fields(&all);
            assert_eq!(visible, ty.detail_fields(), "{ty}");
            for field in DetailField::ALL {
                if !ty.detail_fields().contains(&field) {
                    assert!(!visible.contains(&field), "{ty} shows {field:?}");
                }
            }
        }
    }

    #[test]
    fn medal_section_has_size_colors_and_lanyard() {
        let visible = ProductType::Medal.visible_fields(&JobDetails::default());
        for field in [F::Size, F::Colors, F::LanyardSize, F::LanyardQuantity, F::MoldCost] {
            assert!(visible.contains(&field));
        }
        assert!(!visible.contains(&F::CustomSize));
        assert!(!visible.contains(&F::Model));
    }

    #[test]
    fn engraving_details_follow_the_engraving_choice() {
        let mut details = JobDetails {
            engraving: Some(Engraving::Decline),
            ..Default::default()
        };
        assert!(!ProductType::Award
            .visible_fields(&details)
            .contains(&F::EngravingDetails));
        details.engraving = Some(Engraving::Accept);
        let visible = ProductType::Trophy.visible_fields(&details);
        assert!(visible.contains(&F::EngravingDetails));
        assert!(visible.contains(&F::EngravingFiles));
    }

    #[test]
    fn other_type_asks_for_custom_type() {
        assert_eq!(
            ProductType::Other.detail_fields(),
            &[F::CustomType, F::Quantity, F::AttachedFiles]
        );
        assert_eq!(ProductType::Bottle.detail_fields(), &[F::Quantity, F::AttachedFiles]);
    }

    #[test]
    fn submit_action_by_type() {
        let production = [ProductType::Trophy, ProductType::Shirt, ProductType::Bib];
        for ty in ProductType::ALL {
            let expected = if production.contains(&ty) {
                SubmitAction::OrderProduction
            } else {
                SubmitAction::EstimatePrice
            };
            assert_eq!(ty.action(), expected);
        }
    }

    #[test]
    fn materials_depend_on_type() {
        assert_eq!(ProductType::Medal.materials()[0], "ซิงค์อัลลอย");
        assert_eq!(ProductType::Lanyard.materials().len(), 8);
        assert!(!ProductType::Shirt.has_materials());
    }

    #[test]
    fn serde_names_match_select_values() {
        let ty: ProductType = serde_json::from_value(json!("Box packaging")).unwrap();
        assert_eq!(ty, ProductType::BoxPackaging);
        assert_eq!("อื่นๆ".parse::<ProductType>().unwrap(), ProductType::Other);
        assert_eq!(serde_json::to_value(F::LanyardQuantity).unwrap(), json!("lanyardQuantity"));
    }

    #[test]
    fn prune_keeps_visible_values() {
        let mut details: JobDetails = serde_json::from_value(json!({
            "quantity": "10",
            "model": "A-1",
            "colors": ["shinny_gold"],
            "notes": ""
        }))
        .unwrap();
        assert!(details.notes.is_none());
        details.prune(&ProductType::Shirt.visible_fields(&details));
        assert_eq!(details.quantity.as_deref(), Some("10"));
        assert!(details.model.is_none());
        assert!(details.colors.is_empty());
    }

    #[test]
    fn option_values_are_checked() {
        let details = JobDetails {
            colors: vec!["neon_pink".into()],
            ..Default::default()
        };
        assert!(matches!(details.check_options(), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn quantity_is_free_text() {
        for quantity in ["1,500", "2.5", "ประมาณ 300"] {
            let details = JobDetails {
                quantity: Some(quantity.into()),
                ..Default::default()
            };
            assert!(details.check_options().is_ok(), "{quantity}");
        }
    }
}
