use crate::error::FormError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const COL_WORK_ORDER: &str = "WO #";
pub const COL_PROBLEM_DESCRIPTION: &str = "Problem Description";
pub const COL_SITE_NO: &str = "Site No.";
pub const COL_SITE_NAME: &str = "Site Name";
pub const COL_DATE_COMPLETED: &str = "Date Completed";

/// Column headers of a work-order export, in the order the template writes them.
pub const KNOWN_COLUMNS: [&str; 11] = [
    COL_WORK_ORDER,
    "Event/Activity",
    COL_PROBLEM_DESCRIPTION,
    "Status",
    COL_SITE_NO,
    "Site Type",
    COL_SITE_NAME,
    "Contractor",
    "Priority",
    "Date/Time Created",
    COL_DATE_COMPLETED,
];

/// One imported dataset row, keyed by header name.
///
/// Columns other than the known ones are kept but never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(HashMap<String, String>);

impl RawRecord {
    /// Cell value for `column`; an empty cell reads the same as a missing column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn work_order(&self) -> Option<&str> {
        self.get(COL_WORK_ORDER)
    }

    pub fn site_name(&self) -> Option<&str> {
        self.get(COL_SITE_NAME)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Form values derived from a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    pub won: String,
    pub store_number_name: String,
    pub edn_number: String,
    pub db_id: String,
    pub description: String,
    pub date_completed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Option<Self> {
        let mime = sniff_image_mime(&bytes)?;
        Some(Self {
            file_name: file_name.into(),
            mime,
            bytes,
        })
    }

    /// `data:<mime>;base64,<payload>`, the form browsers embed images in.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    First,
    Second,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSlot::First => f.write_str("Image 1"),
            ImageSlot::Second => f.write_str("Image 2"),
        }
    }
}

/// Every text field on the form that can be edited by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    EdnNumber,
    StoreNumberName,
    DbId,
    Description,
    BsEn,
    DeviceType,
    Rating,
    CsaLive,
    CsaCpc,
    Ze,
    Zs,
    R1R2,
    Rcd,
    DateCompleted,
    Won,
    TechnicianName,
    SupervisorName,
}

impl FormField {
    pub const ALL: [FormField; 17] = [
        FormField::EdnNumber,
        FormField::StoreNumberName,
        FormField::DbId,
        FormField::Description,
        FormField::BsEn,
        FormField::DeviceType,
        FormField::Rating,
        FormField::CsaLive,
        FormField::CsaCpc,
        FormField::Ze,
        FormField::Zs,
        FormField::R1R2,
        FormField::Rcd,
        FormField::DateCompleted,
        FormField::Won,
        FormField::TechnicianName,
        FormField::SupervisorName,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::EdnNumber => "ednNumber",
            FormField::StoreNumberName => "storeNumberName",
            FormField::DbId => "dbId",
            FormField::Description => "description",
            FormField::BsEn => "bsEn",
            FormField::DeviceType => "type",
            FormField::Rating => "rating",
            FormField::CsaLive => "csaLive",
            FormField::CsaCpc => "csaCpc",
            FormField::Ze => "ze",
            FormField::Zs => "zs",
            FormField::R1R2 => "r1r2",
            FormField::Rcd => "rcd",
            FormField::DateCompleted => "dateCompleted",
            FormField::Won => "won",
            FormField::TechnicianName => "technicianName",
            FormField::SupervisorName => "supervisorName",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = FormError;

    /// Accepts `dbId`, `db-id`, `db_id` and any casing thereof.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        FormField::ALL
            .into_iter()
            .find(|field| field.name().to_lowercase() == wanted)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

/// The complete editable form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub edn_number: String,
    pub store_number_name: String,
    pub db_id: String,
    pub description: String,

    // Protective device
    pub bs_en: String,
    pub device_type: String,
    pub rating: String,

    // Conductor
    pub csa_live: String,
    pub csa_cpc: String,

    // Test results
    pub ze: String,
    pub zs: String,
    pub r1r2: String,
    pub rcd: String,

    pub date_completed: String,
    pub won: String,
    pub technician_name: String,
    pub supervisor_name: String,

    pub image1: Option<ImageAttachment>,
    pub image2: Option<ImageAttachment>,
}

impl FormState {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::EdnNumber => &self.edn_number,
            FormField::StoreNumberName => &self.store_number_name,
            FormField::DbId => &self.db_id,
            FormField::Description => &self.description,
            FormField::BsEn => &self.bs_en,
            FormField::DeviceType => &self.device_type,
            FormField::Rating => &self.rating,
            FormField::CsaLive => &self.csa_live,
            FormField::CsaCpc => &self.csa_cpc,
            FormField::Ze => &self.ze,
            FormField::Zs => &self.zs,
            FormField::R1R2 => &self.r1r2,
            FormField::Rcd => &self.rcd,
            FormField::DateCompleted => &self.date_completed,
            FormField::Won => &self.won,
            FormField::TechnicianName => &self.technician_name,
            FormField::SupervisorName => &self.supervisor_name,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::EdnNumber => &mut self.edn_number,
            FormField::StoreNumberName => &mut self.store_number_name,
            FormField::DbId => &mut self.db_id,
            FormField::Description => &mut self.description,
            FormField::BsEn => &mut self.bs_en,
            FormField::DeviceType => &mut self.device_type,
            FormField::Rating => &mut self.rating,
            FormField::CsaLive => &mut self.csa_live,
            FormField::CsaCpc => &mut self.csa_cpc,
            FormField::Ze => &mut self.ze,
            FormField::Zs => &mut self.zs,
            FormField::R1R2 => &mut self.r1r2,
            FormField::Rcd => &mut self.rcd,
            FormField::DateCompleted => &mut self.date_completed,
            FormField::Won => &mut self.won,
            FormField::TechnicianName => &mut self.technician_name,
            FormField::SupervisorName => &mut self.supervisor_name,
        };
        *slot = value.into();
    }

    /// Overwrites only the fields a record selection produces.
    pub fn merge(&mut self, parsed: ParsedFields) {
        self.won = parsed.won;
        self.store_number_name = parsed.store_number_name;
        self.edn_number = parsed.edn_number;
        self.db_id = parsed.db_id;
        self.description = parsed.description;
        self.date_completed = parsed.date_completed;
    }

    pub fn image(&self, slot: ImageSlot) -> Option<&ImageAttachment> {
        match slot {
            ImageSlot::First => self.image1.as_ref(),
            ImageSlot::Second => self.image2.as_ref(),
        }
    }

    pub fn set_image(&mut self, slot: ImageSlot, image: ImageAttachment) {
        match slot {
            ImageSlot::First => self.image1 = Some(image),
            ImageSlot::Second => self.image2 = Some(image),
        }
    }
}
