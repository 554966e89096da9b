//! Static registry of attachment fields.
//!
//! Every logical document slot the rest of the system can touch resolves
//! here to exactly one spec: which storage container its bytes land in,
//! which folder inside the record's prefix, and how the record's metadata
//! value is shaped. Adding a document slot is a table edit, nothing else.
//!
//! Two families of fields dispatch dynamically instead of having one row
//! per room: `marketing_photos_<room>` and `incident_photos_<room>` resolve
//! through the room-name maps below into a nested-gallery target.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Storage container family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// World-readable (marketing photos, floor plan images).
    Public,
    /// Access-restricted; reads require a signed URL.
    Restricted,
}

impl Container {
    /// Physical container name in the object store.
    pub fn name(&self) -> &'static str {
        match self {
            Container::Public => "property-media",
            Container::Restricted => "property-docs",
        }
    }

    /// Reverse lookup from a physical container name, used when recovering
    /// a storage location from a previously issued access URL.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "property-media" => Some(Container::Public),
            "property-docs" => Some(Container::Restricted),
            _ => None,
        }
    }

    /// Public containers issue plain URLs; restricted ones need signing.
    pub fn is_public(&self) -> bool {
        matches!(self, Container::Public)
    }
}

/// Shape of the metadata value a field stores on its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Nullable URL string.
    Scalar,
    /// Ordered list of URL strings.
    FlatArray,
    /// Ordered list of `{title, url, createdAt}` entries.
    TaggedArray,
    /// Per-room photo galleries; only produced by the dynamic field
    /// families, never by a static table row.
    RoomGallery,
}

/// Static registry row.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub container: Container,
    pub folder: &'static str,
    pub shape: ValueShape,
}

/// Photo category within a room gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoCategory {
    Marketing,
    Incident,
}

impl PhotoCategory {
    fn field_prefix(&self) -> &'static str {
        match self {
            PhotoCategory::Marketing => "marketing_photos_",
            PhotoCategory::Incident => "incident_photos_",
        }
    }
}

/// How a room within a gallery is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAddress {
    /// Rooms stored as an ordered list, addressed by integer index
    /// (bedrooms, bathrooms). The record field holds an array of rooms.
    Indexed(&'static str),
    /// One record per room name (kitchen, exterior, ...). The record field
    /// holds a single room object.
    Singleton(&'static str),
}

impl RoomAddress {
    /// The record metadata field this room lives under.
    pub fn record_field(&self) -> &'static str {
        match self {
            RoomAddress::Indexed(f) | RoomAddress::Singleton(f) => f,
        }
    }
}

/// Mutation target derived from a field's shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTarget {
    Scalar,
    FlatArray,
    TaggedArray,
    RoomPhotos {
        room: RoomAddress,
        category: PhotoCategory,
    },
}

/// Fully resolved attachment field: everything the path resolver, mutation
/// engine, and orchestrator need to know about one logical field name.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// The caller-supplied logical field name.
    pub field_name: String,
    pub container: Container,
    /// Folder inside the record's storage prefix.
    pub folder: String,
    pub target: FieldTarget,
}

impl ResolvedField {
    /// The record metadata field this attachment mutates. Identical to the
    /// logical name except for room galleries, where all photo fields of a
    /// room collapse onto that room's record field.
    pub fn record_field(&self) -> &str {
        match &self.target {
            FieldTarget::RoomPhotos { room, .. } => room.record_field(),
            _ => &self.field_name,
        }
    }
}

const P: Container = Container::Public;
const R: Container = Container::Restricted;
const SC: ValueShape = ValueShape::Scalar;
const FA: ValueShape = ValueShape::FlatArray;
const TA: ValueShape = ValueShape::TaggedArray;

macro_rules! field {
    ($name:literal, $container:expr, $folder:literal, $shape:expr) => {
        FieldSpec {
            name: $name,
            container: $container,
            folder: $folder,
            shape: $shape,
        }
    };
}

/// Every statically named attachment field.
pub const FIELD_SPECS: &[FieldSpec] = &[
    // Property: legal
    field!("doc_energy_cert", R, "legal", SC),
    field!("doc_habitability_cert", R, "legal", SC),
    field!("doc_property_deed", R, "legal", SC),
    field!("doc_simple_note", R, "legal", SC),
    field!("doc_cadastral_record", R, "legal", SC),
    field!("doc_tourist_license", R, "legal", SC),
    field!("doc_first_occupancy_license", R, "legal", SC),
    field!("doc_community_statutes", R, "legal", SC),
    // Property: technical
    field!("doc_floor_plan", R, "technical", SC),
    field!("doc_ite_report", R, "technical", SC),
    field!("doc_boiler_revision", R, "technical", SC),
    field!("doc_electrical_cert", R, "technical", SC),
    field!("doc_gas_cert", R, "technical", SC),
    field!("doc_elevator_contract", R, "technical", SC),
    field!("blueprint_scans", R, "technical", FA),
    // Property: financial
    field!("doc_ibi_receipt", R, "financial", SC),
    field!("doc_garbage_tax_receipt", R, "financial", SC),
    field!("doc_community_fees_receipt", R, "financial", SC),
    field!("doc_home_insurance_policy", R, "financial", SC),
    field!("doc_mortgage_statement", R, "financial", SC),
    // Property: supplies
    field!("doc_electricity_bill", R, "supplies", SC),
    field!("doc_water_bill", R, "supplies", SC),
    field!("doc_gas_bill", R, "supplies", SC),
    field!("doc_internet_bill", R, "supplies", SC),
    field!("meter_photos", R, "supplies", FA),
    // Property: marketing
    field!("cover_photo", P, "marketing", SC),
    field!("video_tour", P, "marketing", SC),
    field!("gallery_photos", P, "marketing", FA),
    field!("floor_plan_images", P, "marketing", FA),
    // Property: works and incidents
    field!("incident_invoices", R, "incidents", FA),
    field!("renovation_quotes", R, "renovation", FA),
    field!("renovation_invoices", R, "renovation", FA),
    field!("inventory_photos", R, "inventory", FA),
    // Tenant / lead: identity
    field!("tenant_id_front", R, "tenant/identity", SC),
    field!("tenant_id_back", R, "tenant/identity", SC),
    field!("tenant_passport", R, "tenant/identity", SC),
    field!("guarantor_id_front", R, "tenant/identity", SC),
    field!("guarantor_id_back", R, "tenant/identity", SC),
    // Tenant / lead: income
    field!("tenant_work_contract", R, "tenant/income", SC),
    field!("tenant_tax_return", R, "tenant/income", SC),
    field!("tenant_payslips", R, "tenant/income", FA),
    field!("tenant_bank_statements", R, "tenant/income", FA),
    field!("guarantor_payslip", R, "tenant/income", SC),
    field!("lead_solvency_report", R, "tenant/income", SC),
    // Lease
    field!("lease_contract_draft", R, "lease", SC),
    field!("lease_contract_signed", R, "lease", SC),
    field!("lease_inventory_report", R, "lease", SC),
    field!("lease_checkin_report", R, "lease", SC),
    field!("lease_checkout_report", R, "lease", SC),
    field!("deposit_receipt", R, "lease", SC),
    field!("deposit_return_receipt", R, "lease", SC),
    field!("insurance_certificate", R, "lease", SC),
    field!("lease_annexes", R, "lease/annexes", TA),
    // User-titled custom document folders
    field!("custom_legal_documents", R, "custom/legal", TA),
    field!("custom_technical_documents", R, "custom/technical", TA),
    field!("custom_supply_documents", R, "custom/supplies", TA),
    field!("custom_financial_documents", R, "custom/financial", TA),
    field!("custom_other_documents", R, "custom/other", TA),
];

static FIELDS_BY_NAME: Lazy<HashMap<&'static str, &'static FieldSpec>> =
    Lazy::new(|| FIELD_SPECS.iter().map(|s| (s.name, s)).collect());

/// Rooms addressed by integer index within an ordered list.
pub const INDEXED_ROOMS: &[&str] = &["bedrooms", "bathrooms"];

/// Rooms addressed by fixed name, one record each.
pub const SINGLETON_ROOMS: &[&str] = &[
    "kitchen",
    "living_room",
    "dining_room",
    "hallway",
    "exterior",
    "terrace",
    "garage",
    "storage_room",
];

static ROOMS_BY_NAME: Lazy<HashMap<&'static str, RoomAddress>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for room in INDEXED_ROOMS {
        map.insert(*room, RoomAddress::Indexed(*room));
    }
    for room in SINGLETON_ROOMS {
        map.insert(*room, RoomAddress::Singleton(*room));
    }
    map
});

fn resolve_room_photos(field_name: &str) -> Option<ResolvedField> {
    for category in [PhotoCategory::Marketing, PhotoCategory::Incident] {
        if let Some(room_name) = field_name.strip_prefix(category.field_prefix()) {
            let room = *ROOMS_BY_NAME.get(room_name)?;
            let (container, folder_root) = match category {
                PhotoCategory::Marketing => (Container::Public, "marketing/rooms"),
                PhotoCategory::Incident => (Container::Restricted, "incidents/rooms"),
            };
            return Some(ResolvedField {
                field_name: field_name.to_string(),
                container,
                folder: format!("{}/{}", folder_root, room_name),
                target: FieldTarget::RoomPhotos { room, category },
            });
        }
    }
    None
}

/// Resolve a logical field name to its spec.
///
/// Exact table entries win over the dynamic room-photo families. An unknown
/// field name is a hard error; callers must never treat it as a no-op.
pub fn resolve(field_name: &str) -> Result<ResolvedField> {
    if let Some(spec) = FIELDS_BY_NAME.get(field_name) {
        let target = match spec.shape {
            ValueShape::Scalar => FieldTarget::Scalar,
            ValueShape::FlatArray => FieldTarget::FlatArray,
            ValueShape::TaggedArray => FieldTarget::TaggedArray,
            // Room galleries only exist as dynamic families.
            ValueShape::RoomGallery => {
                return Err(Error::Internal(format!(
                    "registry row {} declares a room gallery shape",
                    spec.name
                )))
            }
        };
        return Ok(ResolvedField {
            field_name: field_name.to_string(),
            container: spec.container,
            folder: spec.folder.to_string(),
            target,
        });
    }

    resolve_room_photos(field_name).ok_or_else(|| Error::UnknownField(field_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_no_duplicate_names() {
        assert_eq!(FIELDS_BY_NAME.len(), FIELD_SPECS.len());
    }

    #[test]
    fn test_resolve_scalar_field() {
        let field = resolve("doc_energy_cert").unwrap();
        assert_eq!(field.container, Container::Restricted);
        assert_eq!(field.folder, "legal");
        assert_eq!(field.target, FieldTarget::Scalar);
        assert_eq!(field.record_field(), "doc_energy_cert");
    }

    #[test]
    fn test_resolve_flat_array_field() {
        let field = resolve("gallery_photos").unwrap();
        assert_eq!(field.container, Container::Public);
        assert_eq!(field.target, FieldTarget::FlatArray);
    }

    #[test]
    fn test_resolve_tagged_array_field() {
        let field = resolve("custom_legal_documents").unwrap();
        assert_eq!(field.container, Container::Restricted);
        assert_eq!(field.folder, "custom/legal");
        assert_eq!(field.target, FieldTarget::TaggedArray);
    }

    #[test]
    fn test_resolve_indexed_room_marketing_photos() {
        let field = resolve("marketing_photos_bedrooms").unwrap();
        assert_eq!(field.container, Container::Public);
        assert_eq!(field.folder, "marketing/rooms/bedrooms");
        assert_eq!(
            field.target,
            FieldTarget::RoomPhotos {
                room: RoomAddress::Indexed("bedrooms"),
                category: PhotoCategory::Marketing,
            }
        );
        assert_eq!(field.record_field(), "bedrooms");
    }

    #[test]
    fn test_resolve_singleton_room_incident_photos() {
        let field = resolve("incident_photos_kitchen").unwrap();
        assert_eq!(field.container, Container::Restricted);
        assert_eq!(field.folder, "incidents/rooms/kitchen");
        assert_eq!(
            field.target,
            FieldTarget::RoomPhotos {
                room: RoomAddress::Singleton("kitchen"),
                category: PhotoCategory::Incident,
            }
        );
        assert_eq!(field.record_field(), "kitchen");
    }

    #[test]
    fn test_resolve_room_with_underscored_name() {
        let field = resolve("marketing_photos_living_room").unwrap();
        assert_eq!(field.record_field(), "living_room");
    }

    #[test]
    fn test_unknown_field_is_hard_error() {
        let err = resolve("doc_definitely_not_registered").unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
    }

    #[test]
    fn test_unknown_room_is_hard_error() {
        let err = resolve("marketing_photos_ballroom").unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
    }

    #[test]
    fn test_container_name_round_trip() {
        for container in [Container::Public, Container::Restricted] {
            assert_eq!(Container::from_name(container.name()), Some(container));
        }
        assert_eq!(Container::from_name("someone-elses-bucket"), None);
    }

    #[test]
    fn test_every_room_resolves_for_both_categories() {
        for room in INDEXED_ROOMS.iter().chain(SINGLETON_ROOMS) {
            for prefix in ["marketing_photos_", "incident_photos_"] {
                let name = format!("{}{}", prefix, room);
                let field = resolve(&name).unwrap();
                assert!(matches!(field.target, FieldTarget::RoomPhotos { .. }), "{}", name);
            }
        }
    }
}
