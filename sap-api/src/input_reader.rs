//! Turns an inbound queue payload into a [`RequestCommand`].
//!
//! Extraction never fails: absent or wrongly typed fields decode to their
//! defaults, and downstream SAP calls receive the empty values as-is.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Accepter sentinel that selects every known sub-resource.
pub const ACCEPT_ALL: &str = "All";

/// The SAP sub-resources an accepter entry can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubResource {
    BusinessUserCollection,
    EmployeeBasicData,
}

impl SubResource {
    pub const ALL: [SubResource; 2] = [
        SubResource::BusinessUserCollection,
        SubResource::EmployeeBasicData,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            SubResource::BusinessUserCollection => "BusinessUserCollection",
            SubResource::EmployeeBasicData => "EmployeeBasicData",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestCommand {
    pub employee_id: String,
    pub user_id: String,
    /// Sub-resource names in request order. Unknown names are kept and later ignored.
    pub accepter: Vec<String>,
}

impl RequestCommand {
    pub fn from_payload(data: &serde_json::Value) -> Self {
        let sdc: Sdc = keyed_from_value(data.clone());

        RequestCommand {
            employee_id: sdc.business_user_collection.employee_id,
            user_id: sdc
                .business_user_collection
                .business_user_business_role_assignment
                .employee_basic_data
                .user_id,
            accepter: resolve_accepter(sdc.accepter),
        }
    }
}

/// An empty list, or one whose first entry is `All`, expands to every sub-resource.
pub fn resolve_accepter(accepter: Vec<String>) -> Vec<String> {
    match accepter.first() {
        None => all_sub_resources(),
        Some(first) if first == ACCEPT_ALL => all_sub_resources(),
        Some(_) => accepter,
    }
}

fn all_sub_resources() -> Vec<String> {
    SubResource::ALL
        .iter()
        .map(|r| r.as_str().to_string())
        .collect()
}

#[derive(Default, Deserialize)]
struct Sdc {
    #[serde(rename = "BusinessUserCollection", default, deserialize_with = "keyed")]
    business_user_collection: SdcBusinessUserCollection,
    #[serde(rename = "Accepter", default, deserialize_with = "lenient")]
    accepter: Vec<String>,
}

#[derive(Default, Deserialize)]
struct SdcBusinessUserCollection {
    #[serde(rename = "EmployeeID", default, deserialize_with = "lenient")]
    employee_id: String,
    #[serde(
        rename = "BusinessUserBusinessRoleAssignment",
        default,
        deserialize_with = "keyed"
    )]
    business_user_business_role_assignment: SdcRoleAssignment,
}

#[derive(Default, Deserialize)]
struct SdcRoleAssignment {
    #[serde(rename = "EmployeeBasicData", default, deserialize_with = "keyed")]
    employee_basic_data: SdcEmployeeBasicData,
}

#[derive(Default, Deserialize)]
struct SdcEmployeeBasicData {
    #[serde(rename = "UserID", default, deserialize_with = "lenient")]
    user_id: String,
}

fn lenient_from_value<T: DeserializeOwned + Default>(value: serde_json::Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Nested sections are only read from JSON objects. serde would otherwise
/// fill a struct from an array by position.
fn keyed_from_value<T: DeserializeOwned + Default>(value: serde_json::Value) -> T {
    match value {
        serde_json::Value::Object(_) => lenient_from_value(value),
        _ => T::default(),
    }
}

/// Field-level fallback: a value of the wrong shape becomes the default instead of an error.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(lenient_from_value(value))
}

fn keyed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(keyed_from_value(value))
}
