//! Raw OData v2 response shapes as returned by the `c4codataapi` service.

use super::records::BusinessUser;
use serde::Deserialize;

/// `{"d": {"results": [...]}}`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub d: Results<T>,
}

#[derive(Debug, Deserialize)]
pub struct Results<T> {
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct BusinessUserCollectionResult {
    #[serde(flatten)]
    pub user: BusinessUser,
    #[serde(rename = "BusinessUserBusinessRoleAssignment", default)]
    pub business_user_business_role_assignment: Navigation,
}

/// A navigation property that the service did not expand.
#[derive(Debug, Default, Deserialize)]
pub struct Navigation {
    #[serde(rename = "__deferred", default)]
    pub deferred: Deferred,
}

#[derive(Debug, Default, Deserialize)]
pub struct Deferred {
    #[serde(default)]
    pub uri: String,
}
