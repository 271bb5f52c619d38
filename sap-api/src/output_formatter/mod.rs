//! Decodes SAP OData envelopes into flat records.
//!
//! Every conversion rejects an envelope with no results and keeps at most
//! [`MAX_RESULTS`] records, in server order.

mod records;
mod responses;

pub use records::{
    BusinessUser, BusinessUserCollection, EmployeeBasicData, ToBusinessUserBusinessRoleAssignment,
};

use crate::errors::FormatError;
use responses::{BusinessUserCollectionResult, Envelope};
use serde::de::DeserializeOwned;
use tracing::info;

pub const MAX_RESULTS: usize = 10;

pub fn convert_to_business_user_collection(
    raw: &[u8],
) -> Result<Vec<BusinessUserCollection>, FormatError> {
    let results: Vec<BusinessUserCollectionResult> = decode(raw, "BusinessUserCollection")?;

    Ok(results
        .into_iter()
        .map(|result| BusinessUserCollection {
            user: result.user,
            to_business_user_business_role_assignment: result
                .business_user_business_role_assignment
                .deferred
                .uri,
        })
        .collect())
}

pub fn convert_to_business_user_business_role_assignment(
    raw: &[u8],
) -> Result<Vec<ToBusinessUserBusinessRoleAssignment>, FormatError> {
    decode(raw, "ToBusinessUserBusinessRoleAssignment")
}

pub fn convert_to_employee_basic_data(raw: &[u8]) -> Result<Vec<EmployeeBasicData>, FormatError> {
    decode(raw, "EmployeeBasicData")
}

fn decode<T: DeserializeOwned>(raw: &[u8], entity: &'static str) -> Result<Vec<T>, FormatError> {
    let envelope: Envelope<T> =
        serde_json::from_slice(raw).map_err(|source| FormatError::Decode { entity, source })?;
    let mut results = envelope.d.results;

    if results.is_empty() {
        return Err(FormatError::EmptyResult { entity });
    }
    if results.len() > MAX_RESULTS {
        info!(
            entity,
            results = results.len(),
            "Too many results, keeping the first {MAX_RESULTS}"
        );
        results.truncate(MAX_RESULTS);
    }

    Ok(results)
}
