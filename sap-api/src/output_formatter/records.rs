//! Flat records published downstream. Keys keep the SAP property names.

use serde::{Deserialize, Serialize};

/// Properties of a `BusinessUserCollection` entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct BusinessUser {
    #[serde(rename = "ObjectID")]
    pub object_id: String,
    pub e_tag: Option<String>,
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    #[serde(rename = "EmployeeUUID")]
    pub employee_uuid: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "TechnicalUserID")]
    pub technical_user_id: String,
    #[serde(rename = "IdentityUUID")]
    pub identity_uuid: String,
    #[serde(rename = "BusinessPartnerID")]
    pub business_partner_id: String,
    pub business_partner_formatted_name: String,
    pub department_name: String,
    pub company_name: String,
    pub manager_name: String,
    #[serde(rename = "EmailURI")]
    pub email_uri: String,
    pub decimal_format_code: String,
    pub decimal_format_code_text: String,
    pub date_format_code: String,
    pub date_format_code_text: String,
    pub time_format_code: String,
    pub time_format_code_text: String,
    pub time_zone_code: String,
    pub time_zone_code_text: String,
    pub logon_language_code: String,
    pub logon_language_code_text: String,
    pub user_validity_start_date: Option<String>,
    pub user_validity_end_date: Option<String>,
    pub user_locked_indicator: bool,
    pub user_counted_indicator: bool,
    pub password_policy_code: String,
    pub password_policy_code_text: String,
    pub password_inactive_indicator: bool,
    pub password_locked_indicator: bool,
    pub user_account_type_code: String,
    pub user_account_type_code_text: String,
    pub created_on: Option<String>,
    pub user_created_by: String,
    pub entity_last_changed_on: Option<String>,
    pub user_changed_by: String,
    pub user_changed_on: Option<String>,
}

/// A business user plus the URL of its role assignments.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BusinessUserCollection {
    #[serde(flatten)]
    pub user: BusinessUser,
    /// Deferred navigation link; already carries its own query parameters.
    #[serde(rename = "ToBusinessUserBusinessRoleAssignment")]
    pub to_business_user_business_role_assignment: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct ToBusinessUserBusinessRoleAssignment {
    #[serde(rename = "ObjectID")]
    pub object_id: String,
    #[serde(rename = "ParentObjectID")]
    pub parent_object_id: String,
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "BusinessRoleID")]
    pub business_role_id: String,
    pub entity_last_changed_on: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct EmployeeBasicData {
    #[serde(rename = "ObjectID")]
    pub object_id: String,
    pub e_tag: Option<String>,
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    #[serde(rename = "EmployeeUUID")]
    pub employee_uuid: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "IdentityUUID")]
    pub identity_uuid: String,
    #[serde(rename = "BusinessPartnerID")]
    pub business_partner_id: String,
    pub current_internal_employee_indicator: bool,
    pub current_external_employee_indicator: bool,
    pub formatted_name: String,
    pub title_code: String,
    pub academic_title_code: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub nick_name: String,
    pub gender_code: String,
    pub language_code: String,
    pub formatted_address: String,
    pub country_code: String,
    pub region_code: String,
    pub address_line1: String,
    pub address_line2: String,
    pub house_number: String,
    pub street: String,
    pub address_line4: String,
    pub address_line5: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    pub mobile: String,
    pub fax: String,
    pub email: String,
    pub user_validity_start_date: Option<String>,
    pub user_validity_end_date: Option<String>,
    pub user_password_policy_code: String,
    pub user_locked_indicator: bool,
    pub time_zone_code: String,
    #[serde(rename = "ManagerUUID")]
    pub manager_uuid: String,
    pub manager_formatted_name: String,
    pub job_name: String,
    pub created_on: Option<String>,
    pub created_by: String,
    pub changed_on: Option<String>,
    pub changed_by: String,
    pub entity_last_changed_on: Option<String>,
}
