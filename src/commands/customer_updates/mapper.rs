use crate::batch::{BatchError, BatchResult, FieldSet, LayoutConfig, TokenizerConfig};

use super::domain::{
    CustomerAddressUpdate, CustomerContactUpdate, CustomerNameUpdate, CustomerUpdate,
};

const NAME_RECORD: i32 = 1;
const ADDRESS_RECORD: i32 = 2;
const CONTACT_RECORD: i32 = 3;

const NAME_FIELDS: [&str; 5] = [
    "recordId",
    "customerId",
    "firstName",
    "middleName",
    "lastName",
];
const ADDRESS_FIELDS: [&str; 7] = [
    "recordId",
    "customerId",
    "address1",
    "address2",
    "city",
    "state",
    "postalCode",
];
const CONTACT_FIELDS: [&str; 7] = [
    "recordId",
    "customerId",
    "emailAddress",
    "homePhone",
    "cellPhone",
    "workPhone",
    "notificationPreference",
];

pub fn customer_update_layouts() -> TokenizerConfig {
    fn layout(pattern: &str, names: &[&str]) -> LayoutConfig {
        LayoutConfig {
            pattern: pattern.to_string(),
            names: names.iter().map(|name| name.to_string()).collect(),
        }
    }

    TokenizerConfig::delimited(vec![
        layout("1*", &NAME_FIELDS),
        layout("2*", &ADDRESS_FIELDS),
        layout("3*", &CONTACT_FIELDS),
    ])
}

pub fn map_customer_update(fields: &FieldSet) -> BatchResult<CustomerUpdate> {
    let record_id = fields.read_i32("recordId")?;

    let update = match record_id {
        NAME_RECORD => CustomerUpdate::Name(CustomerNameUpdate {
            customer_id: fields.read_i64("customerId")?,
            first_name: fields.read_optional_string("firstName")?,
            middle_name: fields.read_optional_string("middleName")?,
            last_name: fields.read_optional_string("lastName")?,
        }),
        ADDRESS_RECORD => CustomerUpdate::Address(CustomerAddressUpdate {
            customer_id: fields.read_i64("customerId")?,
            address1: fields.read_optional_string("address1")?,
            address2: fields.read_optional_string("address2")?,
            city: fields.read_optional_string("city")?,
            state: fields.read_optional_string("state")?,
            postal_code: fields.read_optional_string("postalCode")?,
        }),
        CONTACT_RECORD => CustomerUpdate::Contact(CustomerContactUpdate {
            customer_id: fields.read_i64("customerId")?,
            email_address: fields.read_optional_string("emailAddress")?,
            home_phone: fields.read_optional_string("homePhone")?,
            cell_phone: fields.read_optional_string("cellPhone")?,
            work_phone: fields.read_optional_string("workPhone")?,
            notification_preference: fields.read_optional_i32("notificationPreference")?,
        }),
        _ => {
            return Err(BatchError::UnrecognizedRecordType {
                record: format!(
                    "recordId {} (layout {:?})",
                    fields.discriminator(),
                    fields.pattern()
                ),
            });
        }
    };

    Ok(update)
}
