use rusqlite::types::Value;

use crate::batch::{
    BatchError, BatchResult, ClassifierCompositeWriter, ExistenceValidator, SqlBatchWriter,
};

use super::domain::{CustomerUpdate, UpdateKind};

const FIND_CUSTOMER: &str = "SELECT COUNT(*) FROM customer WHERE customer_id = ?1";

const UPDATE_NAME: &str = "
    UPDATE customer
    SET    first_name = COALESCE(?2, first_name),
           middle_name = COALESCE(?3, middle_name),
           last_name = COALESCE(?4, last_name)
    WHERE  customer_id = ?1
";

const UPDATE_ADDRESS: &str = "
    UPDATE customer
    SET    address1 = COALESCE(?2, address1),
           address2 = COALESCE(?3, address2),
           city = COALESCE(?4, city),
           state = COALESCE(?5, state),
           postal_code = COALESCE(?6, postal_code)
    WHERE  customer_id = ?1
";

const UPDATE_CONTACT: &str = "
    UPDATE customer
    SET    email_address = COALESCE(?2, email_address),
           home_phone = COALESCE(?3, home_phone),
           cell_phone = COALESCE(?4, cell_phone),
           work_phone = COALESCE(?5, work_phone),
           notification_pref = COALESCE(?6, notification_pref)
    WHERE  customer_id = ?1
";

pub fn customer_validator() -> ExistenceValidator<CustomerUpdate> {
    ExistenceValidator::new("customer", FIND_CUSTOMER, CustomerUpdate::customer_id)
}

pub fn customer_update_writer() -> ClassifierCompositeWriter<CustomerUpdate> {
    ClassifierCompositeWriter::new()
        .register(
            UpdateKind::Name,
            SqlBatchWriter::new("customer_name", UPDATE_NAME, bind_name_update),
        )
        .register(
            UpdateKind::Address,
            SqlBatchWriter::new("customer_address", UPDATE_ADDRESS, bind_address_update),
        )
        .register(
            UpdateKind::Contact,
            SqlBatchWriter::new("customer_contact", UPDATE_CONTACT, bind_contact_update),
        )
}

fn text(value: &Option<String>) -> Value {
    match value {
        Some(value) => Value::Text(value.clone()),
        None => Value::Null,
    }
}

fn wrong_kind(update: &CustomerUpdate) -> BatchError {
    BatchError::UnroutableRecord {
        kind: format!("{:?}", update.kind()),
    }
}

pub(super) fn bind_name_update(update: &CustomerUpdate) -> BatchResult<Vec<Value>> {
    let CustomerUpdate::Name(name) = update else {
        return Err(wrong_kind(update));
    };
    Ok(vec![
        Value::Integer(name.customer_id),
        text(&name.first_name),
        text(&name.middle_name),
        text(&name.last_name),
    ])
}

pub(super) fn bind_address_update(update: &CustomerUpdate) -> BatchResult<Vec<Value>> {
    let CustomerUpdate::Address(address) = update else {
        return Err(wrong_kind(update));
    };
    Ok(vec![
        Value::Integer(address.customer_id),
        text(&address.address1),
        text(&address.address2),
        text(&address.city),
        text(&address.state),
        text(&address.postal_code),
    ])
}

pub(super) fn bind_contact_update(update: &CustomerUpdate) -> BatchResult<Vec<Value>> {
    let CustomerUpdate::Contact(contact) = update else {
        return Err(wrong_kind(update));
    };
    // notification_pref is a CHAR column; bind the digit as text
    let preference = contact
        .notification_preference
        .map(|value| Value::Text(value.to_string()))
        .unwrap_or(Value::Null);
    Ok(vec![
        Value::Integer(contact.customer_id),
        text(&contact.email_address),
        text(&contact.home_phone),
        text(&contact.cell_phone),
        text(&contact.work_phone),
        preference,
    ])
}
