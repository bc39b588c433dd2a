use crate::batch::Classified;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerNameUpdate {
    pub customer_id: i64,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerAddressUpdate {
    pub customer_id: i64,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerContactUpdate {
    pub customer_id: i64,
    pub email_address: Option<String>,
    pub home_phone: Option<String>,
    pub cell_phone: Option<String>,
    pub work_phone: Option<String>,
    pub notification_preference: Option<i32>,
}

// `None` fields leave the stored column untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerUpdate {
    Name(CustomerNameUpdate),
    Address(CustomerAddressUpdate),
    Contact(CustomerContactUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Name,
    Address,
    Contact,
}

impl CustomerUpdate {
    pub fn customer_id(&self) -> i64 {
        match self {
            CustomerUpdate::Name(update) => update.customer_id,
            CustomerUpdate::Address(update) => update.customer_id,
            CustomerUpdate::Contact(update) => update.customer_id,
        }
    }

    pub fn kind(&self) -> UpdateKind {
        match self {
            CustomerUpdate::Name(_) => UpdateKind::Name,
            CustomerUpdate::Address(_) => UpdateKind::Address,
            CustomerUpdate::Contact(_) => UpdateKind::Contact,
        }
    }
}

impl Classified for CustomerUpdate {
    type Tag = UpdateKind;

    fn tag(&self) -> UpdateKind {
        self.kind()
    }
}
