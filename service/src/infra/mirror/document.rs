//! [`Document`] projections of domain entities.

use std::fmt::Display;

use common::{Date, DateTimeOf, Money};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};
use serde_json::{json, Map, Value};

use crate::domain::{
    Lease, MaintenanceTicket, Notification, Payment, Property, RentalRequest,
    User,
};

/// Flattened JSON projection of an entity in a document store.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Name of the collection this [`Document`] belongs to.
    pub collection: &'static str,

    /// ID of the projected entity.
    pub id: String,

    /// Fields of this [`Document`].
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates a new [`Document`] out of the provided JSON object.
    fn new(collection: &'static str, id: impl Display, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(fields) => fields,
            other => Map::from_iter([("value".to_owned(), other)]),
        };
        Self {
            collection,
            id: id.to_string(),
            fields,
        }
    }
}

/// Entity mirrored into a document store.
pub trait Mirrored {
    /// Projects this entity into a [`Document`].
    fn to_document(&self) -> Document;
}

/// Projects a kind into its lowercase `snake_case` name.
fn kind(val: impl Display) -> String {
    val.to_string().to_lowercase()
}

/// Projects a [`Decimal`] into a floating point number.
fn number(val: Decimal) -> Option<f64> {
    val.to_f64()
}

/// Projects the amount of a [`Money`] into a floating point number.
fn amount(money: Money) -> Option<f64> {
    number(money.amount)
}

/// Projects a [`DateTimeOf`] into an ISO 8601 string.
fn timestamp<Of: ?Sized>(dt: DateTimeOf<Of>) -> String {
    dt.to_rfc3339()
}

/// Projects a [`Date`] into an ISO 8601 string.
fn date(d: Date) -> String {
    d.to_string()
}

/// Projects an optional displayable value into a string.
fn text<T: Display>(val: Option<&T>) -> Option<String> {
    val.map(ToString::to_string)
}

impl Mirrored for User {
    fn to_document(&self) -> Document {
        Document::new(
            "users",
            self.id,
            json!({
                "name": self.name.to_string(),
                "login": self.login.to_string(),
                "kind": kind(self.kind),
                "national_id": text(self.national_id.as_ref()),
                "email": text(self.email.as_ref()),
                "phone": text(self.phone.as_ref()),
                "created_at": timestamp(self.created_at),
                "deleted_at": self.deleted_at.map(timestamp),
            }),
        )
    }
}

impl Mirrored for Property {
    fn to_document(&self) -> Document {
        let location = &self.location;
        let features = &self.features;
        Document::new(
            "properties",
            self.id,
            json!({
                "owner_id": self.owner_id.to_string(),
                "title": self.title.to_string(),
                "description": self.description.to_string(),
                "category": kind(self.category),
                "status": kind(self.status),
                "address": location.address.to_string(),
                "city": location.city.to_string(),
                "neighborhood": text(location.neighborhood.as_ref()),
                "zip_code": text(location.zip_code.as_ref()),
                "area": number(features.area.square_meters()),
                "bedrooms": features.bedrooms,
                "bathrooms": features.bathrooms,
                "parking_spots": features.parking_spots,
                "floor": features.floor,
                "is_furnished": features.is_furnished,
                "allows_pets": features.allows_pets,
                "has_water": features.utilities.water,
                "has_electricity": features.utilities.electricity,
                "has_gas": features.utilities.gas,
                "has_internet": features.utilities.internet,
                "rent": amount(self.rent),
                "administration_fee": amount(self.administration_fee),
                "deposit": amount(self.deposit),
                "total_price": amount(self.total_price()),
                "currency": self.rent.currency.to_string(),
                "is_active": self.is_active,
                "created_at": timestamp(self.created_at),
                "updated_at": timestamp(self.updated_at),
            }),
        )
    }
}

impl Mirrored for RentalRequest {
    fn to_document(&self) -> Document {
        Document::new(
            "rental_requests",
            self.id,
            json!({
                "property_id": self.property_id.to_string(),
                "tenant_id": self.tenant_id.to_string(),
                "owner_id": self.owner_id.to_string(),
                "message": text(self.message.as_ref()),
                "status": kind(self.status),
                "lease_id": text(self.lease_id.as_ref()),
                "created_at": timestamp(self.created_at),
                "responded_at": self.responded_at.map(timestamp),
            }),
        )
    }
}

impl Mirrored for Lease {
    fn to_document(&self) -> Document {
        let terms = &self.terms;
        Document::new(
            "leases",
            self.id,
            json!({
                "number": self.number.to_string(),
                "property_id": self.property_id.to_string(),
                "owner_id": self.owner_id.to_string(),
                "tenant_id": self.tenant_id.to_string(),
                "rental_request_id": text(self.rental_request_id.as_ref()),
                "status": kind(self.status),
                "start_date": date(self.start_date),
                "end_date": date(self.end_date),
                "rent": amount(terms.rent),
                "administration_fee": amount(terms.administration_fee),
                "deposit": amount(terms.deposit),
                "monthly_total": amount(terms.monthly_total()),
                "currency": terms.rent.currency.to_string(),
                "due_day": terms.due_day.day(),
                "owner_signed_at": self
                    .owner_signature
                    .as_ref()
                    .map(|s| timestamp(s.signed_at)),
                "tenant_signed_at": self
                    .tenant_signature
                    .as_ref()
                    .map(|s| timestamp(s.signed_at)),
                "created_at": timestamp(self.created_at),
                "updated_at": timestamp(self.updated_at),
            }),
        )
    }
}

impl Mirrored for Payment {
    fn to_document(&self) -> Document {
        Document::new(
            "payments",
            self.id,
            json!({
                "number": self.number.to_string(),
                "lease_id": self.lease_id.to_string(),
                "sequence": self.sequence,
                "concept": self.concept.to_string(),
                "period_start": date(self.period_start),
                "period_end": date(self.period_end),
                "due_date": date(self.due_date),
                "amount": amount(self.amount),
                "amount_paid": amount(self.amount_paid),
                "late_fee": amount(self.late_fee),
                "currency": self.amount.currency.to_string(),
                "status": kind(self.status(Date::today())),
                "paid_on": self.paid_on.map(date),
                "method": self.method.map(kind),
                "reference": text(self.reference.as_ref()),
                "invoiced_at": self.invoiced_at.map(timestamp),
                "created_at": timestamp(self.created_at),
            }),
        )
    }
}

impl Mirrored for MaintenanceTicket {
    fn to_document(&self) -> Document {
        Document::new(
            "maintenance_tickets",
            self.id,
            json!({
                "number": self.number.to_string(),
                "property_id": self.property_id.to_string(),
                "requester_id": self.requester_id.to_string(),
                "assignee_id": text(self.assignee_id.as_ref()),
                "title": self.title.to_string(),
                "category": kind(self.category),
                "priority": kind(self.priority),
                "status": kind(self.status),
                "location": text(self.location.as_ref()),
                "requested_at": timestamp(self.requested_at),
                "reviewed_at": self.reviewed_at.map(timestamp),
                "started_at": self.started_at.map(timestamp),
                "completed_at": self.completed_at.map(timestamp),
                "estimated_on": self.estimated_on.map(date),
                "estimated_cost": self.estimated_cost.and_then(amount),
                "final_cost": self.final_cost.and_then(amount),
                "cost_bearer": kind(self.cost_bearer),
                "resolution": text(self.resolution.as_ref()),
            }),
        )
    }
}

impl Mirrored for Notification {
    fn to_document(&self) -> Document {
        Document::new(
            "notifications",
            self.id,
            json!({
                "recipient_id": self.recipient_id.to_string(),
                "title": self.title.to_string(),
                "message": self.message.to_string(),
                "kind": kind(self.kind),
                "link": text(self.link.as_ref()),
                "priority": kind(self.priority),
                "is_read": self.is_read(),
                "read_at": self.read_at.map(timestamp),
                "created_at": timestamp(self.created_at),
            }),
        )
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Money};
    use serde_json::json;

    use crate::domain::{
        lease,
        payment::{self, schedule::Period},
        Payment,
    };

    use super::Mirrored as _;

    #[test]
    fn flattens_payment() {
        let payment = Payment::scheduled(
            payment::Number::new(2999, 7),
            lease::Id::new(),
            Money::from_str("1700000COP").unwrap(),
            Period {
                sequence: 3,
                start: Date::from_str("2999-03-10").unwrap(),
                end: Date::from_str("2999-04-09").unwrap(),
                due_date: Date::from_str("2999-04-05").unwrap(),
            },
        );

        let doc = payment.to_document();

        assert_eq!(doc.collection, "payments");
        assert_eq!(doc.id, payment.id.to_string());
        assert_eq!(doc.fields["number"], json!("PAG-2999-000007"));
        assert_eq!(doc.fields["concept"], json!("Rent for month 3"));
        assert_eq!(doc.fields["amount"], json!(1_700_000.0));
        assert_eq!(doc.fields["amount_paid"], json!(0.0));
        assert_eq!(doc.fields["currency"], json!("COP"));
        assert_eq!(doc.fields["due_date"], json!("2999-04-05"));
        assert_eq!(doc.fields["status"], json!("pending"));
        assert_eq!(doc.fields["paid_on"], json!(null));
    }
}
