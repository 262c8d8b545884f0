//! Field requirement table
//!
//! Static lookup from `(category, intent)` to the fields that must be
//! present before the intent may be dispatched. Unknown pairs require
//! nothing; rejecting them is the dispatcher's job.

use super::envelope::has_value;
use serde_json::{Map, Value};

/// Required fields of one intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    /// Canonical field order used when reporting missing fields
    pub fields: &'static [&'static str],
    /// Any of these fields, when present, identifies the record instead
    pub satisfied_by: &'static [&'static str],
}

const NONE: Requirement = Requirement {
    fields: &[],
    satisfied_by: &[],
};

const fn fields(fields: &'static [&'static str]) -> Requirement {
    Requirement {
        fields,
        satisfied_by: &[],
    }
}

/// Customer lookups accept a name or email in place of the id.
const CUSTOMER_IDENTITY: Requirement = Requirement {
    fields: &["customerId"],
    satisfied_by: &["customerId", "name", "email"],
};

/// Requirement for a `(category, intent)` pair
pub fn requirement(category: &str, intent: &str) -> Requirement {
    match (category, intent) {
        ("customer", "create_customer") => fields(&["name", "email", "phone"]),
        (
            "customer",
            "update_customer" | "delete_customer" | "get_outstanding_bill" | "get_total_bill",
        ) => CUSTOMER_IDENTITY,
        ("customer", "get_customer_by_name" | "get_customer_details") => fields(&["name"]),

        ("business", "register_business") => fields(&[
            "name",
            "phone",
            "address",
            "pincode",
            "state",
            "businessCategory",
            "businessType",
        ]),
        ("business", "update_business") => NONE,

        ("product", "create_product") => fields(&["name", "gstRate", "rate"]),
        ("product", "update_product" | "delete_product") => fields(&["productId"]),
        ("product", "get_product_by_name") => fields(&["name"]),
        ("product", "get_all_products") => NONE,

        ("sales", "create_sale") => fields(&["customerId", "products", "paymentMethod"]),
        ("sales", "generate_invoice") => fields(&["saleId", "recipientEmail"]),

        // Dealer reports take the dealer from the bearer token.
        ("dealer", _) => NONE,

        _ => NONE,
    }
}

/// Required field names for a `(category, intent)` pair, in canonical order
///
/// # Examples
///
/// ```
/// use vypar::intent::required_fields;
///
/// assert_eq!(required_fields("customer", "create_customer"), &["name", "email", "phone"]);
/// assert!(required_fields("dealer", "get_total_bill").is_empty());
/// assert!(required_fields("weather", "forecast").is_empty());
/// ```
pub fn required_fields(category: &str, intent: &str) -> &'static [&'static str] {
    requirement(category, intent).fields
}

/// Required fields that are absent or null in `data`, in canonical order
///
/// # Examples
///
/// ```
/// use vypar::intent::missing_fields;
/// use serde_json::json;
///
/// let data = json!({"phone": "555", "name": null});
/// let missing = missing_fields("customer", "create_customer", data.as_object().unwrap());
/// assert_eq!(missing, vec!["name", "email"]);
/// ```
pub fn missing_fields(category: &str, intent: &str, data: &Map<String, Value>) -> Vec<String> {
    let req = requirement(category, intent);

    if req.satisfied_by.iter().any(|f| has_value(data, f)) {
        return Vec::new();
    }

    req.fields
        .iter()
        .filter(|f| !has_value(data, f))
        .map(|f| f.to_string())
        .collect()
}
