//! Intent classifier system prompt
//!
//! The prompt lists every category and intent the dispatcher understands,
//! with the fields each one needs, and fixes the reply format to a single
//! JSON object.

/// Intent catalogue, one block per category
const CATALOGUE: &str = r#"For 'customer' category:
- create_customer: Create a new customer (requires name, email, phone)
- update_customer: Update customer details (requires customerId and at least one field to update)
- delete_customer: Delete a customer (requires customerId)
- get_outstanding_bill: Get customer's outstanding bill (requires customerId)
- get_total_bill: Get customer's total bill (requires customerId)
- get_customer_by_name: Look up a customer (requires name)
- get_customer_details: Show a customer's details (requires name)

For 'business' category:
- register_business: Register a new business (requires name, phone, address, pincode, state, businessCategory, businessType)
- update_business: Update business details (the business is taken from the token; include only the fields to change)

For 'product' category:
- create_product: Create a new product (requires name, gstRate, rate)
- update_product: Update product details (requires productId and at least one field to update)
- delete_product: Delete a product (requires productId)
- get_product_by_name: Get product by name (requires name)
- get_all_products: Get all products of the dealer (no additional fields required; dealer id is taken from the token)

For 'sales' category:
- create_sale: Create a new sale (requires customerId, products array of {productId, quantity, rate, gstApplied}, paymentMethod, optional amountPaid)
- generate_invoice: Generate an invoice (requires saleId, recipientEmail)

For 'dealer' category (no additional fields required; dealer id is taken from the token):
- get_outstanding_bill: Get dealer's outstanding bill
- get_total_bill: Get dealer's total bill
- get_pending_balance: Get all customers with pending balance
- get_all_customer: Get all customers
- get_weekly_sale: Get dealer's weekly sale
- get_monthly_sale: Get dealer's monthly sale
- get_value_sale: Get top customers by business value"#;

/// Generates the classifier system prompt
///
/// # Examples
///
/// ```
/// use vypar::prompts::classifier_prompt::generate_classifier_prompt;
///
/// let prompt = generate_classifier_prompt();
/// assert!(prompt.contains("create_customer"));
/// ```
pub fn generate_classifier_prompt() -> String {
    format!(
        "You are an assistant that detects intents from user queries and extracts relevant data.\n\
         Categorize the request into one of five categories: 'customer', 'business', 'product', \
         'sales', or 'dealer', then pick the specific intent.\n\n\
         {}\n\n\
         Extract every field value the user mentions, using the exact field names above. \
         Do not invent values that were not given; leave unknown fields out.\n\
         Respond with only a JSON object containing 'category', 'intent', and 'data' fields.",
        CATALOGUE
    )
}
