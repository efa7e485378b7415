//! Client-side form checks.
//!
//! Each form validates locally before any request goes out and maps a failed
//! request's field errors back onto its own fields.

use trustmart_core::validation::SUBMIT;
use trustmart_core::{HttpError, NewDelivery, NewProduct, Product, UpdateProduct, ValidationErrors};

/// Message shown when email verification fails for any reason.
pub const VERIFY_FAILED: &str = "Verification failed. Check code and try again.";

/// Length of the emailed one-time code.
pub const OTP_LENGTH: usize = 6;

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn parse_price(value: &str, errors: &mut ValidationErrors) -> Option<f64> {
    if blank(value) {
        errors.insert("price", "Price is required");
        return None;
    }
    match value.trim().parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Some(p),
        _ => {
            errors.insert("price", "Price must be a number");
            None
        }
    }
}

fn parse_quantity(value: &str, errors: &mut ValidationErrors) -> Option<u32> {
    if blank(value) {
        errors.insert("quantity", "Quantity is required");
        return None;
    }
    match value.trim().parse::<u32>() {
        Ok(q) => Some(q),
        Err(_) => {
            errors.insert("quantity", "Quantity must be a whole number");
            None
        }
    }
}

/// Sign-in form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email or username.
    pub identifier: String,
    /// Password as typed.
    pub password: String,
}

impl LoginForm {
    /// Create a filled form.
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require(
            blank(&self.identifier),
            "identifier",
            "Email or username is required",
        );
        errors.require(self.password.is_empty(), "password", "Password is required");
        errors.into_result()
    }

    /// Map a failed login onto the form. The backend may report the
    /// identifier under `email`.
    pub fn server_errors(err: &HttpError) -> ValidationErrors {
        ValidationErrors::from_http(
            err,
            &[
                ("identifier", &["identifier", "email"]),
                ("password", &["password"]),
            ],
        )
    }
}

/// Email verification form. The email arrives through the link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyForm {
    /// Address from the link, if it carried one.
    pub email: Option<String>,
    /// One-time code as typed.
    pub otp: String,
}

impl VerifyForm {
    /// Create a form. A blank email counts as missing.
    pub fn new(email: Option<String>, otp: impl Into<String>) -> Self {
        Self {
            email: email.filter(|e| !blank(e)),
            otp: otp.into(),
        }
    }

    /// Check the email is known and the code has six characters.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require(
            self.email.is_none(),
            SUBMIT,
            "Missing email in link. Please sign up again.",
        );
        errors.require(
            self.otp.chars().count() != OTP_LENGTH,
            "otp",
            "Enter 6-digit code",
        );
        errors.into_result()
    }

    /// Verification failures are reported as one form-level message.
    pub fn server_errors(_err: &HttpError) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.insert(SUBMIT, VERIFY_FAILED);
        errors
    }
}

/// First wizard step: product details as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    /// Seller the product is created for.
    pub seller_id: u64,
    /// Product name.
    pub name: String,
    /// Rich-text (HTML) description.
    pub description: String,
    /// Price as typed.
    pub price: String,
    /// Quantity as typed.
    pub quantity: String,
    /// ISO currency code.
    pub currency: String,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            seller_id: 1,
            name: String::new(),
            description: String::new(),
            price: String::new(),
            quantity: String::new(),
            currency: "USD".to_string(),
        }
    }
}

impl ProductForm {
    /// An empty form for a seller.
    pub fn for_seller(seller_id: u64) -> Self {
        Self {
            seller_id,
            ..Default::default()
        }
    }

    /// Check every field and that price and quantity parse.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.parse().map(|_| ())
    }

    fn parse(&self) -> Result<(f64, u32), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require(blank(&self.name), "name", "Product name is required");
        errors.require(
            blank(&self.description),
            "description",
            "Description is required",
        );
        errors.require(blank(&self.currency), "currency", "Currency is required");

        let price = parse_price(&self.price, &mut errors);
        let quantity = parse_quantity(&self.quantity, &mut errors);

        match (price, quantity) {
            (Some(price), Some(quantity)) if errors.is_empty() => Ok((price, quantity)),
            _ => Err(errors),
        }
    }

    /// Build the creation request once images are pinned.
    pub fn to_new_product(&self, image_cid: Vec<String>) -> Result<NewProduct, ValidationErrors> {
        let (price, quantity) = self.parse()?;
        Ok(NewProduct {
            seller_id: self.seller_id,
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            image_cid,
            price,
            quantity,
            currency: self.currency.trim().to_string(),
        })
    }
}

/// Edit form for an existing listing, prefilled from the product.
///
/// Unlike [`ProductForm`] the description may be left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditProductForm {
    /// Product name.
    pub name: String,
    /// Rich-text (HTML) description.
    pub description: String,
    /// Price as typed.
    pub price: String,
    /// Quantity as typed.
    pub quantity: String,
    /// ISO currency code.
    pub currency: String,
}

impl EditProductForm {
    /// Prefill from the listing being edited.
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            quantity: product.quantity.to_string(),
            currency: product.currency.clone(),
        }
    }

    /// Check name and currency are set and that price and quantity parse.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.parse().map(|_| ())
    }

    fn parse(&self) -> Result<(f64, u32), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require(blank(&self.name), "name", "Product name is required");
        errors.require(blank(&self.currency), "currency", "Currency is required");
        let price = parse_price(&self.price, &mut errors);
        let quantity = parse_quantity(&self.quantity, &mut errors);

        match (price, quantity) {
            (Some(price), Some(quantity)) if errors.is_empty() => Ok((price, quantity)),
            _ => Err(errors),
        }
    }

    /// Build the update request. Every editable field is sent.
    pub fn to_update(&self) -> Result<UpdateProduct, ValidationErrors> {
        let (price, quantity) = self.parse()?;
        Ok(UpdateProduct {
            name: Some(self.name.trim().to_string()),
            description: Some(self.description.clone()),
            price: Some(price),
            quantity: Some(quantity),
            currency: Some(self.currency.trim().to_string()),
            status: None,
        })
    }

    /// Map a failed update onto the form.
    pub fn server_errors(err: &HttpError) -> ValidationErrors {
        ValidationErrors::from_http(
            err,
            &[
                ("name", &["name"]),
                ("description", &["description"]),
                ("price", &["price"]),
                ("quantity", &["quantity"]),
                ("currency", &["currency"]),
            ],
        )
    }
}

/// Optional last wizard step: delivery details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryForm {
    /// Where the courier collects the item.
    pub pickup_location: String,
    /// Estimated delivery days as typed.
    pub estimated_days: String,
    /// Optional notes; blank means none.
    pub notes: String,
}

impl DeliveryForm {
    /// Create a filled form.
    pub fn new(
        pickup_location: impl Into<String>,
        estimated_days: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            pickup_location: pickup_location.into(),
            estimated_days: estimated_days.into(),
            notes: notes.into(),
        }
    }

    /// Check both required fields and that the days parse.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.days().map(|_| ())
    }

    fn days(&self) -> Result<u32, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if blank(&self.pickup_location) || blank(&self.estimated_days) {
            errors.insert(SUBMIT, "Pickup location and estimated days are required");
            return Err(errors);
        }
        self.estimated_days.trim().parse::<u32>().map_err(|_| {
            errors.insert("estimated_days", "Estimated days must be a whole number");
            errors
        })
    }

    /// Build the delivery request for a created product.
    pub fn to_new_delivery(&self, product_id: u64) -> Result<NewDelivery, ValidationErrors> {
        let estimated_delivery_days = self.days()?;
        Ok(NewDelivery {
            product_id,
            pickup_location: self.pickup_location.trim().to_string(),
            estimated_delivery_days,
            notes: Some(self.notes.trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        })
    }
}
