//! # payhere-sdk
//!
//! Checkout request signing and payment notification verification for the
//! PayHere hosted payment gateway.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  signed form POST  ┌─────────────────┐  redirect  ┌─────────────┐
//! │  Your Site  │───────────────────▶│ PayHere Hosted  │───────────▶│  Your Site  │
//! │ (checkout)  │                    │  Checkout Page  │            │  (return)   │
//! └─────────────┘                    └────────┬────────┘            └─────────────┘
//!                                             │ notification POST
//!                                             ▼
//!                                    ┌─────────────────┐
//!                                    │  Your Server    │
//!                                    │  (notify_url)   │
//!                                    └─────────────────┘
//! ```
//!
//! Both directions are authenticated by the same MD5-based signature
//! derived from the merchant secret (see [`signer`]). The secret itself is
//! never part of any field map.
//!
//! This crate produces and checks data only. It makes no network calls and
//! renders no HTML; escaping values for a page is the renderer's job.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use payhere_sdk::{Customer, Environment, PayhereClient};
//! use rust_decimal_macros::dec;
//!
//! let client = PayhereClient::new("1211149", "merchant-secret", Environment::Sandbox)?;
//!
//! // Outbound: build and sign a checkout request
//! let mut request = client.payment_request();
//! request
//!     .set_order_id("ORDER_1001")?
//!     .set_amount(dec!(1000))?
//!     .set_items("Premium Subscription", 1)?
//!     .set_customer(&customer)?
//!     .set_notify_url("https://shop.example/payhere/notify")?;
//! let redirect = request.checkout()?;
//! // Render redirect.fields as hidden inputs posting to redirect.action
//!
//! // Inbound: verify a notification
//! let notification = client.notification(form_fields)?;
//! notification.verify()?;
//! if notification.is_success() {
//!     // mark the order paid
//! }
//! ```

mod client;
mod config;
mod error;
mod notification;
mod request;
pub mod signer;
mod status;
pub mod validation;

pub use client::PayhereClient;
pub use config::{Environment, MerchantConfig};
pub use error::{ErrorKind, PaymentError, Result, VerificationFailure};
pub use notification::{Notification, NotificationPayload, REQUIRED_NOTIFICATION_FIELDS};
pub use request::{
    BuilderState, CheckoutRedirect, Customer, PaymentFields, PaymentRequest, REQUIRED_FIELDS,
};
pub use status::PaymentStatus;
pub use validation::Currency;
