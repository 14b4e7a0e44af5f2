//! Checkout Form Rendering
//!
//! The only place HTML is produced. `maud` escapes every attribute value
//! and text node here, at the render boundary, not when the fields are
//! built.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use payhere_sdk::CheckoutRedirect;

const FORM_ID: &str = "payhere_checkout";

/// Hidden-input form posting the signed fields to the gateway
pub fn checkout_form(redirect: &CheckoutRedirect, submit_label: &str) -> Markup {
    html! {
        form id=(FORM_ID) method=(redirect.method) action=(redirect.action) {
            @for (name, value) in redirect.fields.iter() {
                input type="hidden" name=(name) value=(value);
            }
            button type="submit" { (submit_label) }
        }
    }
}

/// Full page that submits the form as soon as it loads
pub fn redirect_page(redirect: &CheckoutRedirect) -> Markup {
    html! {
        (DOCTYPE)
        html {
            body {
                (checkout_form(redirect, "Pay Now"))
                script {
                    (PreEscaped(format!(r#"document.getElementById("{FORM_ID}").submit();"#)))
                }
            }
        }
    }
}
