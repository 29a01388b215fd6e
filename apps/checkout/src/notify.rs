//! # Notifications
//!
//! Customer emails sent after an order commits or changes status.
//!
//! ```text
//! OrderService ──► render_confirmation() / render_status_update()
//!                        │
//!                        ▼
//!                  Notifier::send(to, subject, html)
//!                   ├── LogNotifier        (tracing, default)
//!                   └── RecordingNotifier  (in-memory, tests and demos)
//! ```
//!
//! Delivery happens after commit. A failed send never reverses an order.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::CheckoutConfig;
use platter_core::pricing::PricedLine;
use platter_core::{Money, OrderStatus};

pub const CONFIRMATION_SUBJECT: &str = "Your Order has been Placed Successfully";
pub const STATUS_UPDATE_SUBJECT: &str = "Order Status Update";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound message channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError>;
}

// =============================================================================
// Implementations
// =============================================================================

/// Writes each message to the log instead of a mail server.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    from: String,
    sender_name: String,
}

impl LogNotifier {
    pub fn new(config: &CheckoutConfig) -> Self {
        LogNotifier {
            from: config.mail_from.clone(),
            sender_name: config.sender_name.clone(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        info!(
            from = %format!("{} <{}>", self.sender_name, self.from),
            to = %to,
            subject = %subject,
            bytes = html_body.len(),
            "Email dispatched"
        );
        Ok(())
    }
}

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// In-memory notifier that keeps every message and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following send fail until switched back.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery(format!("mailbox {} unavailable", to)));
        }
        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Everything the confirmation email shows.
#[derive(Debug, Clone)]
pub struct ConfirmationEmail<'a> {
    pub lines: &'a [PricedLine],
    pub coupon_code: Option<&'a str>,
    pub payment_method: &'a str,
    pub status: OrderStatus,
    pub shipping_fee: Money,
    pub total: Money,
}

const ROW_COLORS: [&str; 2] = ["#f0f4e8", "#fff0e0"];
const CELL: &str = "border: none; padding: 8px; color: #000000E0;";
const HEADER_CELL: &str = "border: 1px solid #FFFFFF; padding: 8px; color: #FFFFFF;";
const PARAGRAPH: &str = "color: #5C8E5F;";

/// Renders the order confirmation as an HTML table of lines plus a footer.
pub fn render_confirmation(email: &ConfirmationEmail<'_>, currency: &str) -> String {
    let amount = |m: Money| format!("{} {}", m, escape(currency));
    let mut html = String::from(
        "<html><body style=\"font-family: Arial, sans-serif; color: #333;\">\
         <div style=\"padding: 20px;\">\
         <h2 style=\"color: #5C8E5F; font-size: 18px;\">Your order has been placed successfully!</h2>\
         <p style=\"color: #5C8E5F; font-size: 14px;\">Here is the list of items you have ordered:</p>\
         <table style=\"border-collapse: collapse; width: 100%; margin-top: 20px;\">\
         <thead><tr style=\"background-color: #81c784;\">",
    );
    for header in ["Dish Name", "Thumb Image", "Price", "Selected Options", "Quantity", "Total Price"] {
        let _ = write!(html, "<th style=\"{}\">{}</th>", HEADER_CELL, header);
    }
    html.push_str("</tr></thead><tbody>");

    for (idx, line) in email.lines.iter().enumerate() {
        let name = escape(&line.dish.name);
        let image = line
            .dish
            .thumb_image
            .as_deref()
            .map(|src| {
                format!(
                    "<img src=\"{}\" alt=\"{}\" style=\"width: 100px; height: auto;\"/>",
                    escape(src),
                    name
                )
            })
            .unwrap_or_default();

        let mut price = amount(line.unit_price);
        let list = line.dish.list_price();
        if line.unit_price < list {
            let _ = write!(price, " (offer, was {})", amount(list));
        }

        let options: String = line
            .options
            .iter()
            .map(|o| {
                format!(
                    "{} ({})<br>",
                    escape(&o.option_name),
                    amount(o.additional_price())
                )
            })
            .collect();

        let _ = write!(
            html,
            "<tr style=\"background-color: {};\">\
             <td style=\"{cell}\">{}</td><td style=\"{cell}\">{}</td>\
             <td style=\"{cell}\">{}</td><td style=\"{cell}\">{}</td>\
             <td style=\"{cell}\">{}</td><td style=\"{cell}\">{}</td></tr>",
            ROW_COLORS[idx % 2],
            name,
            image,
            price,
            options,
            line.quantity,
            amount(line.line_total),
            cell = CELL,
        );
    }

    html.push_str("</tbody></table>");
    for (label, value) in [
        ("Coupon Code", escape(email.coupon_code.unwrap_or("N/A"))),
        ("Payment Method", escape(email.payment_method)),
        ("Order Status", email.status.to_string()),
        ("Shipping Fee", amount(email.shipping_fee)),
        ("Total Price", amount(email.total)),
    ] {
        let _ = write!(
            html,
            "<p style=\"{}\">{}: <strong>{}</strong></p>",
            PARAGRAPH, label, value
        );
    }
    let _ = write!(
        html,
        "<p style=\"{p}\">Your order will be processed soon.</p>\
         <p style=\"{p}\">We will notify you when your order is on its way.</p>\
         <p style=\"{p}\">Thank you for choosing us!</p>\
         </div></body></html>",
        p = PARAGRAPH
    );
    html
}

/// Renders the short status-change email.
pub fn render_status_update(order_id: &str, status: OrderStatus) -> String {
    const BODY: &str = "font-family: Arial, sans-serif; font-size: 14px; color: #333;";
    format!(
        "<html><body>\
         <h2 style=\"color: #13b3e6; font-family: Arial, sans-serif; font-size: 18px;\">\
         Your Order Status has been Updated!</h2>\
         <p style=\"{b}\">Order ID: {}</p>\
         <p style=\"{b}\">New Status: {}</p>\
         <p style=\"{b}\">Thank you for your patience!</p>\
         </body></html>",
        escape(order_id),
        status,
        b = BODY
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use platter_core::{Dish, DishOptionSelection, Offer};

    fn pho_line() -> PricedLine {
        let dish = Dish {
            id: "d1".into(),
            name: "Pho <Bo>".into(),
            price_cents: 10_000,
            offer_price_cents: None,
            category_id: None,
            thumb_image: Some("https://img.example.com/pho.jpg".into()),
        };
        let option = DishOptionSelection {
            id: "o1".into(),
            dish_id: "d1".into(),
            option_name: "Large bowl".into(),
            additional_price_cents: 2_000,
        };
        let day = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let offer = Offer {
            id: "of1".into(),
            dish_id: "d1".into(),
            discount_bps: 1_000,
            start_date: day,
            end_date: day,
        };
        PricedLine::new(dish, 2, vec![option], &[offer], day).unwrap()
    }

    #[test]
    fn test_confirmation_lists_lines_and_totals() {
        let lines = vec![pho_line()];
        let html = render_confirmation(
            &ConfirmationEmail {
                lines: &lines,
                coupon_code: Some("SPRING20"),
                payment_method: "CASH",
                status: OrderStatus::Pending,
                shipping_fee: Money::from_major(5),
                total: Money::from_major(170),
            },
            "VND",
        );

        assert!(html.contains("Pho &lt;Bo&gt;"));
        assert!(html.contains("https://img.example.com/pho.jpg"));
        assert!(html.contains("90.00 VND (offer, was 100.00 VND)"));
        assert!(html.contains("Large bowl (20.00 VND)"));
        assert!(html.contains("220.00 VND"));
        assert!(html.contains("Coupon Code: <strong>SPRING20</strong>"));
        assert!(html.contains("Order Status: <strong>PENDING</strong>"));
        assert!(html.contains("Total Price: <strong>170.00 VND</strong>"));
    }

    #[test]
    fn test_confirmation_without_coupon() {
        let lines = vec![pho_line()];
        let html = render_confirmation(
            &ConfirmationEmail {
                lines: &lines,
                coupon_code: None,
                payment_method: "CARD",
                status: OrderStatus::Pending,
                shipping_fee: Money::zero(),
                total: Money::from_major(220),
            },
            "USD",
        );
        assert!(html.contains("Coupon Code: <strong>N/A</strong>"));
    }

    #[test]
    fn test_status_update() {
        let html = render_status_update("ord-1", OrderStatus::Shipping);
        assert!(html.contains("Order ID: ord-1"));
        assert!(html.contains("New Status: SHIPPING"));
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.send("a@example.com", "Hi", "<p>x</p>").await.unwrap();

        notifier.set_fail(true);
        assert!(notifier.send("b@example.com", "Hi", "<p>y</p>").await.is_err());

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@example.com");
    }
}
