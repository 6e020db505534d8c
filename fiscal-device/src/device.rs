//! Device capability traits
//!
//! A [`FiscalDevice`] is one live connection to the cash register driver.
//! Every method is blocking and may hang; callers are expected to run them
//! on a worker thread with their own timeout (see `fiscal-server`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DeviceInitError, DeviceResult};

/// Standard payment breakdown: cash, four credit buckets, three currencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub cash: f64,
    pub credit: [f64; 4],
    pub currency: [f64; 3],
}

impl Payment {
    /// Cash plus credit buckets (currencies are not part of the total)
    pub fn total(&self) -> f64 {
        self.cash + self.credit.iter().sum::<f64>()
    }
}

/// Extended payment breakdown: cash and eight credit buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentEx {
    pub cash: f64,
    pub credit: [f64; 8],
}

impl PaymentEx {
    pub fn total(&self) -> f64 {
        self.cash + self.credit.iter().sum::<f64>()
    }
}

/// Fiscal printer / cash register operations
///
/// Each operation returns the driver status code (`0` = success). An `Err`
/// means the call itself blew up rather than the device refusing it.
#[allow(clippy::too_many_arguments)]
pub trait FiscalDevice: Send + Sync {
    // ===== Session / maintenance =====
    fn reset_fiscal(&self) -> DeviceResult<i32>;
    fn open_cash_drawer(&self) -> DeviceResult<i32>;
    fn skip_print_receipt(&self) -> DeviceResult<i32>;
    fn money_in_curr(&self, payment_type: i32, amount: f64) -> DeviceResult<i32>;
    fn money_out_curr(&self, payment_type: i32, amount: f64) -> DeviceResult<i32>;
    fn customer_display2(&self, line1: &str, line2: &str) -> DeviceResult<i32>;
    fn customer_display_pro(&self, line: &str) -> DeviceResult<i32>;
    fn set_customer_contact(&self, contact: &str) -> DeviceResult<i32>;
    fn set_footer(&self, lines: [&str; 4], attrib: i32) -> DeviceResult<i32>;
    fn print_copy_of_last_receipt(&self) -> DeviceResult<i32>;
    fn print_copy_of_receipt(&self, from: i32, to: i32) -> DeviceResult<i32>;

    /// Query device information; returns the status code and the info text
    fn get_fiscal_info(&self, info_type: i32) -> DeviceResult<(i32, String)>;

    // ===== Reports =====
    fn print_x_report(&self) -> DeviceResult<i32>;
    fn print_z_report(&self) -> DeviceResult<i32>;
    fn print_mini_x_report(&self) -> DeviceResult<i32>;
    fn print_sum_periodic_report(&self, date_from: &str, date_to: &str) -> DeviceResult<i32>;
    fn print_periodic_report(&self, date_from: &str, date_to: &str) -> DeviceResult<i32>;
    fn print_sum_periodic_report_by_number(&self, no_from: i32, no_to: i32) -> DeviceResult<i32>;
    fn print_periodic_report_by_number(&self, no_from: i32, no_to: i32) -> DeviceResult<i32>;

    // ===== Non-fiscal receipt =====
    fn begin_non_fiscal_receipt(&self) -> DeviceResult<i32>;
    fn print_non_fiscal_line(&self, line: &str, attrib: i32) -> DeviceResult<i32>;
    fn end_non_fiscal_receipt(&self) -> DeviceResult<i32>;
    fn print_bar_code(&self, system: i32, height: i32, code: &str) -> DeviceResult<i32>;

    // ===== Tare / deposit lines =====
    fn print_tare_item(&self, description: &str, quantity: f64, price: f64) -> DeviceResult<i32>;
    fn print_tare_item_void(&self, description: &str, quantity: f64, price: f64)
    -> DeviceResult<i32>;
    fn print_tare_deposit(&self, description: &str, quantity: f64, unit_price: f64)
    -> DeviceResult<i32>;
    fn print_tare_deposit_void(
        &self,
        description: &str,
        quantity: f64,
        unit_price: f64,
    ) -> DeviceResult<i32>;
    fn print_deposit_receive(&self, description: &str, quantity: f64, price: f64)
    -> DeviceResult<i32>;
    fn print_deposit_receive_credit(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32>;
    fn print_deposit_receive_void(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32>;
    fn print_deposit_refund(&self, description: &str, quantity: f64, price: f64)
    -> DeviceResult<i32>;

    // ===== Fiscal receipt =====
    fn begin_fiscal_receipt(&self) -> DeviceResult<i32>;
    fn print_rec_item(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
    ) -> DeviceResult<i32>;
    fn print_rec_item_ex(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
        group: &str,
    ) -> DeviceResult<i32>;
    fn item_return(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
        percent: f64,
        absolute: f64,
    ) -> DeviceResult<i32>;
    fn item_return_ex(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
        group: &str,
        percent: f64,
        absolute: f64,
    ) -> DeviceResult<i32>;
    fn print_comment_line(&self, line: &str, attrib: i32) -> DeviceResult<i32>;
    fn discount_addition_for_item(&self, discount_type: i32, amount: f64) -> DeviceResult<i32>;
    fn discount_addition_for_receipt(&self, discount_type: i32, amount: f64)
    -> DeviceResult<i32>;
    fn refund_receipt_info(&self, ecr: &str, receipt_no: &str, doc_no: &str) -> DeviceResult<i32>;

    // ===== Pre-receipts =====
    fn transfer_pre_receipt(&self, receipt_no: &str, amount: f64) -> DeviceResult<i32>;
    fn link_pre_receipt(&self, receipt_no: &str, amount: f64) -> DeviceResult<i32>;
    fn end_pre_receipt(&self) -> DeviceResult<i32>;

    // ===== Terminators =====
    fn end_fiscal_receipt_curr(&self, payment: &Payment) -> DeviceResult<i32>;
    fn end_fiscal_receipt_ex(&self, payment: &PaymentEx) -> DeviceResult<i32>;
    fn end_fiscal_cache_receipt(&self) -> DeviceResult<i32>;
    fn end_rec_payment(&self, payment: &Payment) -> DeviceResult<i32>;
    fn end_rec_payment_ex(&self, payment: &PaymentEx) -> DeviceResult<i32>;
    fn goods_return_curr(&self, payment: &Payment) -> DeviceResult<i32>;
    fn goods_return_ex(&self, payment: &PaymentEx) -> DeviceResult<i32>;
    fn goods_return_cache_receipt(&self) -> DeviceResult<i32>;

    /// Release the underlying driver object
    ///
    /// Called once before the handle is dropped by its owner. In-flight
    /// calls on other threads may still hold a reference.
    fn release(&self) -> DeviceResult<()> {
        Ok(())
    }
}

/// Builds fresh device handles
///
/// Invoked at startup, on explicit load and on every recovery reload.
pub trait DeviceFactory: Send + Sync {
    /// Human-readable driver name for logs
    fn name(&self) -> &str;

    fn create(&self) -> Result<Arc<dyn FiscalDevice>, DeviceInitError>;
}
