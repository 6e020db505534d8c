//! `/fiscalCommand` request body
//!
//! One `Command` name plus, for commands with arguments, a parameter object
//! named after the command (`{"Command": "PrintRecItem", "PrintRecItem": {..}}`).

use fiscal_device::{Payment, PaymentEx};
use serde::Deserialize;

use crate::receipt::request::{FiscalInfoDto, FooterDto, LinkPreReceiptDto, RefundInfoDto};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AmountParams {
    pub amount: f64,
}

/// `dateFrom` / `dateTo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DateRangeParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// `noFrom` / `noTo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberRangeParams {
    pub no_from: i32,
    pub no_to: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CustomerDisplay2Params {
    pub line1: Option<String>,
    pub line2: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LineParams {
    pub line: Option<String>,
}

/// Tare and deposit lines: `Description`, `Quantity`, `Price`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LineItemParams {
    pub description: Option<String>,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TareDepositParams {
    pub description: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BarCodeParams {
    pub system: i32,
    pub height: i32,
    pub bar_code: Option<String>,
}

/// Non-fiscal text line; the attribute key is spelled `Atrrib` on the wire
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NonFiscalLineParams {
    #[serde(rename = "Line")]
    pub line: Option<String>,
    #[serde(rename = "Atrrib")]
    pub attrib: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RecItemParams {
    pub item_description: Option<String>,
    pub item_quantity: f64,
    pub item_price: f64,
    #[serde(rename = "VatID")]
    pub vat_id: i32,
    pub item_unit: Option<String>,
}

/// Extended item and item-return parameters
///
/// `Group` is ignored by `ItemReturn`, the percent/absolute pair by `PrintRecItemEx`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ItemExParams {
    pub description: Option<String>,
    pub quantity: f64,
    pub price: f64,
    pub vat: i32,
    pub dimension: Option<String>,
    pub group: Option<String>,
    pub curr_percent: f64,
    pub curr_absolute: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CommentParams {
    pub comment_line: Option<String>,
    pub comment_line_attrib: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DiscountParams {
    #[serde(rename = "Type")]
    pub kind: i32,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ContactParams {
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CopyRangeParams {
    pub from: i32,
    pub to: i32,
}

/// `rCash`, `Credit1`..`Credit4`, `rCurrency1`..`rCurrency3`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CurrencyPaymentParams {
    #[serde(rename = "rCash")]
    pub cash: f64,
    #[serde(rename = "Credit1")]
    pub credit1: f64,
    #[serde(rename = "Credit2")]
    pub credit2: f64,
    #[serde(rename = "Credit3")]
    pub credit3: f64,
    #[serde(rename = "Credit4")]
    pub credit4: f64,
    #[serde(rename = "rCurrency1")]
    pub currency1: f64,
    #[serde(rename = "rCurrency2")]
    pub currency2: f64,
    #[serde(rename = "rCurrency3")]
    pub currency3: f64,
}

impl From<CurrencyPaymentParams> for Payment {
    fn from(p: CurrencyPaymentParams) -> Self {
        Payment {
            cash: p.cash,
            credit: [p.credit1, p.credit2, p.credit3, p.credit4],
            currency: [p.currency1, p.currency2, p.currency3],
        }
    }
}

/// `rCash`, `Credit1`..`Credit8`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ExtendedPaymentParams {
    #[serde(rename = "rCash")]
    pub cash: f64,
    #[serde(rename = "Credit1")]
    pub credit1: f64,
    #[serde(rename = "Credit2")]
    pub credit2: f64,
    #[serde(rename = "Credit3")]
    pub credit3: f64,
    #[serde(rename = "Credit4")]
    pub credit4: f64,
    #[serde(rename = "Credit5")]
    pub credit5: f64,
    #[serde(rename = "Credit6")]
    pub credit6: f64,
    #[serde(rename = "Credit7")]
    pub credit7: f64,
    #[serde(rename = "Credit8")]
    pub credit8: f64,
}

impl From<ExtendedPaymentParams> for PaymentEx {
    fn from(p: ExtendedPaymentParams) -> Self {
        PaymentEx {
            cash: p.cash,
            credit: [
                p.credit1, p.credit2, p.credit3, p.credit4, p.credit5, p.credit6, p.credit7,
                p.credit8,
            ],
        }
    }
}

/// Body of `POST /fiscalCommand`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FiscalCommandRequest {
    pub command: Option<String>,

    pub get_fiscal_info: Option<FiscalInfoDto>,
    pub money_in_curr: Option<AmountParams>,
    pub money_out_curr: Option<AmountParams>,
    pub print_sum_periodic_report: Option<DateRangeParams>,
    pub print_periodic_report: Option<DateRangeParams>,
    pub print_sum_periodic_report_by_number: Option<NumberRangeParams>,
    pub print_periodic_report_by_number: Option<NumberRangeParams>,
    pub customer_display2: Option<CustomerDisplay2Params>,
    pub customer_display_pro: Option<LineParams>,
    pub print_tare_item: Option<LineItemParams>,
    pub print_tare_item_void: Option<LineItemParams>,
    pub print_tare_deposit: Option<TareDepositParams>,
    pub print_tare_deposit_void: Option<TareDepositParams>,
    pub print_deposit_receive: Option<LineItemParams>,
    pub print_deposit_receive_credit: Option<LineItemParams>,
    pub print_deposit_receive_void: Option<LineItemParams>,
    pub print_deposit_refund: Option<LineItemParams>,
    pub print_bar_code: Option<BarCodeParams>,
    pub print_non_fiscal_line: Option<NonFiscalLineParams>,
    pub print_rec_item: Option<RecItemParams>,
    pub print_rec_item_ex: Option<ItemExParams>,
    pub item_return: Option<ItemExParams>,
    pub item_return_ex: Option<ItemExParams>,
    pub print_comment_line: Option<CommentParams>,
    pub discount_addition_for_item: Option<DiscountParams>,
    pub discount_addition_for_receipt: Option<DiscountParams>,
    pub transfer_pre_receipt: Option<LinkPreReceiptDto>,
    pub link_pre_receipt: Option<LinkPreReceiptDto>,
    pub end_fiscal_receipt_curr: Option<CurrencyPaymentParams>,
    pub end_rec_payment: Option<CurrencyPaymentParams>,
    pub goods_return_curr: Option<CurrencyPaymentParams>,
    pub end_fiscal_receipt_ex: Option<ExtendedPaymentParams>,
    pub end_rec_payment_ex: Option<ExtendedPaymentParams>,
    pub goods_return_ex: Option<ExtendedPaymentParams>,
    pub set_customer_contact: Option<ContactParams>,
    pub refund_receipt_info: Option<RefundInfoDto>,
    pub print_copy_of_receipt: Option<CopyRangeParams>,
    pub set_footer: Option<FooterDto>,
}

impl FiscalCommandRequest {
    /// Request with only a command name
    pub fn named(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }
}
