//! Owned, sendable description of one status-returning device call
//!
//! Callers build a [`DeviceCommand`] on their side and hand it to whatever
//! executes device calls; the command is moved onto the worker thread and
//! applied to the handle there.

use crate::device::{FiscalDevice, Payment, PaymentEx};
use crate::error::DeviceResult;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    ResetFiscal,
    OpenCashDrawer,
    SkipPrintReceipt,
    MoneyInCurr { payment_type: i32, amount: f64 },
    MoneyOutCurr { payment_type: i32, amount: f64 },
    CustomerDisplay2 { line1: String, line2: String },
    CustomerDisplayPro { line: String },
    SetCustomerContact { contact: String },
    SetFooter { lines: [String; 4], attrib: i32 },
    PrintCopyOfLastReceipt,
    PrintCopyOfReceipt { from: i32, to: i32 },

    PrintXReport,
    PrintZReport,
    PrintMiniXReport,
    PrintSumPeriodicReport { date_from: String, date_to: String },
    PrintPeriodicReport { date_from: String, date_to: String },
    PrintSumPeriodicReportByNumber { no_from: i32, no_to: i32 },
    PrintPeriodicReportByNumber { no_from: i32, no_to: i32 },

    BeginNonFiscalReceipt,
    PrintNonFiscalLine { line: String, attrib: i32 },
    EndNonFiscalReceipt,
    PrintBarCode { system: i32, height: i32, code: String },

    PrintTareItem { description: String, quantity: f64, price: f64 },
    PrintTareItemVoid { description: String, quantity: f64, price: f64 },
    PrintTareDeposit { description: String, quantity: f64, unit_price: f64 },
    PrintTareDepositVoid { description: String, quantity: f64, unit_price: f64 },
    PrintDepositReceive { description: String, quantity: f64, price: f64 },
    PrintDepositReceiveCredit { description: String, quantity: f64, price: f64 },
    PrintDepositReceiveVoid { description: String, quantity: f64, price: f64 },
    PrintDepositRefund { description: String, quantity: f64, price: f64 },

    BeginFiscalReceipt,
    PrintRecItem {
        description: String,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: String,
    },
    PrintRecItemEx {
        description: String,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: String,
        group: String,
    },
    ItemReturn {
        description: String,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: String,
        percent: f64,
        absolute: f64,
    },
    ItemReturnEx {
        description: String,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: String,
        group: String,
        percent: f64,
        absolute: f64,
    },
    PrintCommentLine { line: String, attrib: i32 },
    DiscountAdditionForItem { discount_type: i32, amount: f64 },
    DiscountAdditionForReceipt { discount_type: i32, amount: f64 },
    RefundReceiptInfo { ecr: String, receipt_no: String, doc_no: String },

    TransferPreReceipt { receipt_no: String, amount: f64 },
    LinkPreReceipt { receipt_no: String, amount: f64 },
    EndPreReceipt,

    EndFiscalReceiptCurr(Payment),
    EndFiscalReceiptEx(PaymentEx),
    EndFiscalCacheReceipt,
    EndRecPayment(Payment),
    EndRecPaymentEx(PaymentEx),
    GoodsReturnCurr(Payment),
    GoodsReturnEx(PaymentEx),
    GoodsReturnCacheReceipt,
}

impl DeviceCommand {
    /// Driver operation name, used in logs and diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::ResetFiscal => "ResetFiscal",
            Self::OpenCashDrawer => "OpenCashDrawer",
            Self::SkipPrintReceipt => "SkipPrintReceipt",
            Self::MoneyInCurr { .. } => "MoneyInCurr",
            Self::MoneyOutCurr { .. } => "MoneyOutCurr",
            Self::CustomerDisplay2 { .. } => "CustomerDisplay2",
            Self::CustomerDisplayPro { .. } => "CustomerDisplayPro",
            Self::SetCustomerContact { .. } => "SetCustomerContact",
            Self::SetFooter { .. } => "SetFooter",
            Self::PrintCopyOfLastReceipt => "PrintCopyOfLastReceipt",
            Self::PrintCopyOfReceipt { .. } => "PrintCopyOfReceipt",
            Self::PrintXReport => "PrintXReport",
            Self::PrintZReport => "PrintZReport",
            Self::PrintMiniXReport => "PrintMiniXReport",
            Self::PrintSumPeriodicReport { .. } => "PrintSumPeriodicReport",
            Self::PrintPeriodicReport { .. } => "PrintPeriodicReport",
            Self::PrintSumPeriodicReportByNumber { .. } => "PrintSumPeriodicReportByNumber",
            Self::PrintPeriodicReportByNumber { .. } => "PrintPeriodicReportByNumber",
            Self::BeginNonFiscalReceipt => "BeginNonFiscalReceipt",
            Self::PrintNonFiscalLine { .. } => "PrintNonFiscalLine",
            Self::EndNonFiscalReceipt => "EndNonFiscalReceipt",
            Self::PrintBarCode { .. } => "PrintBarCode",
            Self::PrintTareItem { .. } => "PrintTareItem",
            Self::PrintTareItemVoid { .. } => "PrintTareItemVoid",
            Self::PrintTareDeposit { .. } => "PrintTareDeposit",
            Self::PrintTareDepositVoid { .. } => "PrintTareDepositVoid",
            Self::PrintDepositReceive { .. } => "PrintDepositReceive",
            Self::PrintDepositReceiveCredit { .. } => "PrintDepositReceiveCredit",
            Self::PrintDepositReceiveVoid { .. } => "PrintDepositReceiveVoid",
            Self::PrintDepositRefund { .. } => "PrintDepositRefund",
            Self::BeginFiscalReceipt => "BeginFiscalReceipt",
            Self::PrintRecItem { .. } => "PrintRecItem",
            Self::PrintRecItemEx { .. } => "PrintRecItemEx",
            Self::ItemReturn { .. } => "ItemReturn",
            Self::ItemReturnEx { .. } => "ItemReturnEx",
            Self::PrintCommentLine { .. } => "PrintCommentLine",
            Self::DiscountAdditionForItem { .. } => "DiscountAdditionForItem",
            Self::DiscountAdditionForReceipt { .. } => "DiscountAdditionForReceipt",
            Self::RefundReceiptInfo { .. } => "RefundReceiptInfo",
            Self::TransferPreReceipt { .. } => "TransferPreReceipt",
            Self::LinkPreReceipt { .. } => "LinkPreReceipt",
            Self::EndPreReceipt => "EndPreReceipt",
            Self::EndFiscalReceiptCurr(_) => "EndFiscalReceiptCurr",
            Self::EndFiscalReceiptEx(_) => "EndFiscalReceiptEx",
            Self::EndFiscalCacheReceipt => "EndFiscalCacheReceipt",
            Self::EndRecPayment(_) => "EndRecPayment",
            Self::EndRecPaymentEx(_) => "EndRecPaymentEx",
            Self::GoodsReturnCurr(_) => "GoodsReturnCurr",
            Self::GoodsReturnEx(_) => "GoodsReturnEx",
            Self::GoodsReturnCacheReceipt => "GoodsReturnCacheReceipt",
        }
    }

    /// Run the command against a device handle
    pub fn apply(&self, device: &dyn FiscalDevice) -> DeviceResult<i32> {
        match self {
            Self::ResetFiscal => device.reset_fiscal(),
            Self::OpenCashDrawer => device.open_cash_drawer(),
            Self::SkipPrintReceipt => device.skip_print_receipt(),
            Self::MoneyInCurr {
                payment_type,
                amount,
            } => device.money_in_curr(*payment_type, *amount),
            Self::MoneyOutCurr {
                payment_type,
                amount,
            } => device.money_out_curr(*payment_type, *amount),
            Self::CustomerDisplay2 { line1, line2 } => device.customer_display2(line1, line2),
            Self::CustomerDisplayPro { line } => device.customer_display_pro(line),
            Self::SetCustomerContact { contact } => device.set_customer_contact(contact),
            Self::SetFooter { lines, attrib } => {
                device.set_footer(lines.each_ref().map(String::as_str), *attrib)
            }
            Self::PrintCopyOfLastReceipt => device.print_copy_of_last_receipt(),
            Self::PrintCopyOfReceipt { from, to } => device.print_copy_of_receipt(*from, *to),

            Self::PrintXReport => device.print_x_report(),
            Self::PrintZReport => device.print_z_report(),
            Self::PrintMiniXReport => device.print_mini_x_report(),
            Self::PrintSumPeriodicReport { date_from, date_to } => {
                device.print_sum_periodic_report(date_from, date_to)
            }
            Self::PrintPeriodicReport { date_from, date_to } => {
                device.print_periodic_report(date_from, date_to)
            }
            Self::PrintSumPeriodicReportByNumber { no_from, no_to } => {
                device.print_sum_periodic_report_by_number(*no_from, *no_to)
            }
            Self::PrintPeriodicReportByNumber { no_from, no_to } => {
                device.print_periodic_report_by_number(*no_from, *no_to)
            }

            Self::BeginNonFiscalReceipt => device.begin_non_fiscal_receipt(),
            Self::PrintNonFiscalLine { line, attrib } => device.print_non_fiscal_line(line, *attrib),
            Self::EndNonFiscalReceipt => device.end_non_fiscal_receipt(),
            Self::PrintBarCode {
                system,
                height,
                code,
            } => device.print_bar_code(*system, *height, code),

            Self::PrintTareItem {
                description,
                quantity,
                price,
            } => device.print_tare_item(description, *quantity, *price),
            Self::PrintTareItemVoid {
                description,
                quantity,
                price,
            } => device.print_tare_item_void(description, *quantity, *price),
            Self::PrintTareDeposit {
                description,
                quantity,
                unit_price,
            } => device.print_tare_deposit(description, *quantity, *unit_price),
            Self::PrintTareDepositVoid {
                description,
                quantity,
                unit_price,
            } => device.print_tare_deposit_void(description, *quantity, *unit_price),
            Self::PrintDepositReceive {
                description,
                quantity,
                price,
            } => device.print_deposit_receive(description, *quantity, *price),
            Self::PrintDepositReceiveCredit {
                description,
                quantity,
                price,
            } => device.print_deposit_receive_credit(description, *quantity, *price),
            Self::PrintDepositReceiveVoid {
                description,
                quantity,
                price,
            } => device.print_deposit_receive_void(description, *quantity, *price),
            Self::PrintDepositRefund {
                description,
                quantity,
                price,
            } => device.print_deposit_refund(description, *quantity, *price),

            Self::BeginFiscalReceipt => device.begin_fiscal_receipt(),
            Self::PrintRecItem {
                description,
                quantity,
                price,
                vat_id,
                unit,
            } => device.print_rec_item(description, *quantity, *price, *vat_id, unit),
            Self::PrintRecItemEx {
                description,
                quantity,
                price,
                vat_id,
                unit,
                group,
            } => device.print_rec_item_ex(description, *quantity, *price, *vat_id, unit, group),
            Self::ItemReturn {
                description,
                quantity,
                price,
                vat_id,
                unit,
                percent,
                absolute,
            } => device.item_return(
                description,
                *quantity,
                *price,
                *vat_id,
                unit,
                *percent,
                *absolute,
            ),
            Self::ItemReturnEx {
                description,
                quantity,
                price,
                vat_id,
                unit,
                group,
                percent,
                absolute,
            } => device.item_return_ex(
                description,
                *quantity,
                *price,
                *vat_id,
                unit,
                group,
                *percent,
                *absolute,
            ),
            Self::PrintCommentLine { line, attrib } => device.print_comment_line(line, *attrib),
            Self::DiscountAdditionForItem {
                discount_type,
                amount,
            } => device.discount_addition_for_item(*discount_type, *amount),
            Self::DiscountAdditionForReceipt {
                discount_type,
                amount,
            } => device.discount_addition_for_receipt(*discount_type, *amount),
            Self::RefundReceiptInfo {
                ecr,
                receipt_no,
                doc_no,
            } => device.refund_receipt_info(ecr, receipt_no, doc_no),

            Self::TransferPreReceipt { receipt_no, amount } => {
                device.transfer_pre_receipt(receipt_no, *amount)
            }
            Self::LinkPreReceipt { receipt_no, amount } => {
                device.link_pre_receipt(receipt_no, *amount)
            }
            Self::EndPreReceipt => device.end_pre_receipt(),

            Self::EndFiscalReceiptCurr(payment) => device.end_fiscal_receipt_curr(payment),
            Self::EndFiscalReceiptEx(payment) => device.end_fiscal_receipt_ex(payment),
            Self::EndFiscalCacheReceipt => device.end_fiscal_cache_receipt(),
            Self::EndRecPayment(payment) => device.end_rec_payment(payment),
            Self::EndRecPaymentEx(payment) => device.end_rec_payment_ex(payment),
            Self::GoodsReturnCurr(payment) => device.goods_return_curr(payment),
            Self::GoodsReturnEx(payment) => device.goods_return_ex(payment),
            Self::GoodsReturnCacheReceipt => device.goods_return_cache_receipt(),
        }
    }
}
