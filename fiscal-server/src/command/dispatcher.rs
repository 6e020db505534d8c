//! Single-command dispatch (`POST /fiscalCommand`)
//!
//! A request is first resolved into a [`Planned`] call without touching the
//! device; only a fully resolved call reaches the session.

use std::sync::Arc;

use fiscal_device::DeviceCommand;
use thiserror::Error;

use super::request::{FiscalCommandRequest, LineItemParams, TareDepositParams};
use crate::core::FiscalReply;
use crate::core::reply::COMMAND_FAILURE_MESSAGE;
use crate::session::{DeviceSession, SessionGuard};

/// Cash movements issued through the single-command surface use payment type 0
const CASH_PAYMENT_TYPE: i32 = 0;

/// Footer lines are sent with this attribute
const FOOTER_ATTRIB: i32 = 64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandRejection {
    #[error("Command property is missing or null.")]
    MissingCommand,

    #[error("Command not implemented or invalid.")]
    Unknown(String),

    #[error("Missing '{0}' object.")]
    MissingObject(&'static str),
}

/// A resolved device call
#[derive(Debug, Clone, PartialEq)]
pub enum Planned {
    Device(DeviceCommand),
    FiscalInfo(i32),
}

fn required<T>(params: Option<T>, name: &'static str) -> Result<T, CommandRejection> {
    params.ok_or(CommandRejection::MissingObject(name))
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn line_item(
    params: Option<LineItemParams>,
    name: &'static str,
) -> Result<(String, f64, f64), CommandRejection> {
    let p = required(params, name)?;
    Ok((text(p.description), p.quantity, p.price))
}

fn tare_deposit(
    params: Option<TareDepositParams>,
    name: &'static str,
) -> Result<(String, f64, f64), CommandRejection> {
    let p = required(params, name)?;
    Ok((text(p.description), p.quantity, p.unit_price))
}

impl Planned {
    /// Resolve a request; command names are matched case-insensitively
    pub fn resolve(r: FiscalCommandRequest) -> Result<Self, CommandRejection> {
        let name = match r.command.as_deref() {
            Some(name) => name.to_lowercase(),
            None => return Err(CommandRejection::MissingCommand),
        };

        let command = match name.as_str() {
            "resetfiscal" => DeviceCommand::ResetFiscal,
            "getfiscalinfo" => {
                let params = required(r.get_fiscal_info, "GetFiscalInfo")?;
                return Ok(Planned::FiscalInfo(params.info_type));
            }
            "moneyincurr" => DeviceCommand::MoneyInCurr {
                payment_type: CASH_PAYMENT_TYPE,
                amount: required(r.money_in_curr, "MoneyInCurr")?.amount,
            },
            "moneyoutcurr" => DeviceCommand::MoneyOutCurr {
                payment_type: CASH_PAYMENT_TYPE,
                amount: required(r.money_out_curr, "MoneyOutCurr")?.amount,
            },
            "opencashdrawer" => DeviceCommand::OpenCashDrawer,
            "skipprintreceipt" => DeviceCommand::SkipPrintReceipt,
            "printzreport" => DeviceCommand::PrintZReport,
            "printxreport" => DeviceCommand::PrintXReport,
            "printminixreport" => DeviceCommand::PrintMiniXReport,
            "printsumperiodicreport" => {
                let p = required(r.print_sum_periodic_report, "PrintSumPeriodicReport")?;
                DeviceCommand::PrintSumPeriodicReport {
                    date_from: text(p.date_from),
                    date_to: text(p.date_to),
                }
            }
            "printperiodicreport" => {
                let p = required(r.print_periodic_report, "PrintPeriodicReport")?;
                DeviceCommand::PrintPeriodicReport {
                    date_from: text(p.date_from),
                    date_to: text(p.date_to),
                }
            }
            "printsumperiodicreportbynumber" => {
                let p = required(
                    r.print_sum_periodic_report_by_number,
                    "PrintSumPeriodicReportByNumber",
                )?;
                DeviceCommand::PrintSumPeriodicReportByNumber {
                    no_from: p.no_from,
                    no_to: p.no_to,
                }
            }
            "printperiodicreportbynumber" => {
                let p = required(
                    r.print_periodic_report_by_number,
                    "PrintPeriodicReportByNumber",
                )?;
                DeviceCommand::PrintPeriodicReportByNumber {
                    no_from: p.no_from,
                    no_to: p.no_to,
                }
            }
            "customerdisplay2" => {
                let p = required(r.customer_display2, "CustomerDisplay2")?;
                DeviceCommand::CustomerDisplay2 {
                    line1: text(p.line1),
                    line2: text(p.line2),
                }
            }
            "customerdisplaypro" => DeviceCommand::CustomerDisplayPro {
                line: text(required(r.customer_display_pro, "CustomerDisplayPro")?.line),
            },

            "beginnonfiscalreceipt" => DeviceCommand::BeginNonFiscalReceipt,
            "printtareitem" => {
                let (description, quantity, price) = line_item(r.print_tare_item, "PrintTareItem")?;
                DeviceCommand::PrintTareItem {
                    description,
                    quantity,
                    price,
                }
            }
            "printtareitemvoid" => {
                let (description, quantity, price) =
                    line_item(r.print_tare_item_void, "PrintTareItemVoid")?;
                DeviceCommand::PrintTareItemVoid {
                    description,
                    quantity,
                    price,
                }
            }
            "printtaredeposit" => {
                let (description, quantity, unit_price) =
                    tare_deposit(r.print_tare_deposit, "PrintTareDeposit")?;
                DeviceCommand::PrintTareDeposit {
                    description,
                    quantity,
                    unit_price,
                }
            }
            "printtaredepositvoid" => {
                let (description, quantity, unit_price) =
                    tare_deposit(r.print_tare_deposit_void, "PrintTareDepositVoid")?;
                DeviceCommand::PrintTareDepositVoid {
                    description,
                    quantity,
                    unit_price,
                }
            }
            "printdepositreceive" => {
                let (description, quantity, price) =
                    line_item(r.print_deposit_receive, "PrintDepositReceive")?;
                DeviceCommand::PrintDepositReceive {
                    description,
                    quantity,
                    price,
                }
            }
            "printdepositreceivecredit" => {
                let (description, quantity, price) =
                    line_item(r.print_deposit_receive_credit, "PrintDepositReceiveCredit")?;
                DeviceCommand::PrintDepositReceiveCredit {
                    description,
                    quantity,
                    price,
                }
            }
            "printdepositreceivevoid" => {
                let (description, quantity, price) =
                    line_item(r.print_deposit_receive_void, "PrintDepositReceiveVoid")?;
                DeviceCommand::PrintDepositReceiveVoid {
                    description,
                    quantity,
                    price,
                }
            }
            "printdepositrefund" => {
                let (description, quantity, price) =
                    line_item(r.print_deposit_refund, "PrintDepositRefund")?;
                DeviceCommand::PrintDepositRefund {
                    description,
                    quantity,
                    price,
                }
            }
            "printbarcode" => {
                let p = required(r.print_bar_code, "PrintBarCode")?;
                DeviceCommand::PrintBarCode {
                    system: p.system,
                    height: p.height,
                    code: text(p.bar_code),
                }
            }
            // Legacy clients send the first spelling
            "printnonfisc_inline" | "printnonfiscalline" => {
                let p = required(r.print_non_fiscal_line, "PrintNonFiscalLine")?;
                DeviceCommand::PrintNonFiscalLine {
                    line: text(p.line),
                    attrib: p.attrib,
                }
            }
            "endnonfiscalreceipt" => DeviceCommand::EndNonFiscalReceipt,

            "beginfiscalreceipt" => DeviceCommand::BeginFiscalReceipt,
            "printrecitem" => {
                let p = required(r.print_rec_item, "PrintRecItem")?;
                DeviceCommand::PrintRecItem {
                    description: text(p.item_description),
                    quantity: p.item_quantity,
                    price: p.item_price,
                    vat_id: p.vat_id,
                    unit: text(p.item_unit),
                }
            }
            "printrecitemex" => {
                let p = required(r.print_rec_item_ex, "PrintRecItemEx")?;
                DeviceCommand::PrintRecItemEx {
                    description: text(p.description),
                    quantity: p.quantity,
                    price: p.price,
                    vat_id: p.vat,
                    unit: text(p.dimension),
                    group: text(p.group),
                }
            }
            "itemreturn" => {
                let p = required(r.item_return, "ItemReturn")?;
                DeviceCommand::ItemReturn {
                    description: text(p.description),
                    quantity: p.quantity,
                    price: p.price,
                    vat_id: p.vat,
                    unit: text(p.dimension),
                    percent: p.curr_percent,
                    absolute: p.curr_absolute,
                }
            }
            "itemreturnex" => {
                let p = required(r.item_return_ex, "ItemReturnEx")?;
                DeviceCommand::ItemReturnEx {
                    description: text(p.description),
                    quantity: p.quantity,
                    price: p.price,
                    vat_id: p.vat,
                    unit: text(p.dimension),
                    group: text(p.group),
                    percent: p.curr_percent,
                    absolute: p.curr_absolute,
                }
            }
            "printcommentline" => {
                let p = required(r.print_comment_line, "PrintCommentLine")?;
                DeviceCommand::PrintCommentLine {
                    line: text(p.comment_line),
                    attrib: p.comment_line_attrib,
                }
            }
            "discountadditionforitem" => {
                let p = required(r.discount_addition_for_item, "DiscountAdditionForItem")?;
                DeviceCommand::DiscountAdditionForItem {
                    discount_type: p.kind,
                    amount: p.amount,
                }
            }
            "discountadditionforreceipt" => {
                let p = required(r.discount_addition_for_receipt, "DiscountAdditionForReceipt")?;
                DeviceCommand::DiscountAdditionForReceipt {
                    discount_type: p.kind,
                    amount: p.amount,
                }
            }
            "transferprereceipt" => {
                let p = required(r.transfer_pre_receipt, "TransferPreReceipt")?;
                DeviceCommand::TransferPreReceipt {
                    receipt_no: text(p.receipt_no),
                    amount: p.amount,
                }
            }
            "endprereceipt" => DeviceCommand::EndPreReceipt,
            "linkprereceipt" => {
                let p = required(r.link_pre_receipt, "LinkPreReceipt")?;
                DeviceCommand::LinkPreReceipt {
                    receipt_no: text(p.receipt_no),
                    amount: p.amount,
                }
            }
            "setcustomercontact" => DeviceCommand::SetCustomerContact {
                contact: text(required(r.set_customer_contact, "SetCustomerContact")?.contact),
            },
            "refundreceiptinfo" => {
                let p = required(r.refund_receipt_info, "RefundReceiptInfo")?;
                DeviceCommand::RefundReceiptInfo {
                    ecr: text(p.ecr),
                    receipt_no: text(p.receipt_no),
                    doc_no: text(p.doc_no),
                }
            }

            "endfiscalreceiptcurr" => DeviceCommand::EndFiscalReceiptCurr(
                required(r.end_fiscal_receipt_curr, "EndFiscalReceiptCurr")?.into(),
            ),
            "endfiscalreceiptex" => DeviceCommand::EndFiscalReceiptEx(
                required(r.end_fiscal_receipt_ex, "EndFiscalReceiptEx")?.into(),
            ),
            "endfiscalcachereceipt" => DeviceCommand::EndFiscalCacheReceipt,
            "endrecpayment" => {
                DeviceCommand::EndRecPayment(required(r.end_rec_payment, "EndRecPayment")?.into())
            }
            "endrecpaymentex" => DeviceCommand::EndRecPaymentEx(
                required(r.end_rec_payment_ex, "EndRecPaymentEx")?.into(),
            ),
            "goodsreturncurr" => DeviceCommand::GoodsReturnCurr(
                required(r.goods_return_curr, "GoodsReturnCurr")?.into(),
            ),
            "goodsreturnex" => {
                DeviceCommand::GoodsReturnEx(required(r.goods_return_ex, "GoodsReturnEx")?.into())
            }
            "goodsreturncachereceipt" => DeviceCommand::GoodsReturnCacheReceipt,

            "printcopyoflastreceipt" => DeviceCommand::PrintCopyOfLastReceipt,
            "printcopyofreceipt" => {
                let p = required(r.print_copy_of_receipt, "PrintCopyOfReceipt")?;
                DeviceCommand::PrintCopyOfReceipt {
                    from: p.from,
                    to: p.to,
                }
            }
            "setfooter" => {
                let p = required(r.set_footer, "SetFooter")?;
                DeviceCommand::SetFooter {
                    lines: [p.line1, p.line2, p.line3, p.line4].map(text),
                    attrib: FOOTER_ATTRIB,
                }
            }

            _ => return Err(CommandRejection::Unknown(name)),
        };
        Ok(Planned::Device(command))
    }
}

#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    session: Arc<DeviceSession>,
}

impl CommandDispatcher {
    pub fn new(session: Arc<DeviceSession>) -> Self {
        Self { session }
    }

    pub async fn dispatch(&self, request: FiscalCommandRequest) -> FiscalReply {
        let guard = self.session.acquire().await;
        self.dispatch_on(&guard, request).await
    }

    /// [`Self::dispatch`] on a session the caller already holds
    pub async fn dispatch_on(
        &self,
        guard: &SessionGuard<'_>,
        request: FiscalCommandRequest,
    ) -> FiscalReply {
        let reply = match Planned::resolve(request) {
            Ok(Planned::Device(command)) => {
                tracing::info!(op = command.name(), "Dispatching fiscal command");
                guard.execute(command).await
            }
            Ok(Planned::FiscalInfo(info_type)) => {
                tracing::info!(info_type, "Dispatching fiscal info query");
                guard.fiscal_info(info_type).await
            }
            Err(rejection) => {
                tracing::warn!(reason = %rejection, "Fiscal command rejected");
                FiscalReply::failure(rejection.to_string())
            }
        };
        reply.normalized(COMMAND_FAILURE_MESSAGE)
    }
}
