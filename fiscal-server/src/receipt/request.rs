//! `/fullReceipt` request body and its conversion into [`ReceiptDescription`]
//!
//! Field names follow the wire format used by existing POS clients
//! (`ReceiptType`, `FiscalReceipt.ReceiptItem[].VatID`, `SetFooter.line1`, ...).
//! `null` entries inside lists are skipped.

use fiscal_device::status::DEFAULT_LINE_ATTRIB;
use fiscal_device::status::END_PRE_RECEIPT_MARKER;
use fiscal_device::{Payment, PaymentEx};
use serde::Deserialize;
use thiserror::Error;

use super::model::{
    CommentLine, Discount, FiscalReceipt, FiscalTerminator, Footer, LineEntry, NonFiscalReceipt,
    PreReceiptLink, ReceiptDescription, ReceiptKind, RefundInfo, Report, ReturnReceipt,
    ReturnTerminator, SaleItem, SpecialFunction,
};

/// Nullable list with nullable entries
pub type List<T> = Option<Vec<Option<T>>>;

fn present<T>(list: List<T>) -> impl Iterator<Item = T> {
    list.into_iter().flatten().flatten()
}

/// Why a receipt request was refused before any device call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReceiptRejection {
    #[error("ReceiptType is missing or null.")]
    MissingType,

    #[error("Invalid or unsupported ReceiptType: {0}")]
    UnsupportedType(String),

    #[error("Missing '{0}' object.")]
    MissingObject(&'static str),

    #[error("Invalid reportType: {0}")]
    UnsupportedReport(String),

    #[error("Invalid special function: {0}")]
    UnsupportedFunction(String),
}

// ========== Shared building blocks ==========

fn default_attrib() -> i32 {
    DEFAULT_LINE_ATTRIB
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommentLineDto {
    #[serde(default)]
    pub comment_line: Option<String>,
    #[serde(default = "default_attrib")]
    pub comment_line_attrib: i32,
}

impl From<CommentLineDto> for CommentLine {
    fn from(dto: CommentLineDto) -> Self {
        CommentLine {
            text: dto.comment_line.unwrap_or_default(),
            attrib: dto.comment_line_attrib,
        }
    }
}

fn comments(list: List<CommentLineDto>) -> Vec<CommentLine> {
    present(list).map(CommentLine::from).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FooterDto {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub line3: Option<String>,
    #[serde(default)]
    pub line4: Option<String>,
}

impl From<FooterDto> for Footer {
    fn from(dto: FooterDto) -> Self {
        Footer {
            lines: [dto.line1, dto.line2, dto.line3, dto.line4].map(Option::unwrap_or_default),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundInfoDto {
    #[serde(default, rename = "ECR")]
    pub ecr: Option<String>,
    #[serde(default, rename = "ReceiptNo")]
    pub receipt_no: Option<String>,
    #[serde(default, rename = "DocNo")]
    pub doc_no: Option<String>,
}

impl From<RefundInfoDto> for RefundInfo {
    fn from(dto: RefundInfoDto) -> Self {
        RefundInfo {
            ecr: dto.ecr.unwrap_or_default(),
            receipt_no: dto.receipt_no.unwrap_or_default(),
            doc_no: dto.doc_no.unwrap_or_default(),
        }
    }
}

/// `Cash`, `Credit1`..`Credit4`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PaymentDto {
    pub cash: f64,
    pub credit1: f64,
    pub credit2: f64,
    pub credit3: f64,
    pub credit4: f64,
}

impl From<PaymentDto> for Payment {
    fn from(dto: PaymentDto) -> Self {
        Payment {
            cash: dto.cash,
            credit: [dto.credit1, dto.credit2, dto.credit3, dto.credit4],
            currency: [0.0; 3],
        }
    }
}

/// `Cash`, `Credit1`..`Credit8`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PaymentExDto {
    pub cash: f64,
    pub credit1: f64,
    pub credit2: f64,
    pub credit3: f64,
    pub credit4: f64,
    pub credit5: f64,
    pub credit6: f64,
    pub credit7: f64,
    pub credit8: f64,
}

impl From<PaymentExDto> for PaymentEx {
    fn from(dto: PaymentExDto) -> Self {
        PaymentEx {
            cash: dto.cash,
            credit: [
                dto.credit1,
                dto.credit2,
                dto.credit3,
                dto.credit4,
                dto.credit5,
                dto.credit6,
                dto.credit7,
                dto.credit8,
            ],
        }
    }
}

// ========== Receipt lines ==========

fn default_unit() -> Option<String> {
    Some("vnt".to_string())
}

fn default_group() -> Option<String> {
    Some("GR".to_string())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemDiscountDto {
    #[serde(default)]
    pub item_discount_type: i32,
    #[serde(default)]
    pub item_discount_amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptDiscountDto {
    #[serde(default)]
    pub receipt_discount_type: i32,
    #[serde(default)]
    pub receipt_discount_amount: f64,
}

fn receipt_discount(dto: Option<ReceiptDiscountDto>) -> Option<Discount> {
    dto.and_then(|d| Discount::applicable(d.receipt_discount_type, d.receipt_discount_amount))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiptItemDto {
    #[serde(default)]
    pub item_description: Option<String>,
    #[serde(default)]
    pub item_quantity: f64,
    #[serde(default)]
    pub item_price: f64,
    #[serde(default, rename = "VatID")]
    pub vat_id: i32,
    #[serde(default = "default_unit")]
    pub item_unit: Option<String>,
    #[serde(default = "default_group")]
    pub item_group: Option<String>,
    #[serde(default)]
    pub item_discount: Option<ItemDiscountDto>,
    #[serde(default)]
    pub comment_lines: List<CommentLineDto>,
}

impl From<ReceiptItemDto> for SaleItem {
    fn from(dto: ReceiptItemDto) -> Self {
        SaleItem {
            description: dto.item_description.unwrap_or_default(),
            quantity: dto.item_quantity,
            price: dto.item_price,
            vat_id: dto.vat_id,
            unit: dto.item_unit.unwrap_or_default(),
            group: dto.item_group.unwrap_or_default(),
            discount: dto
                .item_discount
                .and_then(|d| Discount::applicable(d.item_discount_type, d.item_discount_amount)),
            comments: comments(dto.comment_lines),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepositReceiveDto {
    #[serde(default)]
    pub deposit_receive_desc: Option<String>,
    #[serde(default, rename = "DepositReceiveQ")]
    pub quantity: f64,
    #[serde(default)]
    pub deposit_receive_price: f64,
    #[serde(default)]
    pub comment_lines: List<CommentLineDto>,
}

impl From<DepositReceiveDto> for LineEntry {
    fn from(dto: DepositReceiveDto) -> Self {
        LineEntry {
            description: dto.deposit_receive_desc.unwrap_or_default(),
            quantity: dto.quantity,
            price: dto.deposit_receive_price,
            comments: comments(dto.comment_lines),
        }
    }
}

/// `PrintTareDeposit` / `PrintTareDepositVoid` list entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TareDepositDto {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub comment_lines: List<CommentLineDto>,
}

impl From<TareDepositDto> for LineEntry {
    fn from(dto: TareDepositDto) -> Self {
        LineEntry {
            description: dto.description.unwrap_or_default(),
            quantity: dto.quantity,
            price: dto.unit_price,
            comments: comments(dto.comment_lines),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TareDto {
    #[serde(default)]
    pub tare_description: Option<String>,
    #[serde(default)]
    pub tare_quantity: f64,
    #[serde(default)]
    pub tare_price: f64,
    #[serde(default)]
    pub comment_lines: List<CommentLineDto>,
}

impl From<TareDto> for LineEntry {
    fn from(dto: TareDto) -> Self {
        LineEntry {
            description: dto.tare_description.unwrap_or_default(),
            quantity: dto.tare_quantity,
            price: dto.tare_price,
            comments: comments(dto.comment_lines),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositReceiveCreditDto {
    #[serde(
        default,
        rename = "depositReceiveCreditDesc",
        alias = "DepositReceiveCreditDesc"
    )]
    pub description: Option<String>,
    #[serde(default, rename = "DepositReceiveCreditQ")]
    pub quantity: f64,
    #[serde(default, rename = "DepositReceiveCreditPrice")]
    pub price: f64,
    #[serde(default, rename = "CommentLines")]
    pub comment_lines: List<CommentLineDto>,
}

impl From<DepositReceiveCreditDto> for LineEntry {
    fn from(dto: DepositReceiveCreditDto) -> Self {
        LineEntry {
            description: dto.description.unwrap_or_default(),
            quantity: dto.quantity,
            price: dto.price,
            comments: comments(dto.comment_lines),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepositRefundDto {
    #[serde(default)]
    pub deposit_refund_description: Option<String>,
    #[serde(default)]
    pub deposit_refund_quantity: f64,
    #[serde(default)]
    pub deposit_refund_price: f64,
    #[serde(default)]
    pub comment_lines: List<CommentLineDto>,
}

impl From<DepositRefundDto> for LineEntry {
    fn from(dto: DepositRefundDto) -> Self {
        LineEntry {
            description: dto.deposit_refund_description.unwrap_or_default(),
            quantity: dto.deposit_refund_quantity,
            price: dto.deposit_refund_price,
            comments: comments(dto.comment_lines),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LinkPreReceiptDto {
    #[serde(default)]
    pub receipt_no: Option<String>,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndPreReceiptDto {
    #[serde(default)]
    pub end_pre_receipt_line: Option<String>,
}

// ========== Receipt bodies ==========

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FiscalReceiptDto {
    pub receipt_item: List<ReceiptItemDto>,
    pub link_pre_receipt: List<LinkPreReceiptDto>,
    pub deposit_receive: List<DepositReceiveDto>,
    pub print_tare_deposit: List<TareDepositDto>,
    pub print_tare_deposit_void: List<TareDepositDto>,
    pub receipt_payment: Option<PaymentDto>,
    pub receipt_payment_ex: Option<PaymentExDto>,
    pub receipt_discount: Option<ReceiptDiscountDto>,
    pub end_pre_receipt: Option<EndPreReceiptDto>,
}

impl From<FiscalReceiptDto> for FiscalReceipt {
    fn from(dto: FiscalReceiptDto) -> Self {
        let pre_receipt = dto
            .end_pre_receipt
            .and_then(|e| e.end_pre_receipt_line)
            .is_some_and(|line| line == END_PRE_RECEIPT_MARKER);
        let terminator = FiscalTerminator::select(
            pre_receipt,
            dto.receipt_payment_ex.unwrap_or_default().into(),
            dto.receipt_payment.unwrap_or_default().into(),
        );

        FiscalReceipt {
            items: present(dto.receipt_item).map(SaleItem::from).collect(),
            deposits: present(dto.deposit_receive).map(LineEntry::from).collect(),
            tare_deposits: present(dto.print_tare_deposit).map(LineEntry::from).collect(),
            tare_deposit_voids: present(dto.print_tare_deposit_void)
                .map(LineEntry::from)
                .collect(),
            pre_receipt_links: present(dto.link_pre_receipt)
                .map(|link| PreReceiptLink {
                    receipt_no: link.receipt_no.unwrap_or_default(),
                    amount: link.amount,
                })
                .collect(),
            discount: receipt_discount(dto.receipt_discount),
            terminator,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ReturnReceiptDto {
    pub receipt_item: List<ReceiptItemDto>,
    pub goods_return_payment: Option<PaymentDto>,
    pub goods_return_payment_ex: Option<PaymentExDto>,
    pub receipt_discount: Option<ReceiptDiscountDto>,
    pub refund_receipt_info: Option<RefundInfoDto>,
    pub return_receipt_info: Option<RefundInfoDto>,
}

impl TryFrom<ReturnReceiptDto> for ReturnReceipt {
    type Error = ReceiptRejection;

    fn try_from(dto: ReturnReceiptDto) -> Result<Self, Self::Error> {
        if dto.receipt_item.is_none() {
            return Err(ReceiptRejection::MissingObject("ReceiptItem"));
        }
        let terminator = ReturnTerminator::select(
            dto.goods_return_payment_ex.unwrap_or_default().into(),
            dto.goods_return_payment.unwrap_or_default().into(),
        );
        Ok(ReturnReceipt {
            items: present(dto.receipt_item).map(SaleItem::from).collect(),
            discount: receipt_discount(dto.receipt_discount),
            refund_info: dto.refund_receipt_info.map(RefundInfo::from),
            return_info: dto.return_receipt_info.map(RefundInfo::from),
            terminator,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NonFiscalReceiptDto {
    pub tare: List<TareDto>,
    pub deposit_receive: List<DepositReceiveDto>,
    pub print_tare_deposit: List<TareDepositDto>,
    pub print_tare_deposit_void: List<TareDepositDto>,
    pub deposit_receive_credit: List<DepositReceiveCreditDto>,
    pub deposit_refund: List<DepositRefundDto>,
}

impl From<NonFiscalReceiptDto> for NonFiscalReceipt {
    fn from(dto: NonFiscalReceiptDto) -> Self {
        NonFiscalReceipt {
            tares: present(dto.tare).map(LineEntry::from).collect(),
            deposits: present(dto.deposit_receive).map(LineEntry::from).collect(),
            tare_deposits: present(dto.print_tare_deposit).map(LineEntry::from).collect(),
            tare_deposit_voids: present(dto.print_tare_deposit_void)
                .map(LineEntry::from)
                .collect(),
            deposit_credits: present(dto.deposit_receive_credit)
                .map(LineEntry::from)
                .collect(),
            deposit_refunds: present(dto.deposit_refund).map(LineEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ReportDto {
    pub report_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub no_from: i32,
    pub no_to: i32,
}

impl TryFrom<ReportDto> for Report {
    type Error = ReceiptRejection;

    fn try_from(dto: ReportDto) -> Result<Self, Self::Error> {
        let report_type = dto.report_type.unwrap_or_default();
        let date_from = dto.date_from.unwrap_or_default();
        let date_to = dto.date_to.unwrap_or_default();
        let report = match report_type.to_lowercase().as_str() {
            "printx" => Report::X,
            "printz" => Report::Z,
            "minix" => Report::MiniX,
            "sumperiodic" => Report::SumPeriodic { date_from, date_to },
            "periodic" => Report::Periodic { date_from, date_to },
            "sumperiodicbynumber" => Report::SumPeriodicByNumber {
                no_from: dto.no_from,
                no_to: dto.no_to,
            },
            "periodicbynumber" => Report::PeriodicByNumber {
                no_from: dto.no_from,
                no_to: dto.no_to,
            },
            _ => return Err(ReceiptRejection::UnsupportedReport(report_type)),
        };
        Ok(report)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SpecialFunctionDto {
    pub function: Option<String>,
    pub amount: f64,
    pub rec_no: Option<String>,
}

impl TryFrom<SpecialFunctionDto> for SpecialFunction {
    type Error = ReceiptRejection;

    fn try_from(dto: SpecialFunctionDto) -> Result<Self, Self::Error> {
        let function = dto.function.unwrap_or_default();
        let special = match function.to_lowercase().as_str() {
            "moneyin" | "moneyincurr" => SpecialFunction::MoneyIn { amount: dto.amount },
            "moneyout" | "moneyoutcurr" => SpecialFunction::MoneyOut { amount: dto.amount },
            "transferprereceipt" => SpecialFunction::TransferPreReceipt {
                receipt_no: dto.rec_no.unwrap_or_default(),
                amount: dto.amount,
            },
            "opencashdrawer" => SpecialFunction::OpenCashDrawer,
            _ => return Err(ReceiptRejection::UnsupportedFunction(function)),
        };
        Ok(special)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FiscalInfoDto {
    pub info_type: i32,
}

// ========== Top-level request ==========

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ReceiptRequest {
    pub receipt_type: Option<String>,
    pub fiscal_receipt: Option<FiscalReceiptDto>,
    pub non_fiscal_receipt: Option<NonFiscalReceiptDto>,
    pub return_receipt: Option<ReturnReceiptDto>,
    pub report: Option<ReportDto>,
    pub special_function: Option<SpecialFunctionDto>,
    #[serde(alias = "getFiscalInfo")]
    pub get_fiscal_info: Option<FiscalInfoDto>,
    pub top_comment_lines: List<CommentLineDto>,
    pub bottom_comment_lines: List<CommentLineDto>,
    pub set_footer: Option<FooterDto>,
}

impl TryFrom<ReceiptRequest> for ReceiptDescription {
    type Error = ReceiptRejection;

    fn try_from(request: ReceiptRequest) -> Result<Self, Self::Error> {
        let receipt_type = match request.receipt_type {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ReceiptRejection::MissingType),
        };

        let kind = match receipt_type.to_lowercase().as_str() {
            // An absent body prints an empty receipt, as legacy clients expect
            "fiscal" => ReceiptKind::Fiscal(request.fiscal_receipt.unwrap_or_default().into()),
            "nonfiscal" => {
                ReceiptKind::NonFiscal(request.non_fiscal_receipt.unwrap_or_default().into())
            }
            "return" => ReceiptKind::Return(
                request
                    .return_receipt
                    .ok_or(ReceiptRejection::MissingObject("ReturnReceipt"))?
                    .try_into()?,
            ),
            "report" => ReceiptKind::Report(
                request
                    .report
                    .ok_or(ReceiptRejection::MissingObject("Report"))?
                    .try_into()?,
            ),
            "special" => ReceiptKind::Special(
                request
                    .special_function
                    .ok_or(ReceiptRejection::MissingObject("SpecialFunction"))?
                    .try_into()?,
            ),
            "getfiscalinfo" => ReceiptKind::InfoQuery {
                info_type: request
                    .get_fiscal_info
                    .ok_or(ReceiptRejection::MissingObject("getFiscalInfo"))?
                    .info_type,
            },
            "reset" => ReceiptKind::Reset,
            _ => return Err(ReceiptRejection::UnsupportedType(receipt_type)),
        };

        Ok(ReceiptDescription {
            kind,
            top_comments: comments(request.top_comment_lines),
            bottom_comments: comments(request.bottom_comment_lines),
            footer: request.set_footer.map(Footer::from),
        })
    }
}
