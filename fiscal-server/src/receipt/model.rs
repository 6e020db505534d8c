//! Typed receipt description consumed by the engine
//!
//! Built from the JSON request by [`super::request`]; every field here is
//! already validated, so the engine only sequences device calls.

use fiscal_device::status::NO_DISCOUNT;
use fiscal_device::{DeviceCommand, Payment, PaymentEx};

#[derive(Debug, Clone, PartialEq)]
pub struct CommentLine {
    pub text: String,
    pub attrib: i32,
}

/// Item or receipt level discount / addition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discount {
    pub kind: i32,
    pub amount: f64,
}

impl Discount {
    /// `None` for the "no discount" sentinel type
    pub fn applicable(kind: i32, amount: f64) -> Option<Self> {
        (kind != NO_DISCOUNT).then_some(Self { kind, amount })
    }
}

/// Sold (or returned) goods line
#[derive(Debug, Clone, PartialEq)]
pub struct SaleItem {
    pub description: String,
    pub quantity: f64,
    pub price: f64,
    pub vat_id: i32,
    pub unit: String,
    pub group: String,
    pub discount: Option<Discount>,
    pub comments: Vec<CommentLine>,
}

/// Deposit / tare line: description, quantity, price and trailing comments
#[derive(Debug, Clone, PartialEq)]
pub struct LineEntry {
    pub description: String,
    pub quantity: f64,
    pub price: f64,
    pub comments: Vec<CommentLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreReceiptLink {
    pub receipt_no: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundInfo {
    pub ecr: String,
    pub receipt_no: String,
    pub doc_no: String,
}

/// Four footer lines
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Footer {
    pub lines: [String; 4],
}

/// How a fiscal receipt is closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FiscalTerminator {
    PreReceipt,
    Extended(PaymentEx),
    Standard(Payment),
    Cached,
}

impl FiscalTerminator {
    /// Pre-receipt marker wins, then a positive extended sum, then a positive
    /// standard sum; otherwise the device caches the receipt
    pub fn select(pre_receipt: bool, extended: PaymentEx, standard: Payment) -> Self {
        if pre_receipt {
            Self::PreReceipt
        } else if extended.total() > 0.0 {
            Self::Extended(extended)
        } else if standard.total() > 0.0 {
            Self::Standard(Payment {
                currency: [0.0; 3],
                ..standard
            })
        } else {
            Self::Cached
        }
    }

    pub fn command(&self) -> DeviceCommand {
        match *self {
            Self::PreReceipt => DeviceCommand::EndPreReceipt,
            Self::Extended(payment) => DeviceCommand::EndFiscalReceiptEx(payment),
            Self::Standard(payment) => DeviceCommand::EndFiscalReceiptCurr(payment),
            Self::Cached => DeviceCommand::EndFiscalCacheReceipt,
        }
    }
}

/// How a return receipt is closed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnTerminator {
    Extended(PaymentEx),
    Standard(Payment),
    Cached,
}

impl ReturnTerminator {
    pub fn select(extended: PaymentEx, standard: Payment) -> Self {
        if extended.total() > 0.0 {
            Self::Extended(extended)
        } else if standard.total() > 0.0 {
            Self::Standard(Payment {
                currency: [0.0; 3],
                ..standard
            })
        } else {
            Self::Cached
        }
    }

    pub fn command(&self) -> DeviceCommand {
        match *self {
            Self::Extended(payment) => DeviceCommand::GoodsReturnEx(payment),
            Self::Standard(payment) => DeviceCommand::GoodsReturnCurr(payment),
            Self::Cached => DeviceCommand::GoodsReturnCacheReceipt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FiscalReceipt {
    pub items: Vec<SaleItem>,
    pub deposits: Vec<LineEntry>,
    pub tare_deposits: Vec<LineEntry>,
    pub tare_deposit_voids: Vec<LineEntry>,
    pub pre_receipt_links: Vec<PreReceiptLink>,
    pub discount: Option<Discount>,
    pub terminator: FiscalTerminator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnReceipt {
    pub items: Vec<SaleItem>,
    pub discount: Option<Discount>,
    pub refund_info: Option<RefundInfo>,
    pub return_info: Option<RefundInfo>,
    pub terminator: ReturnTerminator,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NonFiscalReceipt {
    pub tares: Vec<LineEntry>,
    pub deposits: Vec<LineEntry>,
    pub tare_deposits: Vec<LineEntry>,
    pub tare_deposit_voids: Vec<LineEntry>,
    pub deposit_credits: Vec<LineEntry>,
    pub deposit_refunds: Vec<LineEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    X,
    Z,
    MiniX,
    SumPeriodic { date_from: String, date_to: String },
    Periodic { date_from: String, date_to: String },
    SumPeriodicByNumber { no_from: i32, no_to: i32 },
    PeriodicByNumber { no_from: i32, no_to: i32 },
}

impl Report {
    pub fn command(&self) -> DeviceCommand {
        match self {
            Self::X => DeviceCommand::PrintXReport,
            Self::Z => DeviceCommand::PrintZReport,
            Self::MiniX => DeviceCommand::PrintMiniXReport,
            Self::SumPeriodic { date_from, date_to } => DeviceCommand::PrintSumPeriodicReport {
                date_from: date_from.clone(),
                date_to: date_to.clone(),
            },
            Self::Periodic { date_from, date_to } => DeviceCommand::PrintPeriodicReport {
                date_from: date_from.clone(),
                date_to: date_to.clone(),
            },
            Self::SumPeriodicByNumber { no_from, no_to } => {
                DeviceCommand::PrintSumPeriodicReportByNumber {
                    no_from: *no_from,
                    no_to: *no_to,
                }
            }
            Self::PeriodicByNumber { no_from, no_to } => {
                DeviceCommand::PrintPeriodicReportByNumber {
                    no_from: *no_from,
                    no_to: *no_to,
                }
            }
        }
    }
}

/// Cash movement and drawer functions
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialFunction {
    MoneyIn { amount: f64 },
    MoneyOut { amount: f64 },
    TransferPreReceipt { receipt_no: String, amount: f64 },
    OpenCashDrawer,
}

/// Payment type used for cash in/out movements
const CASH_PAYMENT_TYPE: i32 = 0;

impl SpecialFunction {
    pub fn command(&self) -> DeviceCommand {
        match self {
            Self::MoneyIn { amount } => DeviceCommand::MoneyInCurr {
                payment_type: CASH_PAYMENT_TYPE,
                amount: *amount,
            },
            Self::MoneyOut { amount } => DeviceCommand::MoneyOutCurr {
                payment_type: CASH_PAYMENT_TYPE,
                amount: *amount,
            },
            Self::TransferPreReceipt { receipt_no, amount } => DeviceCommand::TransferPreReceipt {
                receipt_no: receipt_no.clone(),
                amount: *amount,
            },
            Self::OpenCashDrawer => DeviceCommand::OpenCashDrawer,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptKind {
    Fiscal(FiscalReceipt),
    NonFiscal(NonFiscalReceipt),
    Return(ReturnReceipt),
    Report(Report),
    Special(SpecialFunction),
    InfoQuery { info_type: i32 },
    Reset,
}

impl ReceiptKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fiscal(_) => "fiscal",
            Self::NonFiscal(_) => "nonfiscal",
            Self::Return(_) => "return",
            Self::Report(_) => "report",
            Self::Special(_) => "special",
            Self::InfoQuery { .. } => "getfiscalinfo",
            Self::Reset => "reset",
        }
    }
}

/// One receipt request: the kind-specific body plus the shared decorations
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDescription {
    pub kind: ReceiptKind,
    pub top_comments: Vec<CommentLine>,
    pub bottom_comments: Vec<CommentLine>,
    pub footer: Option<Footer>,
}

impl ReceiptDescription {
    pub fn new(kind: ReceiptKind) -> Self {
        Self {
            kind,
            top_comments: Vec::new(),
            bottom_comments: Vec::new(),
            footer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_payment_wins_over_standard() {
        let mut extended = PaymentEx::default();
        extended.credit[5] = 4.0;
        let standard = Payment {
            cash: 10.0,
            ..Payment::default()
        };
        assert_eq!(
            FiscalTerminator::select(false, extended, standard),
            FiscalTerminator::Extended(extended)
        );
        assert_eq!(
            ReturnTerminator::select(extended, standard),
            ReturnTerminator::Extended(extended)
        );
    }

    #[test]
    fn test_pre_receipt_marker_wins_over_payments() {
        let extended = PaymentEx {
            cash: 1.0,
            ..PaymentEx::default()
        };
        assert_eq!(
            FiscalTerminator::select(true, extended, Payment::default()),
            FiscalTerminator::PreReceipt
        );
    }

    #[test]
    fn test_standard_payment_zero_fills_currencies() {
        let standard = Payment {
            cash: 5.0,
            credit: [0.0, 2.0, 0.0, 0.0],
            currency: [9.0, 9.0, 9.0],
        };
        match FiscalTerminator::select(false, PaymentEx::default(), standard) {
            FiscalTerminator::Standard(payment) => {
                assert_eq!(payment.cash, 5.0);
                assert_eq!(payment.credit[1], 2.0);
                assert_eq!(payment.currency, [0.0; 3]);
            }
            other => panic!("unexpected terminator {other:?}"),
        }
    }

    #[test]
    fn test_no_payment_uses_cached_end() {
        assert_eq!(
            FiscalTerminator::select(false, PaymentEx::default(), Payment::default()).command(),
            DeviceCommand::EndFiscalCacheReceipt
        );
        assert_eq!(
            ReturnTerminator::select(PaymentEx::default(), Payment::default()).command(),
            DeviceCommand::GoodsReturnCacheReceipt
        );
    }

    #[test]
    fn test_sentinel_discount_is_dropped() {
        assert_eq!(Discount::applicable(999, 5.0), None);
        assert_eq!(
            Discount::applicable(1, 5.0),
            Some(Discount {
                kind: 1,
                amount: 5.0
            })
        );
    }

    #[test]
    fn test_special_cash_movements_use_cash_payment_type() {
        assert_eq!(
            SpecialFunction::MoneyOut { amount: 3.0 }.command(),
            DeviceCommand::MoneyOutCurr {
                payment_type: 0,
                amount: 3.0
            }
        );
    }
}
