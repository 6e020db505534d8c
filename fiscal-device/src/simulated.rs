//! In-memory virtual cash register
//!
//! Used when no native driver is linked into the build. The register memory
//! (receipt counter, journal) is shared between handles created by the same
//! [`SimulatedFactory`], so it survives a reload the way real hardware does.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::device::{DeviceFactory, FiscalDevice, Payment, PaymentEx};
use crate::error::{DeviceError, DeviceInitError, DeviceResult};
use crate::status::{INFO_CASH_REGISTER_NO, INFO_RECEIPT_NO, SUCCESS};

/// Receipt already open when a new one was requested
pub const ERR_RECEIPT_OPEN: i32 = 1;
/// Line or terminator sent with no matching receipt open
pub const ERR_NO_RECEIPT: i32 = 2;

/// Journal entries kept; older entries are dropped first
pub const JOURNAL_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Fiscal,
    NonFiscal,
}

#[derive(Debug)]
struct Register {
    register_no: String,
    next_receipt_no: u32,
    mode: Mode,
    journal: VecDeque<String>,
}

impl Register {
    fn record(&mut self, entry: String) {
        if self.journal.len() == JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
        self.journal.push_back(entry);
    }

    fn journal(&self) -> Vec<String> {
        self.journal.iter().cloned().collect()
    }
}

/// Virtual device handle
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    register: Arc<Mutex<Register>>,
    released: Arc<AtomicBool>,
}

impl SimulatedDevice {
    pub fn new(register_no: &str) -> Self {
        Self::with_register(Arc::new(Mutex::new(Register {
            register_no: register_no.to_string(),
            next_receipt_no: 1,
            mode: Mode::Idle,
            journal: VecDeque::new(),
        })))
    }

    fn with_register(register: Arc<Mutex<Register>>) -> Self {
        Self {
            register,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The last [`JOURNAL_CAPACITY`] accepted calls, oldest first
    pub fn journal(&self) -> Vec<String> {
        self.register.lock().journal()
    }

    fn check_live(&self) -> DeviceResult<()> {
        if self.released.load(Ordering::Acquire) {
            return Err(DeviceError::Unavailable("handle released".to_string()));
        }
        Ok(())
    }

    /// Operation valid in any mode
    fn any(&self, entry: String) -> DeviceResult<i32> {
        self.check_live()?;
        debug!(entry = %entry, "simulated call");
        self.register.lock().record(entry);
        Ok(SUCCESS)
    }

    fn begin(&self, mode: Mode, entry: &str) -> DeviceResult<i32> {
        self.check_live()?;
        let mut reg = self.register.lock();
        if reg.mode != Mode::Idle {
            return Ok(ERR_RECEIPT_OPEN);
        }
        reg.mode = mode;
        reg.record(entry.to_string());
        Ok(SUCCESS)
    }

    /// Line inside an open receipt of the given mode
    fn line(&self, mode: Mode, entry: String) -> DeviceResult<i32> {
        self.check_live()?;
        let mut reg = self.register.lock();
        if reg.mode != mode {
            return Ok(ERR_NO_RECEIPT);
        }
        reg.record(entry);
        Ok(SUCCESS)
    }

    /// Line accepted in either kind of open receipt
    fn open_line(&self, entry: String) -> DeviceResult<i32> {
        self.check_live()?;
        let mut reg = self.register.lock();
        if reg.mode == Mode::Idle {
            return Ok(ERR_NO_RECEIPT);
        }
        reg.record(entry);
        Ok(SUCCESS)
    }

    fn end(&self, mode: Mode, entry: String) -> DeviceResult<i32> {
        self.check_live()?;
        let mut reg = self.register.lock();
        if reg.mode != mode {
            return Ok(ERR_NO_RECEIPT);
        }
        reg.mode = Mode::Idle;
        reg.next_receipt_no += 1;
        reg.record(entry);
        Ok(SUCCESS)
    }
}

fn items(description: &str, quantity: f64, price: f64) -> String {
    format!("{description} x{quantity} @ {price:.2}")
}

fn pay(payment: &Payment) -> String {
    format!(
        "cash={:.2} credit={:?} currency={:?}",
        payment.cash, payment.credit, payment.currency
    )
}

fn pay_ex(payment: &PaymentEx) -> String {
    format!("cash={:.2} credit={:?}", payment.cash, payment.credit)
}

impl FiscalDevice for SimulatedDevice {
    fn reset_fiscal(&self) -> DeviceResult<i32> {
        self.check_live()?;
        let mut reg = self.register.lock();
        reg.mode = Mode::Idle;
        reg.record("ResetFiscal".to_string());
        Ok(SUCCESS)
    }

    fn open_cash_drawer(&self) -> DeviceResult<i32> {
        self.any("OpenCashDrawer".to_string())
    }

    fn skip_print_receipt(&self) -> DeviceResult<i32> {
        self.any("SkipPrintReceipt".to_string())
    }

    fn money_in_curr(&self, payment_type: i32, amount: f64) -> DeviceResult<i32> {
        self.any(format!("MoneyInCurr type={payment_type} {amount:.2}"))
    }

    fn money_out_curr(&self, payment_type: i32, amount: f64) -> DeviceResult<i32> {
        self.any(format!("MoneyOutCurr type={payment_type} {amount:.2}"))
    }

    fn customer_display2(&self, line1: &str, line2: &str) -> DeviceResult<i32> {
        self.any(format!("CustomerDisplay2 {line1} | {line2}"))
    }

    fn customer_display_pro(&self, line: &str) -> DeviceResult<i32> {
        self.any(format!("CustomerDisplayPro {line}"))
    }

    fn set_customer_contact(&self, contact: &str) -> DeviceResult<i32> {
        self.any(format!("SetCustomerContact {contact}"))
    }

    fn set_footer(&self, lines: [&str; 4], attrib: i32) -> DeviceResult<i32> {
        self.any(format!("SetFooter attrib={attrib} {}", lines.join(" | ")))
    }

    fn print_copy_of_last_receipt(&self) -> DeviceResult<i32> {
        self.any("PrintCopyOfLastReceipt".to_string())
    }

    fn print_copy_of_receipt(&self, from: i32, to: i32) -> DeviceResult<i32> {
        self.any(format!("PrintCopyOfReceipt {from}..{to}"))
    }

    fn get_fiscal_info(&self, info_type: i32) -> DeviceResult<(i32, String)> {
        self.check_live()?;
        let reg = self.register.lock();
        let text = match info_type {
            INFO_RECEIPT_NO => reg.next_receipt_no.to_string(),
            INFO_CASH_REGISTER_NO => reg.register_no.clone(),
            _ => String::new(),
        };
        Ok((SUCCESS, text))
    }

    fn print_x_report(&self) -> DeviceResult<i32> {
        self.any("PrintXReport".to_string())
    }

    fn print_z_report(&self) -> DeviceResult<i32> {
        self.any("PrintZReport".to_string())
    }

    fn print_mini_x_report(&self) -> DeviceResult<i32> {
        self.any("PrintMiniXReport".to_string())
    }

    fn print_sum_periodic_report(&self, date_from: &str, date_to: &str) -> DeviceResult<i32> {
        self.any(format!("PrintSumPeriodicReport {date_from}..{date_to}"))
    }

    fn print_periodic_report(&self, date_from: &str, date_to: &str) -> DeviceResult<i32> {
        self.any(format!("PrintPeriodicReport {date_from}..{date_to}"))
    }

    fn print_sum_periodic_report_by_number(&self, no_from: i32, no_to: i32) -> DeviceResult<i32> {
        self.any(format!("PrintSumPeriodicReportByNumber {no_from}..{no_to}"))
    }

    fn print_periodic_report_by_number(&self, no_from: i32, no_to: i32) -> DeviceResult<i32> {
        self.any(format!("PrintPeriodicReportByNumber {no_from}..{no_to}"))
    }

    fn begin_non_fiscal_receipt(&self) -> DeviceResult<i32> {
        self.begin(Mode::NonFiscal, "BeginNonFiscalReceipt")
    }

    fn print_non_fiscal_line(&self, line: &str, attrib: i32) -> DeviceResult<i32> {
        self.line(Mode::NonFiscal, format!("PrintNonFiscalLine [{attrib}] {line}"))
    }

    fn end_non_fiscal_receipt(&self) -> DeviceResult<i32> {
        self.end(Mode::NonFiscal, "EndNonFiscalReceipt".to_string())
    }

    fn print_bar_code(&self, system: i32, height: i32, code: &str) -> DeviceResult<i32> {
        self.any(format!("PrintBarCode system={system} height={height} {code}"))
    }

    fn print_tare_item(&self, description: &str, quantity: f64, price: f64) -> DeviceResult<i32> {
        self.open_line(format!("PrintTareItem {}", items(description, quantity, price)))
    }

    fn print_tare_item_void(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!("PrintTareItemVoid {}", items(description, quantity, price)))
    }

    fn print_tare_deposit(
        &self,
        description: &str,
        quantity: f64,
        unit_price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!(
            "PrintTareDeposit {}",
            items(description, quantity, unit_price)
        ))
    }

    fn print_tare_deposit_void(
        &self,
        description: &str,
        quantity: f64,
        unit_price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!(
            "PrintTareDepositVoid {}",
            items(description, quantity, unit_price)
        ))
    }

    fn print_deposit_receive(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!(
            "PrintDepositReceive {}",
            items(description, quantity, price)
        ))
    }

    fn print_deposit_receive_credit(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!(
            "PrintDepositReceiveCredit {}",
            items(description, quantity, price)
        ))
    }

    fn print_deposit_receive_void(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!(
            "PrintDepositReceiveVoid {}",
            items(description, quantity, price)
        ))
    }

    fn print_deposit_refund(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
    ) -> DeviceResult<i32> {
        self.open_line(format!(
            "PrintDepositRefund {}",
            items(description, quantity, price)
        ))
    }

    fn begin_fiscal_receipt(&self) -> DeviceResult<i32> {
        self.begin(Mode::Fiscal, "BeginFiscalReceipt")
    }

    fn print_rec_item(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
    ) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!(
                "PrintRecItem {} vat={vat_id} {unit}",
                items(description, quantity, price)
            ),
        )
    }

    fn print_rec_item_ex(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
        group: &str,
    ) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!(
                "PrintRecItemEx {} vat={vat_id} {unit} group={group}",
                items(description, quantity, price)
            ),
        )
    }

    fn item_return(
        &self,
        description: &str,
        quantity: f64,
        price: f64,
        vat_id: i32,
        unit: &str,
        percent: f64,
        absolute: f64,
    ) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!(
                "ItemReturn {} vat={vat_id} {unit} {percent}% {absolute:.2}",
                items(description, quantity, price)
            ),
        )
    }

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
    ) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!(
                "ItemReturnEx {} vat={vat_id} {unit} group={group} {percent}% {absolute:.2}",
                items(description, quantity, price)
            ),
        )
    }

    fn print_comment_line(&self, line: &str, attrib: i32) -> DeviceResult<i32> {
        self.line(Mode::Fiscal, format!("PrintCommentLine [{attrib}] {line}"))
    }

    fn discount_addition_for_item(&self, discount_type: i32, amount: f64) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!("DiscountAdditionForItem type={discount_type} {amount:.2}"),
        )
    }

    fn discount_addition_for_receipt(
        &self,
        discount_type: i32,
        amount: f64,
    ) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!("DiscountAdditionForReceipt type={discount_type} {amount:.2}"),
        )
    }

    fn refund_receipt_info(&self, ecr: &str, receipt_no: &str, doc_no: &str) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!("RefundReceiptInfo ecr={ecr} receipt={receipt_no} doc={doc_no}"),
        )
    }

    fn transfer_pre_receipt(&self, receipt_no: &str, amount: f64) -> DeviceResult<i32> {
        self.any(format!("TransferPreReceipt {receipt_no} {amount:.2}"))
    }

    fn link_pre_receipt(&self, receipt_no: &str, amount: f64) -> DeviceResult<i32> {
        self.line(
            Mode::Fiscal,
            format!("LinkPreReceipt {receipt_no} {amount:.2}"),
        )
    }

    fn end_pre_receipt(&self) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, "EndPreReceipt".to_string())
    }

    fn end_fiscal_receipt_curr(&self, payment: &Payment) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, format!("EndFiscalReceiptCurr {}", pay(payment)))
    }

    fn end_fiscal_receipt_ex(&self, payment: &PaymentEx) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, format!("EndFiscalReceiptEx {}", pay_ex(payment)))
    }

    fn end_fiscal_cache_receipt(&self) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, "EndFiscalCacheReceipt".to_string())
    }

    fn end_rec_payment(&self, payment: &Payment) -> DeviceResult<i32> {
        self.line(Mode::Fiscal, format!("EndRecPayment {}", pay(payment)))
    }

    fn end_rec_payment_ex(&self, payment: &PaymentEx) -> DeviceResult<i32> {
        self.line(Mode::Fiscal, format!("EndRecPaymentEx {}", pay_ex(payment)))
    }

    fn goods_return_curr(&self, payment: &Payment) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, format!("GoodsReturnCurr {}", pay(payment)))
    }

    fn goods_return_ex(&self, payment: &PaymentEx) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, format!("GoodsReturnEx {}", pay_ex(payment)))
    }

    fn goods_return_cache_receipt(&self) -> DeviceResult<i32> {
        self.end(Mode::Fiscal, "GoodsReturnCacheReceipt".to_string())
    }

    fn release(&self) -> DeviceResult<()> {
        self.released.store(true, Ordering::Release);
        Ok(())
    }
}

/// Factory for [`SimulatedDevice`] handles sharing one register memory
#[derive(Debug, Clone)]
pub struct SimulatedFactory {
    register: Arc<Mutex<Register>>,
}

impl SimulatedFactory {
    pub fn new(register_no: &str) -> Self {
        Self {
            register: SimulatedDevice::new(register_no).register,
        }
    }

    /// Journal of the shared register memory
    pub fn journal(&self) -> Vec<String> {
        self.register.lock().journal()
    }
}

impl DeviceFactory for SimulatedFactory {
    fn name(&self) -> &str {
        "simulated"
    }

    fn create(&self) -> Result<Arc<dyn FiscalDevice>, DeviceInitError> {
        info!(register_no = %self.register.lock().register_no, "Creating simulated device handle");
        Ok(Arc::new(SimulatedDevice::with_register(self.register.clone())))
    }
}
