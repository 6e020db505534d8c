//! Scripted device shared by the integration tests
//!
//! Every call is recorded by name. Behaviour per operation is scripted as a
//! queue of one-shot outcomes; an empty queue answers `0`.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fiscal_device::{
    DeviceError, DeviceFactory, DeviceInitError, DeviceResult, FiscalDevice, Payment, PaymentEx,
};
use fiscal_server::{Config, DeviceSession, ServerState};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum Outcome {
    Code(i32),
    /// Block the worker thread, then answer `0`
    Hang(Duration),
    Raise(i32, &'static str),
    /// Driver failure without a device code
    Fail(&'static str),
    Panic(&'static str),
}

#[derive(Default)]
struct Script {
    outcomes: HashMap<&'static str, VecDeque<Outcome>>,
    info: HashMap<i32, String>,
    calls: Vec<String>,
    failing_creates: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedFactory {
    script: Arc<Mutex<Script>>,
    created: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    constructing: Arc<AtomicUsize>,
    max_constructing: Arc<AtomicUsize>,
    create_delay: Arc<Mutex<Duration>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        let factory = Self::default();
        factory.set_info(3, "ECR-0042");
        factory.set_info(2, "17");
        factory
    }

    /// Queue the next outcome of `op`
    pub fn script(&self, op: &'static str, outcome: Outcome) {
        self.script
            .lock()
            .outcomes
            .entry(op)
            .or_default()
            .push_back(outcome);
    }

    pub fn set_info(&self, info_type: i32, text: &str) {
        self.script.lock().info.insert(info_type, text.to_string());
    }

    /// The next `count` constructions fail
    pub fn fail_creates(&self, count: usize) {
        self.script.lock().failing_creates = count;
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().calls.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.script.lock().calls.iter().filter(|c| *c == op).count()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_constructions(&self) -> usize {
        self.max_constructing.load(Ordering::SeqCst)
    }

    pub fn arc(&self) -> Arc<dyn DeviceFactory> {
        Arc::new(self.clone())
    }
}

impl DeviceFactory for ScriptedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create(&self) -> Result<Arc<dyn FiscalDevice>, DeviceInitError> {
        let now = self.constructing.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_constructing.fetch_max(now, Ordering::SeqCst);
        let delay = *self.create_delay.lock();
        std::thread::sleep(delay);

        let failing = {
            let mut script = self.script.lock();
            let failing = script.failing_creates > 0;
            script.failing_creates = script.failing_creates.saturating_sub(1);
            failing
        };
        self.constructing.fetch_sub(1, Ordering::SeqCst);

        if failing {
            return Err(DeviceInitError("driver not registered".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedDevice {
            factory: self.clone(),
        }))
    }
}

pub struct ScriptedDevice {
    factory: ScriptedFactory,
}

impl ScriptedDevice {
    fn call(&self, op: &'static str) -> DeviceResult<i32> {
        let outcome = {
            let mut script = self.factory.script.lock();
            script.calls.push(op.to_string());
            script.outcomes.get_mut(op).and_then(VecDeque::pop_front)
        };
        match outcome {
            None => Ok(0),
            Some(Outcome::Code(code)) => Ok(code),
            Some(Outcome::Hang(duration)) => {
                std::thread::sleep(duration);
                Ok(0)
            }
            Some(Outcome::Raise(code, message)) => Err(DeviceError::native(code, message)),
            Some(Outcome::Fail(message)) => Err(DeviceError::Unexpected(message.to_string())),
            Some(Outcome::Panic(message)) => panic!("{message}"),
        }
    }
}

macro_rules! scripted {
    ($($method:ident($($arg:ident: $ty:ty),*) => $op:literal;)*) => {
        $(
            fn $method(&self, $($arg: $ty),*) -> DeviceResult<i32> {
                $(let _ = $arg;)*
                self.call($op)
            }
        )*
    };
}

impl FiscalDevice for ScriptedDevice {
    scripted! {
        reset_fiscal() => "ResetFiscal";
        open_cash_drawer() => "OpenCashDrawer";
        skip_print_receipt() => "SkipPrintReceipt";
        money_in_curr(payment_type: i32, amount: f64) => "MoneyInCurr";
        money_out_curr(payment_type: i32, amount: f64) => "MoneyOutCurr";
        customer_display2(line1: &str, line2: &str) => "CustomerDisplay2";
        customer_display_pro(line: &str) => "CustomerDisplayPro";
        set_customer_contact(contact: &str) => "SetCustomerContact";
        set_footer(lines: [&str; 4], attrib: i32) => "SetFooter";
        print_copy_of_last_receipt() => "PrintCopyOfLastReceipt";
        print_copy_of_receipt(from: i32, to: i32) => "PrintCopyOfReceipt";
        print_x_report() => "PrintXReport";
        print_z_report() => "PrintZReport";
        print_mini_x_report() => "PrintMiniXReport";
        print_sum_periodic_report(date_from: &str, date_to: &str) => "PrintSumPeriodicReport";
        print_periodic_report(date_from: &str, date_to: &str) => "PrintPeriodicReport";
        print_sum_periodic_report_by_number(no_from: i32, no_to: i32) => "PrintSumPeriodicReportByNumber";
        print_periodic_report_by_number(no_from: i32, no_to: i32) => "PrintPeriodicReportByNumber";
        begin_non_fiscal_receipt() => "BeginNonFiscalReceipt";
        print_non_fiscal_line(line: &str, attrib: i32) => "PrintNonFiscalLine";
        end_non_fiscal_receipt() => "EndNonFiscalReceipt";
        print_bar_code(system: i32, height: i32, code: &str) => "PrintBarCode";
        print_tare_item(description: &str, quantity: f64, price: f64) => "PrintTareItem";
        print_tare_item_void(description: &str, quantity: f64, price: f64) => "PrintTareItemVoid";
        print_tare_deposit(description: &str, quantity: f64, unit_price: f64) => "PrintTareDeposit";
        print_tare_deposit_void(description: &str, quantity: f64, unit_price: f64) => "PrintTareDepositVoid";
        print_deposit_receive(description: &str, quantity: f64, price: f64) => "PrintDepositReceive";
        print_deposit_receive_credit(description: &str, quantity: f64, price: f64) => "PrintDepositReceiveCredit";
        print_deposit_receive_void(description: &str, quantity: f64, price: f64) => "PrintDepositReceiveVoid";
        print_deposit_refund(description: &str, quantity: f64, price: f64) => "PrintDepositRefund";
        begin_fiscal_receipt() => "BeginFiscalReceipt";
        print_rec_item(description: &str, quantity: f64, price: f64, vat_id: i32, unit: &str) => "PrintRecItem";
        print_rec_item_ex(description: &str, quantity: f64, price: f64, vat_id: i32, unit: &str, group: &str) => "PrintRecItemEx";
        item_return(description: &str, quantity: f64, price: f64, vat_id: i32, unit: &str, percent: f64, absolute: f64) => "ItemReturn";
        item_return_ex(description: &str, quantity: f64, price: f64, vat_id: i32, unit: &str, group: &str, percent: f64, absolute: f64) => "ItemReturnEx";
        print_comment_line(line: &str, attrib: i32) => "PrintCommentLine";
        discount_addition_for_item(discount_type: i32, amount: f64) => "DiscountAdditionForItem";
        discount_addition_for_receipt(discount_type: i32, amount: f64) => "DiscountAdditionForReceipt";
        refund_receipt_info(ecr: &str, receipt_no: &str, doc_no: &str) => "RefundReceiptInfo";
        transfer_pre_receipt(receipt_no: &str, amount: f64) => "TransferPreReceipt";
        link_pre_receipt(receipt_no: &str, amount: f64) => "LinkPreReceipt";
        end_pre_receipt() => "EndPreReceipt";
        end_fiscal_receipt_curr(payment: &Payment) => "EndFiscalReceiptCurr";
        end_fiscal_receipt_ex(payment: &PaymentEx) => "EndFiscalReceiptEx";
        end_fiscal_cache_receipt() => "EndFiscalCacheReceipt";
        end_rec_payment(payment: &Payment) => "EndRecPayment";
        end_rec_payment_ex(payment: &PaymentEx) => "EndRecPaymentEx";
        goods_return_curr(payment: &Payment) => "GoodsReturnCurr";
        goods_return_ex(payment: &PaymentEx) => "GoodsReturnEx";
        goods_return_cache_receipt() => "GoodsReturnCacheReceipt";
    }

    fn get_fiscal_info(&self, info_type: i32) -> DeviceResult<(i32, String)> {
        let code = self.call("GetFiscalInfo")?;
        let text = self
            .factory
            .script
            .lock()
            .info
            .get(&info_type)
            .cloned()
            .unwrap_or_default();
        Ok((code, text))
    }

    fn release(&self) -> DeviceResult<()> {
        self.factory.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Session with an eagerly built handle
pub async fn open_session(factory: &ScriptedFactory, timeout: Duration) -> Arc<DeviceSession> {
    Arc::new(DeviceSession::open(factory.arc(), timeout).await)
}

pub async fn state(factory: &ScriptedFactory, config: Config) -> ServerState {
    let session = open_session(factory, config.com_timeout()).await;
    ServerState::new(config, session)
}
