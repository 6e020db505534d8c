//! Status-code vocabulary shared by the device and the service layer

/// Operation completed
pub const SUCCESS: i32 = 0;

/// Local failure: timeout, exception, uninitialised handle, bad request
pub const GENERIC_FAILURE: i32 = 999;

/// Discount type meaning "no discount to apply"
pub const NO_DISCOUNT: i32 = 999;

/// Attribute used for comment lines that do not specify one
pub const DEFAULT_LINE_ATTRIB: i32 = 64;

/// `GetFiscalInfo` selector for the current receipt number
pub const INFO_RECEIPT_NO: i32 = 2;

/// `GetFiscalInfo` selector for the cash register number
pub const INFO_CASH_REGISTER_NO: i32 = 3;

/// Marker line that turns a fiscal receipt into a pre-receipt
pub const END_PRE_RECEIPT_MARKER: &str = "EndPreReceipt";

pub fn is_success(code: i32) -> bool {
    code == SUCCESS
}
