//! Receipt engine - one receipt in, an ordered run of device calls out
//!
//! The whole receipt runs under a single [`SessionGuard`], so calls from two
//! receipts never interleave. The first nonzero status aborts the remaining
//! steps; any failed receipt is followed by one best-effort `ResetFiscal`.

use std::sync::Arc;

use fiscal_device::DeviceCommand;

use super::model::{
    CommentLine, FiscalReceipt, Footer, LineEntry, NonFiscalReceipt, ReceiptDescription,
    ReceiptKind, ReturnReceipt, SaleItem,
};
use super::request::{ReceiptRejection, ReceiptRequest};
use crate::core::FiscalReply;
use crate::core::reply::RECEIPT_FAILURE_MESSAGE;
use crate::session::{DeviceSession, SessionGuard};

/// Footer lines are always printed with this attribute
const FOOTER_ATTRIB: i32 = 64;

/// Result of one step: `Err` carries the failing reply and stops the receipt
type Step = Result<i32, FiscalReply>;

#[derive(Debug, Clone)]
pub struct ReceiptEngine {
    session: Arc<DeviceSession>,
}

impl ReceiptEngine {
    pub fn new(session: Arc<DeviceSession>) -> Self {
        Self { session }
    }

    /// Validate a wire request and process it
    ///
    /// Rejected requests never reach the device.
    pub async fn process_request(&self, request: ReceiptRequest) -> FiscalReply {
        let guard = self.session.acquire().await;
        self.process_request_on(&guard, request).await
    }

    /// [`Self::process_request`] on a session the caller already holds
    pub async fn process_request_on(
        &self,
        guard: &SessionGuard<'_>,
        request: ReceiptRequest,
    ) -> FiscalReply {
        match ReceiptDescription::try_from(request) {
            Ok(receipt) => self.process_on(guard, &receipt).await,
            Err(rejection) => reject(rejection),
        }
    }

    pub async fn process(&self, receipt: &ReceiptDescription) -> FiscalReply {
        let guard = self.session.acquire().await;
        self.process_on(&guard, receipt).await
    }

    pub async fn process_on(
        &self,
        guard: &SessionGuard<'_>,
        receipt: &ReceiptDescription,
    ) -> FiscalReply {
        let kind = receipt.kind.name();
        tracing::info!(kind, "Processing receipt");

        let steps = Steps { guard };

        let outcome = match &receipt.kind {
            ReceiptKind::InfoQuery { info_type } => {
                // Device text is the payload; no normalisation, no reset
                let reply = guard.fiscal_info(*info_type).await;
                tracing::info!(info_type, code = reply.code, message = %reply.message, "Fiscal info result");
                return reply;
            }
            ReceiptKind::Fiscal(body) => steps.fiscal(body, receipt).await,
            ReceiptKind::Return(body) => steps.refund(body, receipt).await,
            ReceiptKind::NonFiscal(body) => steps.non_fiscal(body, receipt).await,
            ReceiptKind::Report(report) => steps.run(report.command()).await,
            ReceiptKind::Special(function) => steps.run(function.command()).await,
            ReceiptKind::Reset => steps.run(DeviceCommand::ResetFiscal).await,
        };

        let reply = match outcome {
            Ok(code) => FiscalReply::code(code),
            Err(reply) => reply,
        };

        if !reply.is_success() {
            let reset = guard.execute(DeviceCommand::ResetFiscal).await;
            tracing::warn!(
                kind,
                code = reply.code,
                reset_code = reset.code,
                "Receipt failed; device reset issued"
            );
        } else {
            tracing::info!(kind, "Receipt completed");
        }

        reply.normalized(RECEIPT_FAILURE_MESSAGE)
    }
}

fn reject(rejection: ReceiptRejection) -> FiscalReply {
    tracing::warn!(reason = %rejection, "Receipt rejected");
    FiscalReply::failure(rejection.to_string())
}

/// Which comment command a receipt prints its free text with
#[derive(Clone, Copy)]
enum Lines {
    Fiscal,
    NonFiscal,
}

impl Lines {
    fn command(self, line: &CommentLine) -> DeviceCommand {
        match self {
            Self::Fiscal => DeviceCommand::PrintCommentLine {
                line: line.text.clone(),
                attrib: line.attrib,
            },
            Self::NonFiscal => DeviceCommand::PrintNonFiscalLine {
                line: line.text.clone(),
                attrib: line.attrib,
            },
        }
    }
}

struct Steps<'a, 'g> {
    guard: &'a SessionGuard<'g>,
}

impl Steps<'_, '_> {
    async fn run(&self, command: DeviceCommand) -> Step {
        let reply = self.guard.execute(command).await;
        if reply.is_success() {
            Ok(reply.code)
        } else {
            Err(reply)
        }
    }

    /// Blank lines are skipped
    async fn comments(&self, lines: &[CommentLine], style: Lines) -> Step {
        for line in lines.iter().filter(|l| !l.text.is_empty()) {
            self.run(style.command(line)).await?;
        }
        Ok(0)
    }

    async fn item(&self, item: &SaleItem, command: DeviceCommand) -> Step {
        self.run(command).await?;
        if let Some(discount) = item.discount {
            self.run(DeviceCommand::DiscountAdditionForItem {
                discount_type: discount.kind,
                amount: discount.amount,
            })
            .await?;
        }
        self.comments(&item.comments, Lines::Fiscal).await
    }

    async fn entries(
        &self,
        entries: &[LineEntry],
        command: fn(&LineEntry) -> DeviceCommand,
        style: Lines,
    ) -> Step {
        for entry in entries {
            self.run(command(entry)).await?;
            self.comments(&entry.comments, style).await?;
        }
        Ok(0)
    }

    async fn receipt_discount(&self, discount: Option<super::model::Discount>) -> Step {
        match discount {
            Some(discount) => {
                self.run(DeviceCommand::DiscountAdditionForReceipt {
                    discount_type: discount.kind,
                    amount: discount.amount,
                })
                .await
            }
            None => Ok(0),
        }
    }

    async fn footer(&self, footer: Option<&Footer>) -> Step {
        match footer {
            Some(footer) => {
                self.run(DeviceCommand::SetFooter {
                    lines: footer.lines.clone(),
                    attrib: FOOTER_ATTRIB,
                })
                .await
            }
            None => Ok(0),
        }
    }

    async fn fiscal(&self, body: &FiscalReceipt, receipt: &ReceiptDescription) -> Step {
        self.run(DeviceCommand::BeginFiscalReceipt).await?;
        self.comments(&receipt.top_comments, Lines::Fiscal).await?;

        for item in &body.items {
            self.item(item, rec_item(item)).await?;
        }
        self.entries(&body.deposits, deposit_receive, Lines::Fiscal)
            .await?;
        self.entries(&body.tare_deposits, tare_deposit, Lines::Fiscal)
            .await?;
        self.entries(&body.tare_deposit_voids, tare_deposit_void, Lines::Fiscal)
            .await?;
        for link in &body.pre_receipt_links {
            self.run(DeviceCommand::LinkPreReceipt {
                receipt_no: link.receipt_no.clone(),
                amount: link.amount,
            })
            .await?;
        }

        self.receipt_discount(body.discount).await?;
        self.comments(&receipt.bottom_comments, Lines::Fiscal).await?;
        self.footer(receipt.footer.as_ref()).await?;

        tracing::debug!(terminator = ?body.terminator, "Closing fiscal receipt");
        self.run(body.terminator.command()).await
    }

    async fn refund(&self, body: &ReturnReceipt, receipt: &ReceiptDescription) -> Step {
        self.run(DeviceCommand::BeginFiscalReceipt).await?;
        self.comments(&receipt.top_comments, Lines::Fiscal).await?;

        for item in &body.items {
            self.item(item, rec_item_ex(item)).await?;
        }

        self.receipt_discount(body.discount).await?;
        self.comments(&receipt.bottom_comments, Lines::Fiscal).await?;
        for info in [&body.refund_info, &body.return_info].into_iter().flatten() {
            self.run(DeviceCommand::RefundReceiptInfo {
                ecr: info.ecr.clone(),
                receipt_no: info.receipt_no.clone(),
                doc_no: info.doc_no.clone(),
            })
            .await?;
        }
        self.footer(receipt.footer.as_ref()).await?;

        tracing::debug!(terminator = ?body.terminator, "Closing return receipt");
        self.run(body.terminator.command()).await
    }

    async fn non_fiscal(&self, body: &NonFiscalReceipt, receipt: &ReceiptDescription) -> Step {
        self.run(DeviceCommand::BeginNonFiscalReceipt).await?;
        self.comments(&receipt.top_comments, Lines::NonFiscal)
            .await?;

        self.entries(&body.tares, tare_item, Lines::NonFiscal).await?;
        self.entries(&body.deposits, deposit_receive, Lines::NonFiscal)
            .await?;
        self.entries(&body.tare_deposits, tare_deposit, Lines::NonFiscal)
            .await?;
        self.entries(&body.tare_deposit_voids, tare_deposit_void, Lines::NonFiscal)
            .await?;
        self.entries(&body.deposit_credits, deposit_receive_credit, Lines::NonFiscal)
            .await?;
        self.entries(&body.deposit_refunds, deposit_refund, Lines::NonFiscal)
            .await?;

        self.comments(&receipt.bottom_comments, Lines::NonFiscal)
            .await?;
        self.footer(receipt.footer.as_ref()).await?;
        self.run(DeviceCommand::EndNonFiscalReceipt).await
    }
}

// ========== Line -> command ==========

fn rec_item(item: &SaleItem) -> DeviceCommand {
    DeviceCommand::PrintRecItem {
        description: item.description.clone(),
        quantity: item.quantity,
        price: item.price,
        vat_id: item.vat_id,
        unit: item.unit.clone(),
    }
}

fn rec_item_ex(item: &SaleItem) -> DeviceCommand {
    DeviceCommand::PrintRecItemEx {
        description: item.description.clone(),
        quantity: item.quantity,
        price: item.price,
        vat_id: item.vat_id,
        unit: item.unit.clone(),
        group: item.group.clone(),
    }
}

fn deposit_receive(entry: &LineEntry) -> DeviceCommand {
    DeviceCommand::PrintDepositReceive {
        description: entry.description.clone(),
        quantity: entry.quantity,
        price: entry.price,
    }
}

fn deposit_receive_credit(entry: &LineEntry) -> DeviceCommand {
    DeviceCommand::PrintDepositReceiveCredit {
        description: entry.description.clone(),
        quantity: entry.quantity,
        price: entry.price,
    }
}

fn deposit_refund(entry: &LineEntry) -> DeviceCommand {
    DeviceCommand::PrintDepositRefund {
        description: entry.description.clone(),
        quantity: entry.quantity,
        price: entry.price,
    }
}

fn tare_item(entry: &LineEntry) -> DeviceCommand {
    DeviceCommand::PrintTareItem {
        description: entry.description.clone(),
        quantity: entry.quantity,
        price: entry.price,
    }
}

fn tare_deposit(entry: &LineEntry) -> DeviceCommand {
    DeviceCommand::PrintTareDeposit {
        description: entry.description.clone(),
        quantity: entry.quantity,
        unit_price: entry.price,
    }
}

fn tare_deposit_void(entry: &LineEntry) -> DeviceCommand {
    DeviceCommand::PrintTareDepositVoid {
        description: entry.description.clone(),
        quantity: entry.quantity,
        unit_price: entry.price,
    }
}
