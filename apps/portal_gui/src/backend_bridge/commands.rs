//! Backend commands queued from UI to backend worker.

use client_core::BranchDraft;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    SignIn,
    Resync,
    AddBranch(BranchDraft),
    AddPayment { currency: String },
    AddMaintenance,
    EnrollMember,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SignIn => "sign_in",
            BackendCommand::Resync => "resync",
            BackendCommand::AddBranch(_) => "add_branch",
            BackendCommand::AddPayment { .. } => "add_payment",
            BackendCommand::AddMaintenance => "add_maintenance",
            BackendCommand::EnrollMember => "enroll_member",
        }
    }
}
