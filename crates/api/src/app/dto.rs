use serde::Deserialize;

use splitledger_expenses::{RecordedExpense, User, UserExpenseView};
use splitledger_infra::UserBalanceView;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// `POST /expenses` takes `splitledger_expenses::ExpenseRequest` as-is.
pub use splitledger_expenses::ExpenseRequest as CreateExpenseRequest;

// -------------------------
// Response mapping
// -------------------------

pub fn user_to_json(user: User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    })
}

pub fn recorded_expense_to_json(recorded: RecordedExpense) -> serde_json::Value {
    let expense = recorded.expense;
    serde_json::json!({
        "id": expense.id,
        "description": expense.description,
        "tag": expense.tag,
        "total_amount": expense.total_amount,
        "created_by": expense.created_by,
        "created_at": expense.created_at.to_rfc3339(),
        "splits": recorded.splits.into_iter().map(|s| serde_json::json!({
            "id": s.id,
            "user_id": s.user_id,
            "amount_paid": s.amount_paid,
            "amount_owed": s.amount_owed,
        })).collect::<Vec<_>>(),
    })
}

pub fn expense_view_to_json(view: UserExpenseView) -> serde_json::Value {
    serde_json::json!({
        "expense_id": view.expense_id,
        "date": view.date.to_rfc3339(),
        "tag": view.tag,
        "description": view.description,
        "total_amount": view.total_amount,
        "share": view.share,
    })
}

pub fn balance_view_to_json(view: UserBalanceView) -> serde_json::Value {
    serde_json::json!({
        "counterparty": user_to_json(view.counterparty),
        "amount": view.amount,
        "last_updated": view.last_updated.to_rfc3339(),
    })
}
