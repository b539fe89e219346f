//! Inbound expense requests: validation and email → user resolution.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, Money, Percentage, UserId};

use crate::expense::{NewExpense, SplitMethod};
use crate::split::ParticipantShare;
use crate::user::normalize_email;

/// A split request as submitted by a client, with participants named by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    pub description: String,
    #[serde(default)]
    pub tag: Option<String>,
    pub total_amount: Money,
    pub created_by_email: String,
    pub split_method: String,
    pub participants: Vec<ParticipantRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRequest {
    pub email: String,
    #[serde(default)]
    pub amount_paid: Money,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub amount_owed: Option<Money>,
}

/// A request with every email resolved, ready for the split strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExpense {
    pub expense: NewExpense,
    pub method: SplitMethod,
    pub participants: Vec<ParticipantShare>,
}

impl ExpenseRequest {
    /// Shape checks that need no lookups. Returns the parsed split method.
    pub fn validate(&self) -> DomainResult<SplitMethod> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description is required"));
        }
        if !self.total_amount.is_positive() {
            return Err(DomainError::validation(format!(
                "total amount must be positive, got {}",
                self.total_amount
            )));
        }
        let creator = normalize_email(&self.created_by_email);
        if creator.is_empty() {
            return Err(DomainError::validation("created_by email is required"));
        }
        if self.split_method.trim().is_empty() {
            return Err(DomainError::validation("split method is required"));
        }
        let method: SplitMethod = self.split_method.parse()?;

        if self.participants.is_empty() {
            return Err(DomainError::validation("at least one participant is required"));
        }

        let mut seen = HashSet::with_capacity(self.participants.len());
        for participant in &self.participants {
            let email = normalize_email(&participant.email);
            if email.is_empty() {
                return Err(DomainError::validation("participant email is required"));
            }
            if !seen.insert(email.clone()) {
                return Err(DomainError::validation(format!(
                    "duplicate participant email: {email}"
                )));
            }
            if participant.amount_paid.is_negative() {
                return Err(DomainError::validation(format!(
                    "amount paid by {email} must not be negative"
                )));
            }
            match method {
                SplitMethod::Equal => {}
                SplitMethod::Percentage => match participant.percentage {
                    None => {
                        return Err(DomainError::validation(format!(
                            "percentage split requires a percentage for {email}"
                        )));
                    }
                    Some(pct) if !pct.is_finite() || pct < 0.0 => {
                        return Err(DomainError::validation(format!(
                            "percentage for {email} must not be negative"
                        )));
                    }
                    Some(pct) => {
                        Percentage::from_f64(pct)?;
                    }
                },
                SplitMethod::Manual => match participant.amount_owed {
                    None => {
                        return Err(DomainError::validation(format!(
                            "manual split requires an amount owed for {email}"
                        )));
                    }
                    Some(owed) if owed.is_negative() => {
                        return Err(DomainError::validation(format!(
                            "amount owed by {email} must not be negative"
                        )));
                    }
                    Some(_) => {}
                },
            }
        }

        if !seen.contains(&creator) {
            return Err(DomainError::validation(format!(
                "creator {creator} must be one of the participants"
            )));
        }

        Ok(method)
    }

    /// Every email the request mentions, normalized, creator included.
    pub fn emails(&self) -> BTreeSet<String> {
        std::iter::once(&self.created_by_email)
            .chain(self.participants.iter().map(|p| &p.email))
            .map(|email| normalize_email(email))
            .collect()
    }

    /// Validate, then swap emails for user ids using `directory` (keyed by normalized email).
    pub fn resolve(&self, directory: &HashMap<String, UserId>) -> DomainResult<ResolvedExpense> {
        let method = self.validate()?;

        let creator_email = normalize_email(&self.created_by_email);
        let created_by = *directory.get(&creator_email).ok_or_else(|| {
            DomainError::validation(format!("created_by user not found: {creator_email}"))
        })?;

        let participants = self
            .participants
            .iter()
            .map(|p| {
                let email = normalize_email(&p.email);
                let user_id = *directory.get(&email).ok_or_else(|| {
                    DomainError::validation(format!("participant not found: {email}"))
                })?;

                let mut share = ParticipantShare::paying(user_id, p.amount_paid);
                if method == SplitMethod::Percentage {
                    if let Some(pct) = p.percentage {
                        share = share.with_percentage(Percentage::from_f64(pct)?);
                    }
                }
                if method == SplitMethod::Manual {
                    if let Some(owed) = p.amount_owed {
                        share = share.with_amount_owed(owed);
                    }
                }
                Ok(share)
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let expense = NewExpense::new(&self.description, self.tag.clone(), self.total_amount, created_by)?;

        Ok(ResolvedExpense {
            expense,
            method,
            participants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(email: &str, paid: f64) -> ParticipantRequest {
        ParticipantRequest {
            email: email.to_string(),
            amount_paid: Money::from_f64(paid).unwrap(),
            percentage: None,
            amount_owed: None,
        }
    }

    fn dinner(method: &str, participants: Vec<ParticipantRequest>) -> ExpenseRequest {
        ExpenseRequest {
            description: "Dinner".to_string(),
            tag: Some("food".to_string()),
            total_amount: Money::from_cents(9000),
            created_by_email: "alice@example.com".to_string(),
            split_method: method.to_string(),
            participants,
        }
    }

    fn directory() -> HashMap<String, UserId> {
        HashMap::from([
            ("alice@example.com".to_string(), UserId::new(1)),
            ("bob@example.com".to_string(), UserId::new(2)),
        ])
    }

    fn validation_message(err: DomainError) -> String {
        match err {
            DomainError::Validation(msg) => msg,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn resolves_emails_case_insensitively() {
        let request = dinner(
            "equal",
            vec![participant(" Alice@Example.com", 90.0), participant("BOB@example.com", 0.0)],
        );

        let resolved = request.resolve(&directory()).unwrap();
        assert_eq!(resolved.method, SplitMethod::Equal);
        assert_eq!(resolved.expense.created_by, UserId::new(1));
        assert_eq!(resolved.expense.tag.as_deref(), Some("food"));
        assert_eq!(
            resolved.participants.iter().map(|p| p.user_id.get()).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn emails_include_the_creator_once() {
        let request = dinner(
            "equal",
            vec![participant("alice@example.com", 90.0), participant("bob@example.com", 0.0)],
        );
        let emails = request.emails().into_iter().collect::<Vec<_>>();
        assert_eq!(emails, vec!["alice@example.com", "bob@example.com"]);
    }

    #[test]
    fn unknown_split_method_is_rejected() {
        let request = dinner("shares", vec![participant("alice@example.com", 90.0)]);
        assert_eq!(validation_message(request.validate().unwrap_err()), "invalid split method: shares");
    }

    #[test]
    fn creator_must_participate() {
        let request = dinner("equal", vec![participant("bob@example.com", 90.0)]);
        let msg = validation_message(request.validate().unwrap_err());
        assert!(msg.contains("must be one of the participants"), "{msg}");
    }

    #[test]
    fn duplicate_participants_are_rejected_after_normalization() {
        let request = dinner(
            "equal",
            vec![participant("alice@example.com", 90.0), participant("ALICE@example.com", 0.0)],
        );
        let msg = validation_message(request.validate().unwrap_err());
        assert!(msg.starts_with("duplicate participant email"), "{msg}");
    }

    #[test]
    fn percentage_method_needs_percentages() {
        let request = dinner(
            "percentage",
            vec![participant("alice@example.com", 90.0), participant("bob@example.com", 0.0)],
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn percentages_finer_than_hundredths_are_rejected_not_rounded() {
        let mut alice = participant("alice@example.com", 100.0);
        alice.percentage = Some(50.004);
        let mut bob = participant("bob@example.com", 0.0);
        bob.percentage = Some(50.0);
        let mut request = dinner("percentage", vec![alice, bob]);
        request.total_amount = Money::from_cents(10_000);

        let msg = validation_message(request.validate().unwrap_err());
        assert_eq!(msg, "percentage 50.004 has more than two decimal places");
        assert!(request.resolve(&directory()).is_err());

        request.participants[0].percentage = Some(50.0);
        assert_eq!(request.validate().unwrap(), SplitMethod::Percentage);
    }

    #[test]
    fn manual_method_rejects_negative_owed() {
        let mut alice = participant("alice@example.com", 90.0);
        alice.amount_owed = Some(Money::from_cents(-100));
        let request = dinner("manual", vec![alice]);
        assert!(request.validate().is_err());
    }

    #[test]
    fn unknown_emails_name_the_missing_user() {
        let request = dinner(
            "equal",
            vec![participant("alice@example.com", 90.0), participant("carol@example.com", 0.0)],
        );
        let msg = validation_message(request.resolve(&directory()).unwrap_err());
        assert_eq!(msg, "participant not found: carol@example.com");

        let mut request = dinner("equal", vec![participant("dave@example.com", 90.0)]);
        request.created_by_email = "dave@example.com".to_string();
        let msg = validation_message(request.resolve(&directory()).unwrap_err());
        assert_eq!(msg, "created_by user not found: dave@example.com");
    }

    #[test]
    fn deserializes_with_defaults() {
        let request: ExpenseRequest = serde_json::from_str(
            r#"{
                "description": "Taxi",
                "total_amount": 30.0,
                "created_by_email": "alice@example.com",
                "split_method": "manual",
                "participants": [
                    {"email": "alice@example.com", "amount_paid": 30.0, "amount_owed": 10.0},
                    {"email": "bob@example.com", "amount_owed": 20.0}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(request.tag, None);
        assert_eq!(request.participants[1].amount_paid, Money::ZERO);
        assert_eq!(request.validate().unwrap(), SplitMethod::Manual);
    }
}
