use std::collections::{BTreeSet, VecDeque};

use chrono::NaiveDate;

use super::DayKey;

/// One row of the payments export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentTransaction {
    /// Normalized document number
    pub document: String,
    pub paid_on: Option<NaiveDate>,
    pub amount: i64,
    /// Blank when the export has no invoice for the payment
    pub invoice: String,
    pub method: String,
    pub biller: String,
    pub patient: Option<String>,
    pub voided: bool,
}

impl PaymentTransaction {
    pub fn key(&self) -> Option<DayKey> {
        DayKey::new(&self.document, self.paid_on?)
    }
}

/// Payments of one patient on one calendar day, in the order of the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPaymentGroup {
    pub key: DayKey,
    pub payments: VecDeque<PaymentTransaction>,
    pub billers: BTreeSet<String>,
}

impl DailyPaymentGroup {
    pub fn new(key: DayKey) -> Self {
        DailyPaymentGroup {
            key,
            payments: VecDeque::new(),
            billers: BTreeSet::new(),
        }
    }

    pub fn push(&mut self, payment: PaymentTransaction) {
        let biller = payment.biller.trim();
        if !biller.is_empty() {
            self.billers.insert(biller.to_string());
        }
        self.payments.push_back(payment);
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// First payment not yet assigned to a row
    pub fn pop_next(&mut self) -> Option<PaymentTransaction> {
        self.payments.pop_front()
    }

    /// Every biller seen for the day, joined for the advisor column
    pub fn billers_label(&self) -> Option<String> {
        if self.billers.is_empty() {
            None
        } else {
            Some(self.billers.iter().cloned().collect::<Vec<_>>().join(" / "))
        }
    }

    pub fn has_blank_invoice(&self) -> bool {
        self.payments.iter().any(|p| p.invoice.trim().is_empty())
    }

    /// An invoice paid with more than one distinct (method, amount) combination
    pub fn has_split_invoice(&self) -> bool {
        let mut seen: Vec<(&str, BTreeSet<(&str, i64)>)> = Vec::new();
        for payment in &self.payments {
            let invoice = payment.invoice.trim();
            if invoice.is_empty() {
                continue;
            }
            let combination = (payment.method.trim(), payment.amount);
            match seen.iter_mut().find(|(existing, _)| *existing == invoice) {
                Some((_, combinations)) => {
                    combinations.insert(combination);
                }
                None => seen.push((invoice, BTreeSet::from([combination]))),
            }
        }
        seen.iter().any(|(_, combinations)| combinations.len() > 1)
    }

    /// Whether surplus payments are separate payment events that deserve their own rows
    pub fn signals_distinct_events(&self) -> bool {
        self.has_blank_invoice() || self.has_split_invoice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(invoice: &str, method: &str, amount: i64, biller: &str) -> PaymentTransaction {
        PaymentTransaction {
            document: "52345678".to_string(),
            paid_on: NaiveDate::from_ymd_opt(2026, 2, 3),
            amount,
            invoice: invoice.to_string(),
            method: method.to_string(),
            biller: biller.to_string(),
            ..PaymentTransaction::default()
        }
    }

    fn group(payments: Vec<PaymentTransaction>) -> DailyPaymentGroup {
        let key = payments[0].key().unwrap();
        let mut group = DailyPaymentGroup::new(key);
        for p in payments {
            group.push(p);
        }
        group
    }

    #[test]
    fn test_pop_next_keeps_arrival_order() {
        let mut group = group(vec![
            payment("F-1", "Efectivo", 10000, ""),
            payment("F-2", "Tarjeta", 20000, ""),
        ]);
        assert_eq!(group.pop_next().unwrap().invoice, "F-1");
        assert_eq!(group.pop_next().unwrap().invoice, "F-2");
        assert!(group.pop_next().is_none());
    }

    #[test]
    fn test_billers_label() {
        let group = group(vec![
            payment("F-1", "Efectivo", 10000, "Luisa"),
            payment("F-2", "Efectivo", 10000, " Carlos "),
            payment("F-3", "Efectivo", 10000, "Luisa"),
        ]);
        assert_eq!(group.billers_label().as_deref(), Some("Carlos / Luisa"));
    }

    #[test]
    fn test_split_invoice_detection() {
        let split = group(vec![
            payment("F-1", "Efectivo", 10000, ""),
            payment("F-1", "Tarjeta", 30000, ""),
        ]);
        assert!(split.has_split_invoice());
        assert!(split.signals_distinct_events());

        let repeated = group(vec![
            payment("F-1", "Efectivo", 10000, ""),
            payment("F-1", "Efectivo", 10000, ""),
        ]);
        assert!(!repeated.has_split_invoice());
        assert!(!repeated.signals_distinct_events());
    }

    #[test]
    fn test_blank_invoice_signals_distinct_events() {
        let group = group(vec![
            payment("F-1", "Efectivo", 10000, ""),
            payment(" ", "Efectivo", 5000, ""),
        ]);
        assert!(group.has_blank_invoice());
        assert!(group.signals_distinct_events());
    }
}
