//! In-memory transactions, categorization rules and saved filters.
//!
//! This is the domain collaborator the UI drives through commands. It knows
//! nothing about keys or scopes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: u32,
    pub date: String,
    pub payee: String,
    pub category: String,
    /// Negative for spending.
    pub amount_cents: i64,
}

/// Assigns `category` to transactions whose payee contains `pattern`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub category: String,
}

/// A named transaction query. `key` is the stable identifier used in
/// command ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub key: String,
    pub query: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FiltersFile {
    #[serde(default)]
    filter: Vec<SavedFilter>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub rules: Vec<Rule>,
    pub filters: Vec<SavedFilter>,
}

impl Ledger {
    /// A small ledger to explore the UI with.
    pub fn demo() -> Self {
        let rows = [
            ("2026-09-01", "Landlord Ltd", "", -120_000),
            ("2026-09-02", "Corner Grocer", "", -4_310),
            ("2026-09-03", "Acme Payroll", "", 310_000),
            ("2026-09-05", "City Power", "", -8_950),
            ("2026-09-07", "Corner Grocer", "", -2_275),
            ("2026-09-09", "Night Bus", "", -350),
            ("2026-09-12", "Bookshop", "", -1_899),
            ("2026-09-15", "Corner Grocer", "", -5_120),
        ];
        let mut ledger = Ledger {
            transactions: rows
                .iter()
                .enumerate()
                .map(|(idx, (date, payee, category, amount))| Transaction {
                    id: idx as u32 + 1,
                    date: date.to_string(),
                    payee: payee.to_string(),
                    category: category.to_string(),
                    amount_cents: *amount,
                })
                .collect(),
            rules: vec![
                Rule {
                    pattern: "grocer".to_string(),
                    category: "food".to_string(),
                },
                Rule {
                    pattern: "landlord".to_string(),
                    category: "rent".to_string(),
                },
                Rule {
                    pattern: "power".to_string(),
                    category: "utilities".to_string(),
                },
                Rule {
                    pattern: "payroll".to_string(),
                    category: "income".to_string(),
                },
            ],
            filters: vec![
                SavedFilter {
                    key: "groceries".to_string(),
                    query: "cat:food".to_string(),
                },
                SavedFilter {
                    key: "rent".to_string(),
                    query: "cat:rent".to_string(),
                },
            ],
        };
        ledger.apply_rules();
        ledger
    }

    /// Categorize uncategorized transactions. First matching rule wins.
    pub fn apply_rules(&mut self) -> usize {
        let mut changed = 0;
        for txn in self.transactions.iter_mut().filter(|t| t.category.is_empty()) {
            let payee = txn.payee.to_lowercase();
            if let Some(rule) = self.rules.iter().find(|r| payee.contains(&r.pattern)) {
                txn.category = rule.category.clone();
                changed += 1;
            }
        }
        changed
    }

    /// Transactions matching `query`, in ledger order.
    pub fn filtered<'a>(&'a self, query: Option<&'a str>) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.transactions
            .iter()
            .filter(move |txn| query.is_none_or(|q| matches_query(txn, q)))
    }

    pub fn get(&self, id: u32) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn delete(&mut self, id: u32) -> Option<Transaction> {
        let idx = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(idx))
    }

    pub fn balance_cents(&self) -> i64 {
        self.transactions.iter().map(|t| t.amount_cents).sum()
    }

    /// Spending per category, largest first.
    pub fn spending_by_category(&self) -> Vec<(String, i64)> {
        let mut totals: Vec<(String, i64)> = Vec::new();
        for txn in self.transactions.iter().filter(|t| t.amount_cents < 0) {
            let name = if txn.category.is_empty() {
                "uncategorized"
            } else {
                txn.category.as_str()
            };
            match totals.iter_mut().find(|(cat, _)| cat == name) {
                Some((_, total)) => *total += -txn.amount_cents,
                None => totals.push((name.to_string(), -txn.amount_cents)),
            }
        }
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        totals
    }

    /// Add or replace the filter stored under `key`.
    pub fn save_filter(&mut self, key: &str, query: &str) {
        let filter = SavedFilter {
            key: key.to_string(),
            query: query.to_string(),
        };
        match self.filters.iter_mut().find(|f| f.key == key) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
    }
}

/// Whitespace-separated terms, all of which must match. `cat:` and
/// `payee:` restrict a term to one field; bare terms match either.
pub fn matches_query(txn: &Transaction, query: &str) -> bool {
    let payee = txn.payee.to_lowercase();
    let category = txn.category.to_lowercase();
    query.split_whitespace().all(|term| {
        let term = term.to_lowercase();
        if let Some(cat) = term.strip_prefix("cat:") {
            category.contains(cat)
        } else if let Some(name) = term.strip_prefix("payee:") {
            payee.contains(name)
        } else {
            payee.contains(&term) || category.contains(&term)
        }
    })
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn load_filters(path: &Path) -> Result<Option<Vec<SavedFilter>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let file: FiltersFile = toml::from_str(&content)?;
    Ok(Some(file.filter))
}

pub fn save_filters(path: &Path, filters: &[SavedFilter]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(&FiltersFile {
        filter: filters.to_vec(),
    })?;
    fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_rules_categorize_everything_they_know() {
        let ledger = Ledger::demo();
        let grocer = ledger.transactions.iter().find(|t| t.payee == "Corner Grocer").expect("grocer");
        assert_eq!(grocer.category, "food");
        let bus = ledger.transactions.iter().find(|t| t.payee == "Night Bus").expect("bus");
        assert_eq!(bus.category, "");
    }

    #[test]
    fn query_terms_are_anded() {
        let ledger = Ledger::demo();
        assert_eq!(ledger.filtered(Some("cat:food")).count(), 3);
        assert_eq!(ledger.filtered(Some("grocer cat:rent")).count(), 0);
        assert_eq!(ledger.filtered(Some("LANDLORD")).count(), 1);
        assert_eq!(ledger.filtered(None).count(), ledger.transactions.len());
    }

    #[test]
    fn delete_removes_by_id() {
        let mut ledger = Ledger::demo();
        let removed = ledger.delete(2).expect("present");
        assert_eq!(removed.payee, "Corner Grocer");
        assert!(ledger.get(2).is_none());
        assert!(ledger.delete(2).is_none());
    }

    #[test]
    fn spending_groups_by_category() {
        let ledger = Ledger::demo();
        let spending = ledger.spending_by_category();
        assert_eq!(spending[0], ("rent".to_string(), 120_000));
        assert!(spending.iter().all(|(_, total)| *total > 0));
    }

    #[test]
    fn save_filter_replaces_same_key() {
        let mut ledger = Ledger::demo();
        ledger.save_filter("rent", "payee:landlord");
        ledger.save_filter("bus", "payee:bus");
        assert_eq!(ledger.filters.len(), 3);
        assert_eq!(ledger.filters[1].query, "payee:landlord");
    }

    #[test]
    fn formats_cents() {
        assert_eq!(format_cents(-120_000), "-1200.00");
        assert_eq!(format_cents(5), "0.05");
    }

    #[test]
    fn filters_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("tally_filters_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("filters.toml");
        assert_eq!(load_filters(&path).expect("missing is fine"), None);
        let filters = Ledger::demo().filters;
        save_filters(&path, &filters).expect("save");
        assert_eq!(load_filters(&path).expect("load"), Some(filters));
    }
}
