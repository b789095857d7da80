use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Datelike;

use billjobs_core::{BillId, UserId};

use crate::{Bill, BillingError, NewBill, bill_number};

/// Bill repository.
pub trait BillStore: Send + Sync {
    fn get(&self, id: BillId) -> Option<Bill>;
    /// All bills ordered by id.
    fn list(&self) -> Vec<Bill>;
    fn list_for_owner(&self, owner: UserId) -> Vec<Bill>;
    /// Validate, number and persist a bill.
    fn insert(&self, bill: NewBill) -> Result<Bill, BillingError>;
}

#[derive(Debug, Default)]
struct BillTable {
    next_id: u64,
    by_id: BTreeMap<BillId, Bill>,
    /// (year, month) → bills numbered so far in that month.
    issued_per_month: BTreeMap<(i32, u32), u32>,
}

/// In-memory bill store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBillStore {
    inner: RwLock<BillTable>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BillStore for InMemoryBillStore {
    fn get(&self, id: BillId) -> Option<Bill> {
        let table = self.inner.read().ok()?;
        table.by_id.get(&id).cloned()
    }

    fn list(&self) -> Vec<Bill> {
        match self.inner.read() {
            Ok(table) => table.by_id.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn list_for_owner(&self, owner: UserId) -> Vec<Bill> {
        match self.inner.read() {
            Ok(table) => table
                .by_id
                .values()
                .filter(|b| b.owner == owner)
                .cloned()
                .collect(),
            Err(_) => vec![],
        }
    }

    fn insert(&self, bill: NewBill) -> Result<Bill, BillingError> {
        bill.validate()?;

        let mut table = self.inner.write().map_err(|_| BillingError::Poisoned)?;
        let month = (bill.billing_date.year(), bill.billing_date.month());
        let seq = {
            let count = table.issued_per_month.entry(month).or_insert(0);
            *count += 1;
            *count
        };

        table.next_id += 1;
        let id = BillId::new(table.next_id);
        let number = bill_number(bill.billing_date, seq);
        let bill = bill.into_bill(id, number);
        table.by_id.insert(id, bill.clone());

        tracing::info!(bill_id = %bill.id, number = %bill.number, owner = %bill.owner, "bill stored");
        Ok(bill)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_bill(owner: u64, y: i32, m: u32) -> NewBill {
        let mut bill = NewBill::new(UserId::new(owner), NaiveDate::from_ymd_opt(y, m, 10).unwrap())
            .line("Coworking", 1, 15_000);
        bill.billing_address = "Somewhere".into();
        bill
    }

    #[test]
    fn numbering_restarts_each_month() {
        let store = InMemoryBillStore::new();
        let a = store.insert(new_bill(1, 2017, 9)).unwrap();
        let b = store.insert(new_bill(2, 2017, 9)).unwrap();
        let c = store.insert(new_bill(1, 2017, 10)).unwrap();

        assert_eq!(a.number, "F201709001");
        assert_eq!(b.number, "F201709002");
        assert_eq!(c.number, "F201710001");
        assert_eq!(c.id, BillId::new(3));
    }

    #[test]
    fn owner_listing_filters() {
        let store = InMemoryBillStore::new();
        store.insert(new_bill(1, 2017, 9)).unwrap();
        store.insert(new_bill(2, 2017, 9)).unwrap();
        store.insert(new_bill(1, 2017, 9)).unwrap();

        assert_eq!(store.list().len(), 3);
        assert_eq!(store.list_for_owner(UserId::new(1)).len(), 2);
        assert!(store.list_for_owner(UserId::new(9)).is_empty());
    }

    #[test]
    fn invalid_bills_are_not_numbered() {
        let store = InMemoryBillStore::new();
        let mut bad = new_bill(1, 2017, 9);
        bad.billing_address.clear();

        assert!(matches!(store.insert(bad), Err(BillingError::Domain(_))));
        let ok = store.insert(new_bill(1, 2017, 9)).unwrap();
        assert_eq!(ok.number, "F201709001");
        assert_eq!(ok.id, BillId::new(1));
    }
}
