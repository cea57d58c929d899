use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};

use super::gas_meter::MockGasMeter;
use crate::backend::{Order, Storage, StorageIterator};

const GAS_COST_RANGE: u64 = 11;

type Record = (Vec<u8>, Vec<u8>);

/// An in-memory store. When created with a gas meter, every operation charges it:
/// reads and removals by key length, writes and iteration steps by key plus value length.
#[derive(Default, Debug)]
pub struct MockStorage {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    gas_meter: Option<MockGasMeter>,
}

impl MockStorage {
    pub fn new() -> Self {
        MockStorage::default()
    }

    pub fn with_gas_meter(gas_meter: MockGasMeter) -> Self {
        MockStorage {
            data: BTreeMap::new(),
            gas_meter: Some(gas_meter),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn charge(&self, amount: usize, descriptor: &str) {
        if let Some(gas_meter) = &self.gas_meter {
            gas_meter.consume(amount as u64, descriptor);
        }
    }
}

impl Storage for MockStorage {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.charge(key.len(), "ReadFlat");
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.charge(key.len() + value.len(), "WriteFlat");
        self.data.insert(key.to_vec(), value.to_vec());
    }

    fn remove(&mut self, key: &[u8]) {
        self.charge(key.len(), "Delete");
        self.data.remove(key);
    }

    fn iterator(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn StorageIterator> {
        self.charge(GAS_COST_RANGE as usize, "IterRange");
        let bounds = range_bounds(start, end);

        let records: Vec<Record> = match (bounds.start_bound(), bounds.end_bound()) {
            // BTreeMap.range panics if range is start > end.
            // However, this cases represent just empty range and we treat it as such.
            (Bound::Included(start), Bound::Excluded(end)) if start >= end => Vec::new(),
            _ => match order {
                Order::Ascending => self.data.range(bounds).map(clone_item).collect(),
                Order::Descending => self.data.range(bounds).rev().map(clone_item).collect(),
            },
        };

        Box::new(MockIterator {
            records,
            position: 0,
            gas_meter: self.gas_meter.clone(),
        })
    }
}

/// A snapshot of a range, taken when the iterator is created.
/// Later writes to the store are not visible.
struct MockIterator {
    records: Vec<Record>,
    position: usize,
    gas_meter: Option<MockGasMeter>,
}

impl StorageIterator for MockIterator {
    fn valid(&self) -> bool {
        self.position < self.records.len()
    }

    fn next(&mut self) {
        let (key, value) = &self.records[self.position];
        if let Some(gas_meter) = &self.gas_meter {
            gas_meter.consume((key.len() + value.len()) as u64, "IterNext");
        }
        self.position += 1;
    }

    fn key(&self) -> &[u8] {
        &self.records[self.position].0
    }

    fn value(&self) -> &[u8] {
        &self.records[self.position].1
    }
}

fn range_bounds(start: Option<&[u8]>, end: Option<&[u8]>) -> impl RangeBounds<Vec<u8>> {
    (
        start.map_or(Bound::Unbounded, |x| Bound::Included(x.to_vec())),
        end.map_or(Bound::Unbounded, |x| Bound::Excluded(x.to_vec())),
    )
}

/// The BTreeMap specific key-value pair reference type, as returned by BTreeMap<Vec<u8>, Vec<u8>>::range.
/// This is internal as it can change any time if the map implementation is swapped out.
type BTreeMapRecordRef<'a> = (&'a Vec<u8>, &'a Vec<u8>);

fn clone_item(item_ref: BTreeMapRecordRef) -> Record {
    let (key, value) = item_ref;
    (key.clone(), value.clone())
}
