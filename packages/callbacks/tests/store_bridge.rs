use std::collections::BTreeMap;

use cosmwasm_callbacks::testing::{MockGasMeter, MockStorage};
use cosmwasm_callbacks::{
    build_db, iterator_count, BackendError, CallScope, Config, DbState, FfiIterator, GasInfo,
    GasMeter, Order, StatusCode, StorageCaller, U8SliceView, UnmanagedVector,
};
use proptest::{prop_assert_eq, property_test};

const GAS_LIMIT: u64 = 10_000_000;

#[test]
fn set_get_delete_works() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(
        MockStorage::with_gas_meter(gas_meter.clone()),
        scope.call_id(),
    );
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));

    // key + value length
    let (result, gas_info) = store.set(b"foo", b"bar");
    result.unwrap();
    assert_eq!(gas_info, GasInfo::with_externally_used(6));

    // key length
    let (result, gas_info) = store.get(b"foo");
    assert_eq!(result.unwrap(), Some(b"bar".to_vec()));
    assert_eq!(gas_info, GasInfo::with_externally_used(3));

    let (result, gas_info) = store.remove(b"foo");
    result.unwrap();
    assert_eq!(gas_info, GasInfo::with_externally_used(3));

    let (result, _) = store.get(b"foo");
    assert_eq!(result.unwrap(), None);
}

#[test]
fn absent_and_empty_values_are_distinct() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));

    store.set(b"empty", b"").0.unwrap();
    assert_eq!(store.get(b"empty").0.unwrap(), Some(vec![]));
    assert_eq!(store.get(b"missing").0.unwrap(), None);
}

#[test]
fn get_without_gas_meter_charges_report_zero() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let store = StorageCaller::new(build_db(&mut state, &gas_meter));

    let (_, gas_info) = store.get(b"foo");
    assert_eq!(gas_info, GasInfo::with_externally_used(0));
}

#[test]
fn scan_ascending_and_descending() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(
        MockStorage::with_gas_meter(gas_meter.clone()),
        scope.call_id(),
    );
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));
    store.set(b"a", b"1").0.unwrap();
    store.set(b"b", b"22").0.unwrap();
    store.set(b"c", b"333").0.unwrap();

    let (result, gas_info) = store.scan(
        Some(b"a".as_slice()),
        Some(b"c".as_slice()),
        Order::Ascending,
    );
    let mut iter = result.unwrap();
    // range cost of the mock store
    assert_eq!(gas_info, GasInfo::with_externally_used(11));

    let (item, gas_info) = iter.next();
    assert_eq!(item.unwrap(), Some((b"a".to_vec(), b"1".to_vec())));
    assert_eq!(gas_info, GasInfo::with_externally_used(2));
    let (item, gas_info) = iter.next();
    assert_eq!(item.unwrap(), Some((b"b".to_vec(), b"22".to_vec())));
    assert_eq!(gas_info, GasInfo::with_externally_used(3));
    let (item, gas_info) = iter.next();
    assert_eq!(item.unwrap(), None);
    assert_eq!(gas_info, GasInfo::with_externally_used(0));

    let mut iter = store.scan(None, None, Order::Descending).0.unwrap();
    let mut keys = Vec::new();
    while let Some((key, _)) = iter.next().0.unwrap() {
        keys.push(key);
    }
    assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    assert_eq!(iterator_count(scope.call_id()), Some(2));
}

#[test]
fn exhausted_iterator_stays_exhausted() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));
    store.set(b"only", b"one").0.unwrap();

    let mut iter = store.scan(None, None, Order::Ascending).0.unwrap();
    assert!(iter.next().0.unwrap().is_some());
    for _ in 0..5 {
        let (item, gas_info) = iter.next();
        assert_eq!(item.unwrap(), None);
        assert_eq!(gas_info.externally_used, 0);
    }
}

#[test]
fn iterators_are_independent() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));
    store.set(b"a", b"1").0.unwrap();
    store.set(b"b", b"2").0.unwrap();

    let mut first = store.scan(None, None, Order::Ascending).0.unwrap();
    let mut second = store.scan(None, None, Order::Ascending).0.unwrap();
    assert_eq!(first.next().0.unwrap().unwrap().0, b"a");
    assert_eq!(first.next().0.unwrap().unwrap().0, b"b");
    assert_eq!(second.next().0.unwrap().unwrap().0, b"a");
}

#[test]
fn scan_fails_when_iterator_limit_is_reached() {
    let scope = CallScope::open(&Config::new().with_iterator_limit(2));
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let store = StorageCaller::new(build_db(&mut state, &gas_meter));

    store.scan(None, None, Order::Ascending).0.unwrap();
    store.scan(None, None, Order::Ascending).0.unwrap();
    let (result, _) = store.scan(None, None, Order::Ascending);
    match result {
        Err(BackendError::UserErr { msg }) => assert_eq!(msg, "Reached iterator limit (2)"),
        Err(err) => panic!("Unexpected error: {err:?}"),
        Ok(_) => panic!("Expected scan to fail"),
    }
    assert_eq!(iterator_count(scope.call_id()), Some(2));
}

#[test]
fn next_fails_after_call_ended() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));
    store.set(b"a", b"1").0.unwrap();

    let mut iter = store.scan(None, None, Order::Ascending).0.unwrap();
    drop(scope);
    let (result, _) = iter.next();
    assert_eq!(result.unwrap_err(), BackendError::bad_argument());
}

#[test]
fn scan_output_is_untouched_on_failure() {
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    // no frame was opened for this call ID
    let mut state = DbState::new(MockStorage::with_gas_meter(gas_meter.clone()), u64::MAX);
    let db = build_db(&mut state, &gas_meter);

    let mut used_gas = 4242u64;
    let mut out = FfiIterator::stub();
    let mut error_msg = UnmanagedVector::default();
    let code = (db.vtable.scan_db)(
        db.state,
        db.gas_meter,
        &mut used_gas,
        U8SliceView::none(),
        U8SliceView::none(),
        Order::Ascending.into(),
        &mut out,
        &mut error_msg,
    );
    assert_eq!(StatusCode::from(code), StatusCode::BadArgument);
    assert_eq!(out.state.call_id, 0);
    assert_eq!(error_msg.consume(), None);
    // the store was never asked for an iterator
    assert_eq!(used_gas, 4242);
    assert_eq!(gas_meter.gas_consumed(), 0);
}

#[test]
fn scan_after_call_ended_does_not_touch_store() {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(
        MockStorage::with_gas_meter(gas_meter.clone()),
        scope.call_id(),
    );
    let store = StorageCaller::new(build_db(&mut state, &gas_meter));
    drop(scope);

    let (result, gas_info) = store.scan(None, None, Order::Ascending);
    match result {
        Err(err) => assert_eq!(err, BackendError::bad_argument()),
        Ok(_) => panic!("Expected scan to fail"),
    }
    assert_eq!(gas_info, GasInfo::with_externally_used(0));
    assert_eq!(gas_meter.gas_consumed(), 0);
}

#[property_test]
fn set_then_get_returns_value(key: Vec<u8>, value: Vec<u8>) {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(
        MockStorage::with_gas_meter(gas_meter.clone()),
        scope.call_id(),
    );
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));

    let (result, gas_info) = store.set(&key, &value);
    result.unwrap();
    prop_assert_eq!(
        gas_info.externally_used,
        (key.len() + value.len()) as u64
    );
    let (result, gas_info) = store.get(&key);
    prop_assert_eq!(result.unwrap(), Some(value));
    prop_assert_eq!(gas_info.externally_used, key.len() as u64);
}

#[property_test]
fn scan_follows_key_order(entries: BTreeMap<Vec<u8>, Vec<u8>>) {
    let scope = CallScope::open(&Config::default());
    let gas_meter = MockGasMeter::new(GAS_LIMIT);
    let mut state = DbState::new(MockStorage::new(), scope.call_id());
    let mut store = StorageCaller::new(build_db(&mut state, &gas_meter));
    for (key, value) in &entries {
        store.set(key, value).0.unwrap();
    }

    let mut iter = store.scan(None, None, Order::Ascending).0.unwrap();
    let mut ascending = Vec::new();
    while let Some(record) = iter.next().0.unwrap() {
        ascending.push(record);
    }
    let expected: Vec<_> = entries.into_iter().collect();
    prop_assert_eq!(&ascending, &expected);

    let mut iter = store.scan(None, None, Order::Descending).0.unwrap();
    let mut descending = Vec::new();
    while let Some(record) = iter.next().0.unwrap() {
        descending.push(record);
    }
    descending.reverse();
    prop_assert_eq!(descending, expected);
}
