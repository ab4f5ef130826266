use std::sync::Arc;

mod common;

use small_reldb::buffer_pool::BufferPool;
use small_reldb::catalog::Catalog;
use small_reldb::field::{Field, TupleDesc};
use small_reldb::operator::predicate::{Op, Predicate};
use small_reldb::operator::seq_scan::SeqScan;
use small_reldb::operator::tuple_iterator::TupleIterator;
use small_reldb::operator::{filter::Filter, Operator};
use small_reldb::page_id::PageId;
use small_reldb::permissions::Permission;
use small_reldb::transaction::TransactionId;
use small_reldb::tuple::Tuple;

fn one_int_desc() -> Arc<TupleDesc> {
    common::simple_int_tuple_desc(1, "a")
}

/// Property 7 — upgrade: the sole shared holder of a page can upgrade to
/// exclusive without blocking.
#[test]
fn property_upgrade_from_sole_shared_holder_does_not_block() {
    let desc = one_int_desc();
    let catalog = Arc::new(Catalog::new());
    let (table_id, _dir) = common::new_empty_table(&catalog, desc, "t");
    let file = catalog.file(table_id).unwrap();
    file.append_empty_page().unwrap();
    let pool = BufferPool::new(4, catalog);
    let pid = PageId::new(table_id, 0);

    let tid = TransactionId::new();
    pool.get_page(tid, pid, Permission::ReadOnly).unwrap();
    // Sole shared holder upgrading to exclusive must succeed immediately.
    pool.get_page(tid, pid, Permission::ReadWrite).unwrap();
    assert!(pool.holds_lock(tid, pid));
}

/// Property 10 — operator laws: rewind-after-open reproduces the original
/// `next` sequence, and close-then-open is equivalent to rewind for a
/// side-effect-free operator.
#[test]
fn property_rewind_reproduces_original_sequence() {
    let desc = one_int_desc();
    let tuples: Vec<Tuple> = (0..5)
        .map(|i| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(i)]).unwrap())
        .collect();
    let child = Box::new(TupleIterator::new(Arc::clone(&desc), tuples.clone()));
    let mut filter = Filter::new(Predicate::new(0, Op::GreaterThanOrEq, Field::Int(0)), child);

    filter.open().unwrap();
    let mut first_pass = Vec::new();
    while filter.has_next().unwrap() {
        first_pass.push(filter.next().unwrap());
    }

    filter.rewind().unwrap();
    let mut second_pass = Vec::new();
    while filter.has_next().unwrap() {
        second_pass.push(filter.next().unwrap());
    }

    assert_eq!(first_pass, second_pass);
    assert_eq!(first_pass.len(), tuples.len());

    filter.close().unwrap();
    filter.open().unwrap();
    let mut third_pass = Vec::new();
    while filter.has_next().unwrap() {
        third_pass.push(filter.next().unwrap());
    }
    assert_eq!(first_pass, third_pass);
}

/// Property 3 — insert then scan on the same transaction sees every
/// inserted tuple exactly once, through a real SeqScan (not TupleIterator).
#[test]
fn property_insert_then_scan_round_trips() {
    let desc = one_int_desc();
    let catalog = Arc::new(Catalog::new());
    let (table_id, _dir) = common::new_empty_table(&catalog, Arc::clone(&desc), "t");
    let pool = Arc::new(BufferPool::new(8, catalog));

    let tid = TransactionId::new();
    for v in 0..10 {
        let t = Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(v)]).unwrap();
        pool.insert_tuple(tid, table_id, t).unwrap();
    }

    let mut scan = SeqScan::new(Arc::clone(&pool), tid, table_id, "t").unwrap();
    scan.open().unwrap();
    let mut seen = Vec::new();
    while scan.has_next().unwrap() {
        seen.push(scan.next().unwrap());
    }
    assert_eq!(seen.len(), 10);
    pool.transaction_complete(tid, true).unwrap();
}
