use std::sync::Arc;

mod common;

use small_reldb::aggregator::AggOp;
use small_reldb::buffer_pool::BufferPool;
use small_reldb::catalog::Catalog;
use small_reldb::error::DbError;
use small_reldb::field::{Field, Type, TupleDesc, TupleDescItem};
use small_reldb::operator::aggregate::Aggregate;
use small_reldb::operator::filter::Filter;
use small_reldb::operator::insert::Insert;
use small_reldb::operator::join::Join;
use small_reldb::operator::predicate::{JoinPredicate, Op, Predicate};
use small_reldb::operator::seq_scan::SeqScan;
use small_reldb::operator::tuple_iterator::TupleIterator;
use small_reldb::operator::Operator;
use small_reldb::permissions::Permission;
use small_reldb::transaction::{Transaction, TransactionId};
use small_reldb::tuple::Tuple;

fn two_int_desc(a: &str, b: &str) -> Arc<TupleDesc> {
    Arc::new(
        TupleDesc::new(vec![
            TupleDescItem::new(Type::Int, Some(a.to_string())),
            TupleDescItem::new(Type::Int, Some(b.to_string())),
        ])
        .unwrap(),
    )
}

fn one_int_desc(name: &str) -> Arc<TupleDesc> {
    Arc::new(TupleDesc::new(vec![TupleDescItem::new(Type::Int, Some(name.to_string()))]).unwrap())
}

fn new_table(catalog: &Catalog, desc: Arc<TupleDesc>, name: &str) -> (i64, tempfile::TempDir) {
    common::new_empty_table(catalog, desc, name)
}

fn drain(op: &mut dyn Operator) -> Vec<Tuple> {
    let mut out = Vec::new();
    while op.has_next().unwrap() {
        out.push(op.next().unwrap());
    }
    out
}

/// S1 — Insert + scan.
#[test]
fn s1_insert_then_scan() {
    let desc = two_int_desc("a", "b");
    let catalog = Arc::new(Catalog::new());
    let (table_id, _dir) = new_table(&catalog, Arc::clone(&desc), "t");
    let pool = Arc::new(BufferPool::new(16, catalog));

    let tx = Transaction::new();
    let tid = tx.id();
    let literals = vec![(1, 10), (2, 20), (3, 30)]
        .into_iter()
        .map(|(a, b)| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(a), Field::Int(b)]).unwrap())
        .collect();
    let source = Box::new(TupleIterator::new(Arc::clone(&desc), literals));
    let mut insert = Insert::new(Arc::clone(&pool), tid, table_id, source);
    insert.open().unwrap();
    let result = drain(&mut insert);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].field(0).unwrap(), &Field::Int(3));

    let mut scan = SeqScan::new(Arc::clone(&pool), tid, table_id, "t").unwrap();
    scan.open().unwrap();
    let rows = drain(&mut scan);
    assert_eq!(rows.len(), 3);
    tx.commit(&pool).unwrap();
}

/// S2 — Filter.
#[test]
fn s2_filter() {
    let desc = two_int_desc("a", "b");
    let catalog = Arc::new(Catalog::new());
    let (table_id, _dir) = new_table(&catalog, Arc::clone(&desc), "t");
    let pool = Arc::new(BufferPool::new(16, catalog));

    let tx = Transaction::new();
    let tid = tx.id();
    for (a, b) in [(1, 10), (2, 20), (3, 30)] {
        let t = Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(a), Field::Int(b)]).unwrap();
        pool.insert_tuple(tid, table_id, t).unwrap();
    }

    let scan = Box::new(SeqScan::new(Arc::clone(&pool), tid, table_id, "t").unwrap());
    let mut filter = Filter::new(Predicate::new(0, Op::GreaterThan, Field::Int(1)), scan);
    filter.open().unwrap();
    let rows = drain(&mut filter);
    assert_eq!(rows.len(), 2);
    tx.commit(&pool).unwrap();
}

/// S3 — Nested-loop join.
#[test]
fn s3_nested_loop_join() {
    let r_desc = one_int_desc("x");
    let s_desc = two_int_desc("y", "z");
    let r_tuples = vec![1, 2, 3]
        .into_iter()
        .map(|x| Tuple::from_fields(Arc::clone(&r_desc), vec![Field::Int(x)]).unwrap())
        .collect();
    let s_tuples = vec![(2, 200), (3, 300), (4, 400)]
        .into_iter()
        .map(|(y, z)| Tuple::from_fields(Arc::clone(&s_desc), vec![Field::Int(y), Field::Int(z)]).unwrap())
        .collect();
    let r = Box::new(TupleIterator::new(r_desc, r_tuples));
    let s = Box::new(TupleIterator::new(s_desc, s_tuples));
    let mut join = Join::new(JoinPredicate::new(0, Op::Equals, 0), r, s);
    join.open().unwrap();
    let rows = drain(&mut join);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].field(0).unwrap(), &Field::Int(2));
    assert_eq!(rows[0].field(1).unwrap(), &Field::Int(2));
    assert_eq!(rows[0].field(2).unwrap(), &Field::Int(200));
}

/// S4 — Grouped aggregate.
#[test]
fn s4_grouped_sum() {
    let desc = two_int_desc("k", "v");
    let tuples = vec![(1, 10), (1, 30), (2, 50), (2, 70), (2, 90)]
        .into_iter()
        .map(|(k, v)| Tuple::from_fields(Arc::clone(&desc), vec![Field::Int(k), Field::Int(v)]).unwrap())
        .collect();
    let child = Box::new(TupleIterator::new(desc, tuples));
    let mut agg = Aggregate::new(child, 1, Some(0), AggOp::Sum).unwrap();
    agg.open().unwrap();
    let rows = drain(&mut agg);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].field(0).unwrap(), &Field::Int(1));
    assert_eq!(rows[0].field(1).unwrap(), &Field::Int(40));
    assert_eq!(rows[1].field(0).unwrap(), &Field::Int(2));
    assert_eq!(rows[1].field(1).unwrap(), &Field::Int(210));
}

/// S5 — Eviction under LRU.
#[test]
fn s5_lru_eviction_order() {
    let desc = one_int_desc("a");
    let catalog = Arc::new(Catalog::new());
    let (table_id, _dir) = new_table(&catalog, desc, "t");
    let pool = BufferPool::new(2, catalog);
    let file = pool.catalog().file(table_id).unwrap();
    for _ in 0..3 {
        file.append_empty_page().unwrap();
    }

    let tx1 = Transaction::new();
    let p0 = small_reldb::page_id::PageId::new(table_id, 0);
    let p1 = small_reldb::page_id::PageId::new(table_id, 1);
    let p2 = small_reldb::page_id::PageId::new(table_id, 2);

    pool.get_page(tx1.id(), p0, Permission::ReadOnly).unwrap();
    pool.get_page(tx1.id(), p1, Permission::ReadOnly).unwrap();
    tx1.commit(&pool).unwrap();

    let tx2 = Transaction::new();
    pool.get_page(tx2.id(), p0, Permission::ReadOnly).unwrap();
    pool.get_page(tx2.id(), p2, Permission::ReadOnly).unwrap();
    tx2.commit(&pool).unwrap();

    assert_eq!(pool.cached_page_count(), 2);
    assert!(!pool.holds_lock(tx2.id(), p1));
}

/// S6 — Lock timeout.
#[test]
fn s6_lock_timeout_aborts_waiter() {
    small_reldb::config::set_deadlock_timeout_secs(1);
    let desc = one_int_desc("a");
    let catalog = Arc::new(Catalog::new());
    let (table_id, _dir) = new_table(&catalog, desc, "t");
    let pool = Arc::new(BufferPool::new(4, catalog));
    let file = pool.catalog().file(table_id).unwrap();
    file.append_empty_page().unwrap();
    let pid = small_reldb::page_id::PageId::new(table_id, 0);

    let tx1 = Transaction::new();
    pool.get_page(tx1.id(), pid, Permission::ReadWrite).unwrap();

    let t2 = TransactionId::new();
    let result = crossbeam::thread::scope(|s| {
        let handle = s.spawn(|_| pool.get_page(t2, pid, Permission::ReadOnly));
        handle.join().unwrap()
    })
    .unwrap();
    assert_eq!(result, Err(DbError::TransactionAborted));

    tx1.commit(&pool).unwrap();
    small_reldb::config::set_deadlock_timeout_secs(
        small_reldb::config::DEFAULT_DEADLOCK_TIMEOUT_SECS,
    );
}
