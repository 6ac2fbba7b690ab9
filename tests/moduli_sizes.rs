use modchain::{Cmodulus, IndexSet, ModuliSizes, ReaderFrom, WriterTo};

// a five-prime chain over m = 4: indices 0-1 play the small role,
// 2-4 the ctxt role
fn fixture() -> (Vec<Cmodulus>, IndexSet, IndexSet) {
    let chain: Vec<Cmodulus> = [5u64, 13, 17, 29, 37]
        .iter()
        .map(|&q| Cmodulus::new(4, q))
        .collect();
    let small: IndexSet = [0, 1].into_iter().collect();
    let ctxt: IndexSet = [2, 3, 4].into_iter().collect();
    (chain, small, ctxt)
}

#[test]
fn power_set_times_prefix_grid() {
    let (chain, small, ctxt) = fixture();
    let table = ModuliSizes::new(&chain, &ctxt, &small);

    assert_eq!(table.len(), 16);

    // {a} is returned when log q_a is the unique subset-sum in range
    let log_a = chain[0].log_q();
    let found = table
        .set_for_size(0.01, log_a + 0.5, &IndexSet::new(), false)
        .unwrap();
    assert_eq!(found, IndexSet::from_iter([0]));
}

#[test]
fn slack_fallback_returns_the_closest_minimal_cost_entry() {
    let (chain, small, ctxt) = fixture();
    let table = ModuliSizes::new(&chain, &ctxt, &small);

    // low above every entry, forward direction: candidates are the
    // entries within log 2 of the maximum size
    let max = table.entries().last().unwrap().size;
    let from: IndexSet = [0, 1, 2, 3, 4].into_iter().collect();
    let found = table.set_for_size(max + 5.0, max + 6.0, &from, false).unwrap();

    // the full set is within one bit of itself and drops nothing
    assert_eq!(found, from);
}

#[test]
fn two_source_ties_prefer_the_later_entry() {
    let (chain, small, ctxt) = fixture();
    let table = ModuliSizes::new(&chain, &ctxt, &small);

    // {0} costs 0+1, {1} costs 1+0; the tie resolves to {1}, the entry
    // later in the scan
    let from1: IndexSet = [0].into_iter().collect();
    let from2: IndexSet = [1].into_iter().collect();
    let low = chain[0].log_q() - 0.01;
    let high = chain[1].log_q() + 0.01;
    let found = table.set_for_size2(low, high, &from1, &from2, false).unwrap();
    assert_eq!(found, IndexSet::from_iter([1]));
}

#[test]
fn serialized_tables_round_trip_back_to_back() {
    let (chain, small, ctxt) = fixture();
    let table = ModuliSizes::new(&chain, &ctxt, &small);
    let smaller = ModuliSizes::new(&chain, &IndexSet::from_iter([2]), &IndexSet::from_iter([0]));

    // binary framing: two tables written back-to-back on one stream
    let mut buf = Vec::new();
    table.write_to(&mut buf).unwrap();
    smaller.write_to(&mut buf).unwrap();
    let mut stream = buf.as_slice();
    assert_eq!(ModuliSizes::read_from(&mut stream).unwrap(), table);
    assert_eq!(ModuliSizes::read_from(&mut stream).unwrap(), smaller);
    assert!(stream.is_empty());

    // ASCII framing likewise consumes exactly one table per read
    let mut text = Vec::new();
    table.write_ascii(&mut text).unwrap();
    smaller.write_ascii(&mut text).unwrap();
    let mut stream = text.as_slice();
    assert_eq!(ModuliSizes::read_ascii(&mut stream).unwrap(), table);
    assert_eq!(ModuliSizes::read_ascii(&mut stream).unwrap(), smaller);
}
