//! Order normalization
//!
//! Turns a set of possibly blank, duplicate or sparse order values into a
//! dense ranking `1..=n`.

/// One item with the order the operator entered (blank = `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput<K> {
    pub id: K,
    pub order: Option<i64>,
}

impl<K> OrderInput<K> {
    pub fn new(id: K, order: Option<i64>) -> Self {
        Self { id, order }
    }

    /// Parse an order field as typed; anything that isn't an integer counts as blank.
    pub fn from_text(id: K, text: &str) -> Self {
        Self {
            id,
            order: parse_order(text),
        }
    }
}

/// An item with its assigned rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked<K> {
    pub id: K,
    pub order: i64,
}

impl<K> From<Ranked<K>> for OrderInput<K> {
    fn from(ranked: Ranked<K>) -> Self {
        OrderInput {
            id: ranked.id,
            order: Some(ranked.order),
        }
    }
}

pub fn parse_order(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Dense re-ranking, returned in rank order.
///
/// Items with an order sort ascending (ties keep input position) and take
/// ranks `1..=k`; blank items follow in input order as `k+1..=n`.
pub fn normalize<K: Clone>(items: &[OrderInput<K>]) -> Vec<Ranked<K>> {
    let (mut with_order, blank): (Vec<_>, Vec<_>) =
        items.iter().partition(|item| item.order.is_some());

    // sort_by_key is stable, so equal orders stay in input order
    with_order.sort_by_key(|item| item.order);

    with_order
        .into_iter()
        .chain(blank)
        .zip(1..)
        .map(|(item, rank)| Ranked {
            id: item.id.clone(),
            order: rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(orders: &[Option<i64>]) -> Vec<OrderInput<usize>> {
        orders
            .iter()
            .enumerate()
            .map(|(id, order)| OrderInput::new(id, *order))
            .collect()
    }

    fn renormalize(ranked: &[Ranked<usize>]) -> Vec<Ranked<usize>> {
        let again: Vec<OrderInput<usize>> = ranked.iter().cloned().map(Into::into).collect();
        normalize(&again)
    }

    #[test]
    fn test_sorts_and_densifies() {
        let ranked = normalize(&inputs(&[Some(30), Some(10), Some(20)]));
        let ids: Vec<usize> = ranked.iter().map(|r| r.id).collect();
        let orders: Vec<i64> = ranked.iter().map(|r| r.order).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_keep_input_position() {
        let ranked = normalize(&inputs(&[Some(2), Some(1), Some(2), Some(1)]));
        let ids: Vec<usize> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_blanks_go_last_in_input_order() {
        let ranked = normalize(&inputs(&[None, Some(5), None, Some(-3)]));
        let ids: Vec<usize> = ranked.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 0, 2]);
        assert_eq!(ranked.last().map(|r| r.order), Some(4));
    }

    #[test]
    fn test_permutation_of_one_to_n() {
        let cases: Vec<Vec<Option<i64>>> = vec![
            vec![],
            vec![None],
            vec![Some(7), Some(7), Some(7)],
            vec![Some(i64::MAX), None, Some(i64::MIN), Some(0), None],
            vec![Some(100), Some(-100), None, Some(100), Some(2), None, Some(1)],
        ];
        for case in cases {
            let ranked = normalize(&inputs(&case));
            let mut orders: Vec<i64> = ranked.iter().map(|r| r.order).collect();
            orders.sort_unstable();
            let expected: Vec<i64> = (1..=case.len() as i64).collect();
            assert_eq!(orders, expected, "input {:?}", case);

            let mut ids: Vec<usize> = ranked.iter().map(|r| r.id).collect();
            ids.sort_unstable();
            assert_eq!(ids, (0..case.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_idempotent() {
        let cases: Vec<Vec<Option<i64>>> = vec![
            vec![Some(3), None, Some(3), Some(-1)],
            vec![None, None, None],
            vec![Some(1), Some(2), Some(3)],
            vec![Some(50), Some(40), None, Some(50), Some(10)],
        ];
        for case in cases {
            let once = normalize(&inputs(&case));
            assert_eq!(renormalize(&once), once, "input {:?}", case);
        }
    }

    #[test]
    fn test_parse_order_text() {
        assert_eq!(parse_order(" 12 "), Some(12));
        assert_eq!(parse_order("-4"), Some(-4));
        assert_eq!(parse_order(""), None);
        assert_eq!(parse_order("3.5"), None);
        assert_eq!(OrderInput::from_text('a', "x").order, None);
    }
}
