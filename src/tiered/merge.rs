use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

/// Merge hot-tier and cold-tier rows for the same logical key space (§4.4).
///
/// On a duplicate key, the row with the higher `last_modified_ledger`
/// wins; a tie breaks by source, and hot wins the tie because the hot
/// tier is strictly newer than anything the cold lake has ingested.
/// `key_of`/`ledger_of` extract the dedup key and the ledger used to
/// compare both within the cold set and across the hot/cold boundary
/// (the cold tier's own window-ranked projection should already prevent
/// same-key duplicates within itself, but a defensive dedup costs
/// little).
pub fn merge_keep_hot<T, K>(hot: Vec<T>, cold: Vec<T>, key_of: impl Fn(&T) -> K, ledger_of: impl Fn(&T) -> i64) -> Vec<T>
where
    K: Eq + Hash,
{
    let mut by_key: HashMap<K, (T, bool)> = HashMap::new();

    for row in hot {
        let k = key_of(&row);
        by_key.insert(k, (row, true));
    }

    for row in cold {
        let k = key_of(&row);
        match by_key.get(&k) {
            Some((existing, is_hot)) => {
                let existing_wins = match ledger_of(&row).cmp(&ledger_of(existing)) {
                    Ordering::Greater => false,
                    Ordering::Less => true,
                    Ordering::Equal => *is_hot,
                };
                if !existing_wins {
                    by_key.insert(k, (row, false));
                }
            }
            None => {
                by_key.insert(k, (row, false));
            }
        }
    }

    by_key.into_values().map(|(row, _)| row).collect()
}

/// Re-sort a merged row set by a caller-supplied comparator and truncate to
/// `limit`, reporting whether more rows existed beyond the page (§4.2).
pub fn sort_and_page<T>(mut rows: Vec<T>, cmp: impl FnMut(&T, &T) -> Ordering, limit: usize) -> (Vec<T>, bool) {
    rows.sort_by(cmp);
    let has_more = rows.len() > limit;
    rows.truncate(limit);
    (rows, has_more)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: &'static str,
        ledger: i64,
    }

    #[test]
    fn hot_wins_a_ledger_tie_on_duplicate_key() {
        let hot = vec![Row { key: "a", ledger: 10 }];
        let cold = vec![Row { key: "a", ledger: 10 }, Row { key: "b", ledger: 5 }];
        let merged = merge_keep_hot(hot, cold, |r| r.key, |r| r.ledger);
        assert_eq!(merged.len(), 2);
        let a = merged.iter().find(|r| r.key == "a").unwrap();
        assert_eq!(a.ledger, 10, "equal ledgers must break to the hot row");
    }

    #[test]
    fn higher_ledger_wins_on_duplicate_key_even_from_cold() {
        let hot = vec![Row { key: "a", ledger: 10 }];
        let cold = vec![Row { key: "a", ledger: 99 }, Row { key: "b", ledger: 5 }];
        let merged = merge_keep_hot(hot, cold, |r| r.key, |r| r.ledger);
        assert_eq!(merged.len(), 2);
        let a = merged.iter().find(|r| r.key == "a").unwrap();
        assert_eq!(a.ledger, 99, "a strictly newer ledger wins the merge regardless of source");
    }

    #[test]
    fn cold_duplicates_keep_the_higher_ledger() {
        let hot: Vec<Row> = vec![];
        let cold = vec![Row { key: "a", ledger: 5 }, Row { key: "a", ledger: 7 }];
        let merged = merge_keep_hot(hot, cold, |r| r.key, |r| r.ledger);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].ledger, 7);
    }

    #[test]
    fn sort_and_page_reports_has_more() {
        let rows = vec![Row { key: "a", ledger: 3 }, Row { key: "b", ledger: 1 }, Row { key: "c", ledger: 2 }];
        let (page, has_more) = sort_and_page(rows, |a, b| b.ledger.cmp(&a.ledger), 2);
        assert_eq!(page.iter().map(|r| r.key).collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(has_more);
    }
}
